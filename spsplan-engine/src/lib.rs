pub mod builder;
pub mod catalog;
pub mod command;
pub mod palette;
pub mod resolver;
pub mod swing;

pub mod errors {
    use thiserror::Error;

    /// 构建目录与例外表时的错误。解析与转换本身不会失败。
    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("block {name} is already registered as a {existing} symbol")]
        ConflictingSymbol { name: String, existing: &'static str },
        #[error("swing override #{index} is invalid: {reason}")]
        InvalidOverride { index: usize, reason: String },
    }
}

pub mod converter {
    use spsplan_config::AppConfig;
    use spsplan_core::document::{BlockReference, PlanDocument};
    use tracing::info;

    use crate::builder::{CommandSequenceBuilder, ConversionObserver, LayerFilter, NoopObserver};
    use crate::catalog::{CatalogBuilder, SymbolCatalog};
    use crate::command::{CommandSequence, DrawingCommand};
    use crate::errors::EngineError;
    use crate::palette::Palette;
    use crate::resolver::BlockResolver;
    use crate::swing::SwingExceptionTable;

    /// 转换入口：持有只读的目录、例外表、调色板与图层过滤器。
    ///
    /// 每次转换都生成独立的命令序列，不在调用之间保留任何可变状态，
    /// 因此同一个 `Converter` 可以被多个线程同时使用。
    #[derive(Debug, Clone)]
    pub struct Converter {
        catalog: SymbolCatalog,
        exceptions: SwingExceptionTable,
        palette: Palette,
        filter: LayerFilter,
    }

    impl Converter {
        /// 使用全部内建配置。
        pub fn new() -> Self {
            Self {
                catalog: SymbolCatalog::builtin(),
                exceptions: SwingExceptionTable::builtin(),
                palette: Palette::builtin(),
                filter: LayerFilter::builtin(),
            }
        }

        /// 在内建配置之上叠加应用配置。
        pub fn from_config(config: &AppConfig) -> Result<Self, EngineError> {
            let mut catalog = CatalogBuilder::builtin();
            for symbol in &config.symbols {
                catalog.apply_config(symbol)?;
            }

            let mut exceptions = if config.swing.builtin_overrides {
                SwingExceptionTable::builtin()
            } else {
                SwingExceptionTable::empty()
            };
            for rule in &config.swing.overrides {
                exceptions.push_config(rule)?;
            }

            let mut palette = Palette::builtin();
            palette.extend(config.palette.clone());

            let filter = match &config.layers.visible {
                Some(layers) => LayerFilter::allow(layers.iter().cloned()),
                None => LayerFilter::builtin(),
            };

            let converter = Self {
                catalog: catalog.build(),
                exceptions,
                palette,
                filter,
            };
            info!(
                symbols = converter.catalog.len(),
                overrides = converter.exceptions.len(),
                "转换器配置已加载"
            );
            Ok(converter)
        }

        pub fn with_layer_filter(mut self, filter: LayerFilter) -> Self {
            self.filter = filter;
            self
        }

        pub fn with_catalog(mut self, catalog: SymbolCatalog) -> Self {
            self.catalog = catalog;
            self
        }

        pub fn with_exceptions(mut self, exceptions: SwingExceptionTable) -> Self {
            self.exceptions = exceptions;
            self
        }

        #[inline]
        pub fn catalog(&self) -> &SymbolCatalog {
            &self.catalog
        }

        #[inline]
        pub fn exceptions(&self) -> &SwingExceptionTable {
            &self.exceptions
        }

        #[inline]
        pub fn palette(&self) -> &Palette {
            &self.palette
        }

        #[inline]
        pub fn layer_filter(&self) -> &LayerFilter {
            &self.filter
        }

        pub fn resolver(&self) -> BlockResolver<'_> {
            BlockResolver::new(&self.catalog, &self.exceptions, &self.palette)
        }

        /// 解析单个块参照（不经过图层过滤）。
        pub fn resolve(&self, block: &BlockReference) -> Vec<DrawingCommand> {
            self.resolver().resolve(block)
        }

        pub fn convert(&self, document: &PlanDocument) -> CommandSequence {
            self.convert_observed(document, &mut NoopObserver)
        }

        pub fn convert_observed(
            &self,
            document: &PlanDocument,
            observer: &mut dyn ConversionObserver,
        ) -> CommandSequence {
            CommandSequenceBuilder::new(self.resolver(), &self.palette, &self.filter)
                .build(document, observer)
        }
    }

    impl Default for Converter {
        fn default() -> Self {
            Self::new()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::catalog::SymbolKind;
        use spsplan_config::{
            AnchorConfig, RadiusRuleConfig, SwingOverrideConfig, SymbolConfig, SymbolKindConfig,
        };

        #[test]
        fn converter_is_shareable_across_threads() {
            fn assert_sync<T: Send + Sync>() {}
            assert_sync::<Converter>();
        }

        #[test]
        fn config_extends_builtin_tables() {
            let mut config = AppConfig::default();
            config.layers.visible = Some(vec!["CPDOOR".to_string()]);
            config.palette.insert("CPDOOR".to_string(), "red".to_string());
            config.symbols.push(SymbolConfig {
                name: "CPSTAIR9".to_string(),
                kind: SymbolKindConfig::Stair,
                hinge_offset: None,
                radius: None,
            });
            config.swing.builtin_overrides = false;
            config.swing.overrides.push(SwingOverrideConfig {
                anchor: AnchorConfig::AboveY { threshold: 1.0 },
                hinge_signs: [1, 1],
                frame_rotation_deg: 0.0,
                start_offset_deg: 90.0,
                radius: RadiusRuleConfig::Catalog,
            });

            let converter = Converter::from_config(&config).expect("valid config");
            assert_eq!(converter.catalog().lookup("CPSTAIR9"), SymbolKind::Stair);
            assert!(converter.catalog().contains("CPDOOR1"));
            assert_eq!(converter.exceptions().len(), 1);
            assert_eq!(converter.palette().resolve("", "CPDOOR"), "red");
            assert!(converter.layer_filter().is_allowed("CPDOOR"));
            assert!(!converter.layer_filter().is_allowed("CPWALL"));
        }

        #[test]
        fn conflicting_config_symbol_is_an_error() {
            let mut config = AppConfig::default();
            config.symbols.push(SymbolConfig {
                name: "CPWIN1".to_string(),
                kind: SymbolKindConfig::Door,
                hinge_offset: Some([-0.5, 0.0]),
                radius: None,
            });
            let err = Converter::from_config(&config).unwrap_err();
            assert!(matches!(err, EngineError::ConflictingSymbol { existing: "window", .. }));
        }
    }
}

pub use builder::{ConversionObserver, LayerFilter, LayerTally, NoopObserver};
pub use catalog::{SymbolCatalog, SymbolKind};
pub use command::{CommandSequence, DrawingCommand, MarkerKind, Primitive};
pub use converter::Converter;
pub use errors::EngineError;
