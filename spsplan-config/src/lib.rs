use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 配置文件路径的环境变量。
pub const CONFIG_ENV: &str = "SPSPLAN_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub layers: LayerConfig,
    /// 图层名（或颜色码）到颜色名的附加映射，覆盖内建调色板中的同名项。
    #[serde(default)]
    pub palette: BTreeMap<String, String>,
    #[serde(default)]
    pub symbols: Vec<SymbolConfig>,
    #[serde(default)]
    pub swing: SwingConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 自动发现配置文件：优先读取环境变量 `SPSPLAN_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 图层可见性配置。`visible` 缺省时使用引擎内建的常用图层列表。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerConfig {
    #[serde(default)]
    pub visible: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKindConfig {
    Door,
    Window,
    Stair,
}

/// 追加到符号目录中的块定义。
#[derive(Debug, Clone, Deserialize)]
pub struct SymbolConfig {
    pub name: String,
    pub kind: SymbolKindConfig,
    /// 仅门使用；缺省表示没有铰链几何，按简单开启弧绘制。
    #[serde(default)]
    pub hinge_offset: Option<[f64; 2]>,
    /// 仅门使用：固定半径（块内单位，乘以 X 缩放）。
    #[serde(default)]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwingConfig {
    /// 是否启用内建的坐标例外表。
    #[serde(default = "SwingConfig::default_builtin")]
    pub builtin_overrides: bool,
    /// 追加在内建规则之后的例外规则，按顺序匹配。
    #[serde(default)]
    pub overrides: Vec<SwingOverrideConfig>,
}

impl SwingConfig {
    fn default_builtin() -> bool {
        true
    }
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self {
            builtin_overrides: Self::default_builtin(),
            overrides: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorConfig {
    Near {
        x: f64,
        y: f64,
        #[serde(default = "AnchorConfig::default_tolerance")]
        tolerance: f64,
    },
    AboveY {
        threshold: f64,
    },
}

impl AnchorConfig {
    fn default_tolerance() -> f64 {
        20.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusRuleConfig {
    #[default]
    Catalog,
    ScaleOnly,
}

/// 单条门开启方向例外规则，角度以度为单位书写。
#[derive(Debug, Clone, Deserialize)]
pub struct SwingOverrideConfig {
    pub anchor: AnchorConfig,
    pub hinge_signs: [i8; 2],
    #[serde(default)]
    pub frame_rotation_deg: f64,
    pub start_offset_deg: f64,
    #[serde(default)]
    pub radius: RadiusRuleConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = AppConfig::from_toml_str("").expect("empty config parses");
        assert!(cfg.layers.visible.is_none());
        assert!(cfg.palette.is_empty());
        assert!(cfg.symbols.is_empty());
        assert!(cfg.swing.builtin_overrides);
        assert!(cfg.swing.overrides.is_empty());
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [layers]
            visible = ["CPWALL", "CPDOOR"]

            [palette]
            CPWALL = "navy"

            [[symbols]]
            name = "CPDOOR9"
            kind = "door"
            hinge_offset = [-0.5, 0.0]
            radius = 950.0

            [[symbols]]
            name = "CPWIN7"
            kind = "window"

            [swing]
            builtin_overrides = false

            [[swing.overrides]]
            anchor = {{ kind = "near", x = 100.0, y = 200.0 }}
            hinge_signs = [-1, 1]
            start_offset_deg = -90.0

            [[swing.overrides]]
            anchor = {{ kind = "above_y", threshold = 25000.0 }}
            hinge_signs = [-1, -1]
            frame_rotation_deg = 180.0
            start_offset_deg = 90.0
            radius = "scale_only"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(
            cfg.layers.visible.as_deref(),
            Some(&["CPWALL".to_string(), "CPDOOR".to_string()][..])
        );
        assert_eq!(cfg.palette.get("CPWALL").map(String::as_str), Some("navy"));

        assert_eq!(cfg.symbols.len(), 2);
        assert_eq!(cfg.symbols[0].kind, SymbolKindConfig::Door);
        assert_eq!(cfg.symbols[0].hinge_offset, Some([-0.5, 0.0]));
        assert_eq!(cfg.symbols[0].radius, Some(950.0));
        assert_eq!(cfg.symbols[1].kind, SymbolKindConfig::Window);
        assert!(cfg.symbols[1].hinge_offset.is_none());

        assert!(!cfg.swing.builtin_overrides);
        assert_eq!(cfg.swing.overrides.len(), 2);
        let first = &cfg.swing.overrides[0];
        assert_eq!(
            first.anchor,
            AnchorConfig::Near {
                x: 100.0,
                y: 200.0,
                tolerance: 20.0
            }
        );
        assert_eq!(first.hinge_signs, [-1, 1]);
        assert_eq!(first.frame_rotation_deg, 0.0);
        assert_eq!(first.radius, RadiusRuleConfig::Catalog);
        let second = &cfg.swing.overrides[1];
        assert_eq!(second.anchor, AnchorConfig::AboveY { threshold: 25000.0 });
        assert_eq!(second.radius, RadiusRuleConfig::ScaleOnly);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[[symbols]]\nname = \"X\"\nkind = \"elevator\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
