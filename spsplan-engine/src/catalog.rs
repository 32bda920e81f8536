//! 块名到符号语义的固定目录。目录在启动时构建，之后只读。

use std::collections::HashMap;

use spsplan_config::{SymbolConfig, SymbolKindConfig};
use spsplan_core::geometry::Vector2;

use crate::errors::EngineError;

/// 门的开启弧在缩放为 0/1 或缺少几何时的默认宽度。
pub const DOOR_DEFAULT_WIDTH: f64 = 900.0;
/// 窗在 X 缩放为 0 时的默认宽度。
pub const WINDOW_DEFAULT_WIDTH: f64 = 1200.0;
/// 窗符号的墙厚。
pub const WINDOW_THICKNESS: f64 = 200.0;
/// 楼梯符号在 X 缩放为 0/1 时的默认宽度。
pub const STAIR_DEFAULT_WIDTH: f64 = 1000.0;

/// X 缩放为 0 或 1 时说明块没有携带真实尺寸，改用默认值。
pub fn span_or_default(sx: f64, default: f64) -> f64 {
    if sx == 0.0 || sx == 1.0 { default } else { sx }
}

/// 门块的铰链几何：块内（缩放前）的铰链偏移与可选的固定半径。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorGeometry {
    pub hinge_offset: Vector2,
    pub radius: Option<f64>,
}

impl DoorGeometry {
    pub fn new(hinge_offset: Vector2, radius: Option<f64>) -> Self {
        Self {
            hinge_offset,
            radius,
        }
    }
}

/// 符号变体。`Door(None)` 表示只知道是门、但没有铰链几何。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SymbolKind {
    Door(Option<DoorGeometry>),
    Window,
    Stair,
    Unknown,
}

impl SymbolKind {
    pub fn label(&self) -> &'static str {
        match self {
            SymbolKind::Door(_) => "door",
            SymbolKind::Window => "window",
            SymbolKind::Stair => "stair",
            SymbolKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    entries: HashMap<String, SymbolKind>,
}

impl SymbolCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// 内建目录（参考图纸中出现过的块名）。
    pub fn builtin() -> Self {
        CatalogBuilder::builtin().build()
    }

    /// 精确匹配块名，未登记的名字一律返回 `Unknown`。
    pub fn lookup(&self, name: &str) -> SymbolKind {
        self.entries.get(name).copied().unwrap_or(SymbolKind::Unknown)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    entries: HashMap<String, SymbolKind>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        let mut put = |name: &str, kind: SymbolKind| {
            entries.insert(name.to_string(), kind);
        };

        put(
            "A$C139426D3",
            SymbolKind::Door(Some(DoorGeometry::new(
                Vector2::new(55.6668, 946.667),
                Some(958.667),
            ))),
        );
        let half_leaf = DoorGeometry::new(Vector2::new(-0.5, 0.0), None);
        put("CPDOOR1", SymbolKind::Door(Some(half_leaf)));
        put("CPDOOR5", SymbolKind::Door(Some(half_leaf)));
        put("DOOR", SymbolKind::Door(None));

        for name in ["CPWIN1", "CPWINDOW1", "CPWINDOW8"] {
            put(name, SymbolKind::Window);
        }
        for name in ["STAIR", "CPSTAIR1"] {
            put(name, SymbolKind::Stair);
        }

        Self { entries }
    }

    pub fn door(
        &mut self,
        name: impl Into<String>,
        geometry: Option<DoorGeometry>,
    ) -> Result<&mut Self, EngineError> {
        self.insert(name.into(), SymbolKind::Door(geometry))
    }

    pub fn window(&mut self, name: impl Into<String>) -> Result<&mut Self, EngineError> {
        self.insert(name.into(), SymbolKind::Window)
    }

    pub fn stair(&mut self, name: impl Into<String>) -> Result<&mut Self, EngineError> {
        self.insert(name.into(), SymbolKind::Stair)
    }

    /// 按配置追加符号。
    pub fn apply_config(&mut self, symbol: &SymbolConfig) -> Result<&mut Self, EngineError> {
        match symbol.kind {
            SymbolKindConfig::Door => {
                let geometry = symbol
                    .hinge_offset
                    .map(|[x, y]| DoorGeometry::new(Vector2::new(x, y), symbol.radius));
                self.door(symbol.name.clone(), geometry)
            }
            SymbolKindConfig::Window => self.window(symbol.name.clone()),
            SymbolKindConfig::Stair => self.stair(symbol.name.clone()),
        }
    }

    pub fn build(self) -> SymbolCatalog {
        SymbolCatalog {
            entries: self.entries,
        }
    }

    fn insert(&mut self, name: String, kind: SymbolKind) -> Result<&mut Self, EngineError> {
        if let Some(existing) = self.entries.get(&name) {
            if *existing != kind {
                return Err(EngineError::ConflictingSymbol {
                    name,
                    existing: existing.label(),
                });
            }
            return Ok(self);
        }
        self.entries.insert(name, kind);
        Ok(self)
    }
}
