use std::collections::HashMap;

/// 无法归类的图层/颜色码使用的颜色。
pub const DEFAULT_COLOR: &str = "black";
/// 窗符号固定使用的颜色，与图层无关。
pub const WINDOW_COLOR: &str = "green";

const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    ("CPWALL", "blue"),
    ("CPDOOR", "orange"),
    ("CPWIN", "cyan"),
    ("CPWINDOW", "cyan"),
    ("WALL", "blue"),
    ("DOOR", "orange"),
    ("WINDOW", "cyan"),
    ("CPTEXT", "black"),
    ("FIN", "gray"),
    ("STAIR", "darkgreen"),
    ("0", "blue"),
    ("1", "blue"),
    ("2", "blue"),
    ("3", "blue"),
    ("4", "blue"),
    ("5", "blue"),
    ("6", "blue"),
    ("7", "blue"),
    ("8", "blue"),
    ("9", "blue"),
    ("10", "blue"),
    ("11", "blue"),
    ("12", "blue"),
];

/// 图层名 / 颜色码到颜色名的映射。
#[derive(Debug, Clone)]
pub struct Palette {
    entries: HashMap<String, String>,
}

impl Palette {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut palette = Self::empty();
        palette.extend(
            BUILTIN_ENTRIES
                .iter()
                .map(|(key, color)| (key.to_string(), color.to_string())),
        );
        palette
    }

    /// 添加或替换一项映射。
    pub fn insert(&mut self, key: impl Into<String>, color: impl Into<String>) {
        self.entries.insert(key.into(), color.into());
    }

    /// 先按图层名查找，再按元素自身颜色码查找，都未命中时返回默认颜色。
    pub fn resolve<'a>(&'a self, color_code: &str, layer: &str) -> &'a str {
        self.entries
            .get(layer)
            .or_else(|| self.entries.get(color_code))
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Extend<(String, String)> for Palette {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
