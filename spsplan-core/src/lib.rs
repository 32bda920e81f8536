pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，坐标单位与平面图原始单位一致（毫米）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn distance_squared(self, other: Point2) -> f64 {
            self.0.distance_squared(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    /// 二维向量，块参照的缩放、铰链偏移都以它表示。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        /// 按极坐标构造向量（角度为弧度，数学正方向）。
        #[inline]
        pub fn from_polar(angle: f64, length: f64) -> Self {
            Self(DVec2::from_angle(angle) * length)
        }

        /// 绕原点逆时针旋转 `angle` 弧度。
        #[inline]
        pub fn rotated(self, angle: f64) -> Self {
            Self(DVec2::from_angle(angle).rotate(self.0))
        }

        /// 分量乘法（⊙），用于把块内局部坐标按 X/Y 缩放。
        #[inline]
        pub fn scaled(self, scale: Vector2) -> Self {
            Self(self.0 * scale.0)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    /// 轴对齐边界框，用于估算绘图命令的范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        /// 以 `center` 为中心、`radius` 为半径的正方形范围并入边界框。
        pub fn include_disc(&mut self, center: Point2, radius: f64) {
            let radius = radius.abs();
            self.include_point(Point2::new(center.x() - radius, center.y() - radius));
            self.include_point(Point2::new(center.x() + radius, center.y() + radius));
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }
    }

}

pub mod document {
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point2, Vector2};

    /// 图层未声明颜色时采用的颜色码（白/黑）。
    pub const DEFAULT_LAYER_COLOR: &str = "7";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub color: String,
        pub off: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                color: DEFAULT_LAYER_COLOR.to_string(),
                off: false,
            }
        }

        #[inline]
        pub fn with_color(mut self, color: impl Into<String>) -> Self {
            self.color = color.into();
            self
        }

        #[inline]
        pub fn switched_off(mut self) -> Self {
            self.off = true;
            self
        }
    }

    /// 解析层产出的绘图元素，变体集合固定。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum DrawingElement {
        Line(Line),
        Text(Text),
        Circle(Circle),
        Arc(Arc),
        Polyline(Polyline),
        BlockReference(BlockReference),
    }

    impl DrawingElement {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                DrawingElement::Line(line) => &line.layer,
                DrawingElement::Text(text) => &text.layer,
                DrawingElement::Circle(circle) => &circle.layer,
                DrawingElement::Arc(arc) => &arc.layer,
                DrawingElement::Polyline(polyline) => &polyline.layer,
                DrawingElement::BlockReference(reference) => &reference.layer,
            }
        }

        #[inline]
        pub fn color_code(&self) -> &str {
            match self {
                DrawingElement::Line(line) => &line.color,
                DrawingElement::Text(text) => &text.color,
                DrawingElement::Circle(circle) => &circle.color,
                DrawingElement::Arc(arc) => &arc.color,
                DrawingElement::Polyline(polyline) => &polyline.color,
                DrawingElement::BlockReference(reference) => &reference.color,
            }
        }

        /// 元素类型名，便于日志输出。
        pub fn kind_name(&self) -> &'static str {
            match self {
                DrawingElement::Line(_) => "Line",
                DrawingElement::Text(_) => "Text",
                DrawingElement::Circle(_) => "Circle",
                DrawingElement::Arc(_) => "Arc",
                DrawingElement::Polyline(_) => "Polyline",
                DrawingElement::BlockReference(_) => "BlockReference",
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
        pub color: String,
    }

    /// 单行文字。`angle` 保留源文件中的原始数值，不做单位换算。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub position: Point2,
        pub content: String,
        pub font: String,
        pub height: f64,
        pub angle: f64,
        pub layer: String,
        pub color: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Circle {
        pub center: Point2,
        pub radius: f64,
        pub layer: String,
        pub color: String,
    }

    /// 圆弧实体，角度以弧度形式储存，遵循数学正方向。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Arc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub end_angle: f64,
        pub layer: String,
        pub color: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Polyline {
        pub points: Vec<Point2>,
        pub layer: String,
        pub color: String,
    }

    /// 块参照：命名符号（门、窗、楼梯……）在图中的一次放置。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BlockReference {
        pub name: String,
        pub position: Point2,
        /// 旋转角（弧度）。
        pub angle: f64,
        pub scale: Vector2,
        pub layer: String,
        pub color: String,
    }

    impl BlockReference {
        /// 源文件用 `(0,0)` 表示“未给出缩放”，此时按 `(1,1)` 处理。
        pub fn effective_scale(&self) -> Vector2 {
            if self.scale.x() == 0.0 && self.scale.y() == 0.0 {
                Vector2::new(1.0, 1.0)
            } else {
                self.scale
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Page {
        pub title: String,
        pub scale: String,
        pub note: String,
        pub layers: Vec<Layer>,
        pub elements: Vec<DrawingElement>,
    }

    impl Page {
        pub fn new(title: impl Into<String>) -> Self {
            Self {
                title: title.into(),
                scale: "100".to_string(),
                note: String::new(),
                layers: Vec::new(),
                elements: Vec::new(),
            }
        }

        /// 添加图层；同名图层已存在时替换其定义。
        pub fn add_layer(&mut self, layer: Layer) {
            if let Some(existing) = self.layers.iter_mut().find(|l| l.name == layer.name) {
                *existing = layer;
            } else {
                self.layers.push(layer);
            }
        }

        pub fn layer(&self, name: &str) -> Option<&Layer> {
            self.layers.iter().find(|layer| layer.name == name)
        }

        /// 图层表中标记为关闭的图层返回 `true`；未登记的图层视为打开。
        pub fn is_layer_off(&self, name: &str) -> bool {
            self.layer(name).is_some_and(|layer| layer.off)
        }

        /// 追加元素，保持原有绘制顺序。
        pub fn push(&mut self, element: DrawingElement) {
            self.elements.push(element);
        }

        pub fn add_line(
            &mut self,
            start: Point2,
            end: Point2,
            layer: impl Into<String>,
            color: impl Into<String>,
        ) {
            self.push(DrawingElement::Line(Line {
                start,
                end,
                layer: layer.into(),
                color: color.into(),
            }));
        }

        pub fn add_text(
            &mut self,
            position: Point2,
            content: impl Into<String>,
            height: f64,
            angle: f64,
            layer: impl Into<String>,
        ) {
            self.push(DrawingElement::Text(Text {
                position,
                content: content.into(),
                font: String::new(),
                height,
                angle,
                layer: layer.into(),
                color: String::new(),
            }));
        }

        pub fn add_circle(&mut self, center: Point2, radius: f64, layer: impl Into<String>) {
            self.push(DrawingElement::Circle(Circle {
                center,
                radius,
                layer: layer.into(),
                color: String::new(),
            }));
        }

        pub fn add_arc(
            &mut self,
            center: Point2,
            radius: f64,
            start_angle: f64,
            end_angle: f64,
            layer: impl Into<String>,
        ) {
            self.push(DrawingElement::Arc(Arc {
                center,
                radius,
                start_angle,
                end_angle,
                layer: layer.into(),
                color: String::new(),
            }));
        }

        pub fn add_polyline<I>(&mut self, points: I, layer: impl Into<String>)
        where
            I: IntoIterator<Item = Point2>,
        {
            self.push(DrawingElement::Polyline(Polyline {
                points: points.into_iter().collect(),
                layer: layer.into(),
                color: String::new(),
            }));
        }

        pub fn add_block_reference(
            &mut self,
            name: impl Into<String>,
            position: Point2,
            angle: f64,
            scale: Vector2,
            layer: impl Into<String>,
        ) {
            self.push(DrawingElement::BlockReference(BlockReference {
                name: name.into(),
                position,
                angle,
                scale,
                layer: layer.into(),
                color: String::new(),
            }));
        }
    }

    /// 解析后的完整平面图文档。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PlanDocument {
        pub version: String,
        pub pages: Vec<Page>,
    }

    impl PlanDocument {
        pub fn new() -> Self {
            Self {
                version: "2.0".to_string(),
                pages: Vec::new(),
            }
        }

        pub fn with_page(page: Page) -> Self {
            let mut document = Self::new();
            document.pages.push(page);
            document
        }

        pub fn pages(&self) -> impl Iterator<Item = &Page> {
            self.pages.iter()
        }

        pub fn element_count(&self) -> usize {
            self.pages.iter().map(|page| page.elements.len()).sum()
        }
    }

    impl Default for PlanDocument {
        fn default() -> Self {
            Self::new()
        }
    }

}
