use serde::{Deserialize, Serialize};
use spsplan_core::geometry::{Bounds2D, Point2, Vector2};

/// 符号标记的具体含义，渲染端据此决定画填充矩形还是带标签的占位框。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerKind {
    /// 窗的填充矩形（以插入点为中心，按 `angle` 旋转）。
    WindowFill { width: f64, thickness: f64 },
    /// 未登记块的占位框，`label` 为块名。
    Placeholder { label: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Line {
        start: Point2,
        end: Point2,
    },
    /// 圆弧，角度为弧度，从 `start_angle` 逆时针到 `end_angle`。
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Circle {
        center: Point2,
        radius: f64,
    },
    Polyline {
        points: Vec<Point2>,
    },
    Text {
        position: Point2,
        content: String,
        font: String,
        height: f64,
        angle: f64,
    },
    Symbol {
        position: Point2,
        marker: MarkerKind,
        angle: f64,
        scale: Vector2,
    },
}

/// 单条绘图命令。生成后不再修改，序列中的先后即绘制先后。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingCommand {
    pub primitive: Primitive,
    pub layer: String,
    pub color: String,
    pub visible: bool,
}

impl DrawingCommand {
    /// 命令的几何范围；文字与符号退化为插入点。
    pub fn bounds(&self) -> Bounds2D {
        let mut bounds = Bounds2D::empty();
        match &self.primitive {
            Primitive::Line { start, end } => {
                bounds.include_point(*start);
                bounds.include_point(*end);
            }
            Primitive::Arc { center, radius, .. } | Primitive::Circle { center, radius } => {
                bounds.include_disc(*center, *radius);
            }
            Primitive::Polyline { points } => {
                for point in points {
                    bounds.include_point(*point);
                }
            }
            Primitive::Text { position, .. } | Primitive::Symbol { position, .. } => {
                bounds.include_point(*position);
            }
        }
        bounds
    }
}

/// 命令共用的图层与颜色。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStyle {
    pub layer: String,
    pub color: String,
}

impl CommandStyle {
    pub fn new(layer: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            color: color.into(),
        }
    }

    pub fn command(&self, primitive: Primitive) -> DrawingCommand {
        DrawingCommand {
            primitive,
            layer: self.layer.clone(),
            color: self.color.clone(),
            visible: true,
        }
    }

    #[inline]
    pub fn line(&self, start: Point2, end: Point2) -> DrawingCommand {
        self.command(Primitive::Line { start, end })
    }

    #[inline]
    pub fn arc(
        &self,
        center: Point2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> DrawingCommand {
        self.command(Primitive::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        })
    }

    #[inline]
    pub fn symbol(
        &self,
        position: Point2,
        marker: MarkerKind,
        angle: f64,
        scale: Vector2,
    ) -> DrawingCommand {
        self.command(Primitive::Symbol {
            position,
            marker,
            angle,
            scale,
        })
    }
}

/// 有序命令序列，交给外部渲染器直接光栅化。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSequence {
    commands: Vec<DrawingCommand>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, command: DrawingCommand) {
        self.commands.push(command);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, DrawingCommand> {
        self.commands.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[DrawingCommand] {
        &self.commands
    }

    pub fn into_vec(self) -> Vec<DrawingCommand> {
        self.commands
    }

    /// 所有命令的合并范围，序列为空时返回 `None`。
    pub fn bounds(&self) -> Option<Bounds2D> {
        let mut bounds = Bounds2D::empty();
        for command in &self.commands {
            bounds.include_bounds(&command.bounds());
        }
        if bounds.is_empty() { None } else { Some(bounds) }
    }
}

impl Extend<DrawingCommand> for CommandSequence {
    fn extend<T: IntoIterator<Item = DrawingCommand>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}

impl From<Vec<DrawingCommand>> for CommandSequence {
    fn from(commands: Vec<DrawingCommand>) -> Self {
        Self { commands }
    }
}

impl IntoIterator for CommandSequence {
    type Item = DrawingCommand;
    type IntoIter = std::vec::IntoIter<DrawingCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandSequence {
    type Item = &'a DrawingCommand;
    type IntoIter = std::slice::Iter<'a, DrawingCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_stamps_layer_and_color() {
        let style = CommandStyle::new("CPDOOR", "orange");
        let command = style.line(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert_eq!(command.layer, "CPDOOR");
        assert_eq!(command.color, "orange");
        assert!(command.visible);
    }

    #[test]
    fn sequence_bounds_cover_all_primitives() {
        let style = CommandStyle::new("0", "blue");
        let mut sequence = CommandSequence::new();
        assert!(sequence.bounds().is_none());

        sequence.push(style.line(Point2::new(0.0, 0.0), Point2::new(100.0, 0.0)));
        sequence.push(style.arc(Point2::new(100.0, 0.0), 50.0, 0.0, 1.0));
        sequence.push(style.symbol(
            Point2::new(-20.0, 10.0),
            MarkerKind::Placeholder {
                label: "X".to_string(),
            },
            0.0,
            Vector2::new(1.0, 1.0),
        ));

        let bounds = sequence.bounds().expect("bounds");
        assert_eq!(bounds.min(), Point2::new(-20.0, -50.0));
        assert_eq!(bounds.max(), Point2::new(150.0, 50.0));
    }

    #[test]
    fn sequence_serializes_as_plain_array() {
        let style = CommandStyle::new("CPWIN", "green");
        let sequence = CommandSequence::from(vec![style.symbol(
            Point2::new(1.0, 2.0),
            MarkerKind::WindowFill {
                width: 1200.0,
                thickness: 200.0,
            },
            0.0,
            Vector2::new(0.0, 1.0),
        )]);
        let json = serde_json::to_value(&sequence).expect("serialize");
        let first = &json[0];
        assert_eq!(first["primitive"]["kind"], "symbol");
        assert_eq!(first["primitive"]["marker"]["type"], "window_fill");
        assert_eq!(first["primitive"]["marker"]["width"], 1200.0);
        assert_eq!(first["color"], "green");
    }
}
