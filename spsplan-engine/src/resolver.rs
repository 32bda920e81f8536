use std::f64::consts::{FRAC_PI_2, PI};

use spsplan_core::document::BlockReference;
use spsplan_core::geometry::{Point2, Vector2};
use tracing::debug;

use crate::catalog::{
    DOOR_DEFAULT_WIDTH, DoorGeometry, STAIR_DEFAULT_WIDTH, SymbolCatalog, SymbolKind,
    WINDOW_DEFAULT_WIDTH, WINDOW_THICKNESS, span_or_default,
};
use crate::command::{CommandStyle, DrawingCommand, MarkerKind};
use crate::palette::{Palette, WINDOW_COLOR};
use crate::swing::{DoorPlacement, SWING_SPAN, SwingExceptionTable, SwingSolution, choose_swing};

/// 把块参照展开为具体图元。只读借用目录、例外表与调色板，可在多个线程间共享。
#[derive(Debug, Clone, Copy)]
pub struct BlockResolver<'a> {
    catalog: &'a SymbolCatalog,
    exceptions: &'a SwingExceptionTable,
    palette: &'a Palette,
}

impl<'a> BlockResolver<'a> {
    pub fn new(
        catalog: &'a SymbolCatalog,
        exceptions: &'a SwingExceptionTable,
        palette: &'a Palette,
    ) -> Self {
        Self {
            catalog,
            exceptions,
            palette,
        }
    }

    /// 解析单个块参照。任何输入都会产出命令，不会失败。
    pub fn resolve(&self, block: &BlockReference) -> Vec<DrawingCommand> {
        let scale = block.effective_scale();
        let style = CommandStyle::new(
            block.layer.as_str(),
            self.palette.resolve(&block.color, &block.layer),
        );
        match self.catalog.lookup(&block.name) {
            SymbolKind::Door(Some(geometry)) => {
                self.resolve_hinged_door(block, scale, geometry, &style)
            }
            SymbolKind::Door(None) => resolve_plain_door(block, scale, &style),
            SymbolKind::Window => resolve_window(block, scale),
            SymbolKind::Stair => resolve_stair(block, scale, &style),
            SymbolKind::Unknown => {
                debug!(name = %block.name, layer = %block.layer, "未登记的块名，使用占位符");
                resolve_unknown(block, scale, &style)
            }
        }
    }

    fn resolve_hinged_door(
        &self,
        block: &BlockReference,
        scale: Vector2,
        geometry: DoorGeometry,
        style: &CommandStyle,
    ) -> Vec<DrawingCommand> {
        let placement = DoorPlacement {
            position: block.position,
            angle: block.angle,
            scale,
            hinge_offset: geometry.hinge_offset,
            radius: door_radius(&geometry, scale.x()),
        };

        let solution = match self.exceptions.find(block.position) {
            Some(rule) => {
                debug!(
                    name = %block.name,
                    x = block.position.x(),
                    y = block.position.y(),
                    anchor = ?rule.anchor,
                    "门开启方向命中坐标例外"
                );
                rule.solve(&placement)
            }
            None => {
                let best = choose_swing(&placement);
                debug!(
                    name = %block.name,
                    hinge_sign = ?best.hinge_sign,
                    start_offset = best.start_offset,
                    score = best.score,
                    "门开启方向按最远门扇规则选定"
                );
                best.solution
            }
        };
        swing_commands(&solution, style)
    }
}

fn door_radius(geometry: &DoorGeometry, sx: f64) -> f64 {
    match geometry.radius {
        Some(fixed) => {
            let radius = fixed * sx;
            if radius == 0.0 { DOOR_DEFAULT_WIDTH } else { radius }
        }
        None => span_or_default(sx, DOOR_DEFAULT_WIDTH),
    }
}

/// 开启弧 + 门扇（铰链到弧起点）。
fn swing_commands(solution: &SwingSolution, style: &CommandStyle) -> Vec<DrawingCommand> {
    vec![
        style.arc(
            solution.hinge,
            solution.radius,
            solution.start_angle,
            solution.end_angle(),
        ),
        style.line(solution.hinge, solution.panel_end()),
    ]
}

/// 没有铰链几何的门：以插入点为圆心，从块旋转角开始画 90° 弧。
fn resolve_plain_door(
    block: &BlockReference,
    scale: Vector2,
    style: &CommandStyle,
) -> Vec<DrawingCommand> {
    let width = if scale.x() == 0.0 {
        DOOR_DEFAULT_WIDTH
    } else {
        scale.x()
    };
    swing_commands(
        &SwingSolution {
            hinge: block.position,
            radius: width,
            start_angle: block.angle,
        },
        style,
    )
}

fn resolve_window(block: &BlockReference, scale: Vector2) -> Vec<DrawingCommand> {
    let width = if scale.x() == 0.0 {
        WINDOW_DEFAULT_WIDTH
    } else {
        scale.x().abs()
    };
    let half_width = width / 2.0;
    let half_thickness = WINDOW_THICKNESS / 2.0;
    let corners = [
        (-half_width, -half_thickness),
        (half_width, -half_thickness),
        (half_width, half_thickness),
        (-half_width, half_thickness),
    ]
    .map(|(x, y)| local_to_world(block, x, y));

    let style = CommandStyle::new(block.layer.as_str(), WINDOW_COLOR);
    let mut commands = Vec::with_capacity(5);
    // 填充在前，轮廓线覆盖其上。
    commands.push(style.symbol(
        block.position,
        MarkerKind::WindowFill {
            width,
            thickness: WINDOW_THICKNESS,
        },
        block.angle,
        scale,
    ));
    for (index, corner) in corners.iter().enumerate() {
        commands.push(style.line(*corner, corners[(index + 1) % corners.len()]));
    }
    commands
}

/// 固定的楼梯图形：两条踏步线 + 两段 90° 弧，只由 X 缩放的绝对值决定尺寸，
/// 负缩放不产生镜像。
fn resolve_stair(
    block: &BlockReference,
    scale: Vector2,
    style: &CommandStyle,
) -> Vec<DrawingCommand> {
    let width = span_or_default(scale.x(), STAIR_DEFAULT_WIDTH).abs();
    let depth = width / 2.0;
    let angle = block.angle;
    vec![
        style.line(
            local_to_world(block, 0.0, 0.0),
            local_to_world(block, width, 0.0),
        ),
        style.line(
            local_to_world(block, 0.0, depth),
            local_to_world(block, width, depth),
        ),
        style.arc(
            local_to_world(block, 0.0, 0.0),
            depth,
            angle + FRAC_PI_2,
            angle + PI,
        ),
        style.arc(
            local_to_world(block, width, 0.0),
            depth,
            angle,
            angle + SWING_SPAN,
        ),
    ]
}

fn resolve_unknown(
    block: &BlockReference,
    scale: Vector2,
    style: &CommandStyle,
) -> Vec<DrawingCommand> {
    vec![style.symbol(
        block.position,
        MarkerKind::Placeholder {
            label: block.name.clone(),
        },
        block.angle,
        scale,
    )]
}

/// 块内局部坐标（未缩放）旋转后平移到插入点。
fn local_to_world(block: &BlockReference, x: f64, y: f64) -> Point2 {
    block
        .position
        .translate(Vector2::new(x, y).rotated(block.angle))
}
