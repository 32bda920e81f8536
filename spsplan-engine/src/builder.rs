use std::collections::{BTreeMap, HashSet};

use spsplan_core::document::{DrawingElement, Page, PlanDocument};
use tracing::debug;

use crate::command::{CommandSequence, CommandStyle, DrawingCommand, Primitive};
use crate::palette::Palette;
use crate::resolver::BlockResolver;

/// 未指定可见图层时使用的常用墙/门/窗/文字图层。
pub const DEFAULT_VISIBLE_LAYERS: &[&str] = &[
    "CPWALL", "CPDOOR", "CPWIN", "CPWINDOW", "WALL", "DOOR", "WINDOW", "CPTEXT", "FIN", "STAIR",
    "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12",
];

/// 图层白名单。元素所在图层必须在名单内，且页面图层表中未关闭。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFilter {
    allowed: HashSet<String>,
}

impl LayerFilter {
    pub fn allow<I, S>(layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: layers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::allow(DEFAULT_VISIBLE_LAYERS.iter().copied())
    }

    #[inline]
    pub fn is_allowed(&self, layer: &str) -> bool {
        self.allowed.contains(layer)
    }

    pub fn is_visible(&self, page: &Page, layer: &str) -> bool {
        self.is_allowed(layer) && !page.is_layer_off(layer)
    }
}

impl Default for LayerFilter {
    fn default() -> Self {
        Self::builtin()
    }
}

/// 转换过程的诊断回调，取代直接打印到控制台。
pub trait ConversionObserver {
    /// 每个通过图层过滤的元素转换完成后调用。
    fn element_converted(&mut self, layer: &str, color: &str, emitted: usize) {
        let _ = (layer, color, emitted);
    }

    /// 整个文档转换结束后调用。
    fn finished(&mut self, total_commands: usize) {
        let _ = total_commands;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerStats {
    pub color: String,
    pub elements: usize,
    pub commands: usize,
}

/// 按图层累计元素数与命令数，图层名有序，便于输出稳定的报告。
#[derive(Debug, Clone, Default)]
pub struct LayerTally {
    layers: BTreeMap<String, LayerStats>,
    total_commands: usize,
}

impl LayerTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, layer: &str) -> Option<&LayerStats> {
        self.layers.get(layer)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerStats)> {
        self.layers.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    #[inline]
    pub fn total_commands(&self) -> usize {
        self.total_commands
    }
}

impl ConversionObserver for LayerTally {
    fn element_converted(&mut self, layer: &str, color: &str, emitted: usize) {
        let stats = self
            .layers
            .entry(layer.to_string())
            .or_insert_with(|| LayerStats {
                color: color.to_string(),
                elements: 0,
                commands: 0,
            });
        stats.elements += 1;
        stats.commands += emitted;
    }

    fn finished(&mut self, total_commands: usize) {
        self.total_commands = total_commands;
    }
}

/// 过滤图层后逐个转换元素，按输入顺序拼接命令。
#[derive(Debug, Clone, Copy)]
pub struct CommandSequenceBuilder<'a> {
    resolver: BlockResolver<'a>,
    palette: &'a Palette,
    filter: &'a LayerFilter,
}

impl<'a> CommandSequenceBuilder<'a> {
    pub fn new(resolver: BlockResolver<'a>, palette: &'a Palette, filter: &'a LayerFilter) -> Self {
        Self {
            resolver,
            palette,
            filter,
        }
    }

    pub fn build(
        &self,
        document: &PlanDocument,
        observer: &mut dyn ConversionObserver,
    ) -> CommandSequence {
        let mut sequence = CommandSequence::new();
        let mut skipped = 0usize;
        for page in document.pages() {
            for element in &page.elements {
                let layer = element.layer_name();
                if !self.filter.is_visible(page, layer) {
                    skipped += 1;
                    continue;
                }
                let commands = self.convert_element(element);
                observer.element_converted(layer, self.palette.resolve("", layer), commands.len());
                sequence.extend(commands);
            }
        }
        debug!(
            pages = document.pages.len(),
            skipped,
            commands = sequence.len(),
            "绘图命令生成完成"
        );
        observer.finished(sequence.len());
        sequence
    }

    fn convert_element(&self, element: &DrawingElement) -> Vec<DrawingCommand> {
        let style = |layer: &str, color: &str| {
            CommandStyle::new(layer, self.palette.resolve(color, layer))
        };
        let command = match element {
            DrawingElement::BlockReference(block) => return self.resolver.resolve(block),
            DrawingElement::Line(line) => {
                style(&line.layer, &line.color).line(line.start, line.end)
            }
            DrawingElement::Arc(arc) => style(&arc.layer, &arc.color).arc(
                arc.center,
                arc.radius,
                arc.start_angle,
                arc.end_angle,
            ),
            DrawingElement::Circle(circle) => {
                style(&circle.layer, &circle.color).command(Primitive::Circle {
                    center: circle.center,
                    radius: circle.radius,
                })
            }
            DrawingElement::Polyline(polyline) => {
                style(&polyline.layer, &polyline.color).command(Primitive::Polyline {
                    points: polyline.points.clone(),
                })
            }
            DrawingElement::Text(text) => style(&text.layer, &text.color).command(Primitive::Text {
                position: text.position,
                content: text.content.clone(),
                font: text.font.clone(),
                height: text.height,
                angle: text.angle,
            }),
        };
        vec![command]
    }
}
