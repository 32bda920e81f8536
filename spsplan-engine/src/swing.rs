//! 门开启方向的推断。
//!
//! 源数据不记录门往哪一侧开，只能在铰链偏移的正负与开启弧的起始角
//! 两个二元选择组成的 4 个候选中挑选：取门扇终点离插入点最远者
//! （平方距离最大，同分时先出现者胜）。这是根据参考图纸经验拟合出来的
//! 规则，并非通用 CAD 约定。经验规则失效的具体门，由坐标例外表强制指定。

use std::f64::consts::{FRAC_PI_2, PI};

use spsplan_config::{AnchorConfig, RadiusRuleConfig, SwingOverrideConfig};
use spsplan_core::geometry::{Point2, Vector2};
use tracing::trace;

use crate::catalog::{DOOR_DEFAULT_WIDTH, span_or_default};
use crate::errors::EngineError;

/// 坐标例外匹配的默认容差（源单位）。
pub const EXCEPTION_TOLERANCE: f64 = 20.0;

/// 开启弧固定跨越 90°。
pub const SWING_SPAN: f64 = FRAC_PI_2;

/// 铰链偏移分量的符号：作用于偏移分量的绝对值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HingeSign {
    Positive,
    Negative,
}

impl HingeSign {
    #[inline]
    pub fn apply(self, component: f64) -> f64 {
        match self {
            HingeSign::Positive => component.abs(),
            HingeSign::Negative => -component.abs(),
        }
    }

    fn from_config(raw: i8) -> Option<Self> {
        match raw {
            1 => Some(HingeSign::Positive),
            -1 => Some(HingeSign::Negative),
            _ => None,
        }
    }
}

/// 门在图中的放置，已完成缩放归一化与半径计算。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoorPlacement {
    pub position: Point2,
    pub angle: f64,
    pub scale: Vector2,
    pub hinge_offset: Vector2,
    pub radius: f64,
}

impl DoorPlacement {
    /// 铰链点：`position + Rotate(frame) · (signed_offset ⊙ scale)`。
    pub fn hinge_point(&self, signs: [HingeSign; 2], frame: f64) -> Point2 {
        let local = Vector2::new(
            signs[0].apply(self.hinge_offset.x()),
            signs[1].apply(self.hinge_offset.y()),
        );
        self.position.translate(local.scaled(self.scale).rotated(frame))
    }
}

/// 已确定的开启几何：铰链（圆心）、半径与起始角。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingSolution {
    pub hinge: Point2,
    pub radius: f64,
    pub start_angle: f64,
}

impl SwingSolution {
    #[inline]
    pub fn end_angle(&self) -> f64 {
        self.start_angle + SWING_SPAN
    }

    /// 门扇静止位置的自由端，即开启弧的起点。
    #[inline]
    pub fn panel_end(&self) -> Point2 {
        self.hinge
            .translate(Vector2::from_polar(self.start_angle, self.radius))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingCandidate {
    pub hinge_sign: HingeSign,
    pub start_offset: f64,
    pub solution: SwingSolution,
    /// 门扇终点到插入点的平方距离。
    pub score: f64,
}

/// 按固定顺序（铰链 +、- 外层；起始角 +90°、-90° 内层）列出 4 个候选。
pub fn swing_candidates(placement: &DoorPlacement) -> [SwingCandidate; 4] {
    let candidate = |hinge_sign: HingeSign, start_offset: f64| {
        let solution = SwingSolution {
            hinge: placement.hinge_point([hinge_sign, hinge_sign], placement.angle),
            radius: placement.radius,
            start_angle: placement.angle + start_offset,
        };
        SwingCandidate {
            hinge_sign,
            start_offset,
            solution,
            score: solution.panel_end().distance_squared(placement.position),
        }
    };
    [
        candidate(HingeSign::Positive, FRAC_PI_2),
        candidate(HingeSign::Positive, -FRAC_PI_2),
        candidate(HingeSign::Negative, FRAC_PI_2),
        candidate(HingeSign::Negative, -FRAC_PI_2),
    ]
}

/// 选出得分最高的候选；得分相同时保留先出现的。
pub fn choose_swing(placement: &DoorPlacement) -> SwingCandidate {
    let candidates = swing_candidates(placement);
    let mut best = candidates[0];
    for candidate in candidates {
        trace!(
            hinge_sign = ?candidate.hinge_sign,
            start_offset = candidate.start_offset,
            score = candidate.score,
            "门开启候选"
        );
        if candidate.score > best.score {
            best = candidate;
        }
    }
    best
}

/// 例外规则的锚点匹配方式。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorMatch {
    /// `|dx| < tolerance && |dy| < tolerance`。
    Near { anchor: Point2, tolerance: f64 },
    /// `position.y > threshold`。
    AboveY { threshold: f64 },
}

impl AnchorMatch {
    pub fn near(x: f64, y: f64) -> Self {
        AnchorMatch::Near {
            anchor: Point2::new(x, y),
            tolerance: EXCEPTION_TOLERANCE,
        }
    }

    pub fn matches(&self, position: Point2) -> bool {
        match *self {
            AnchorMatch::Near { anchor, tolerance } => {
                (position.x() - anchor.x()).abs() < tolerance
                    && (position.y() - anchor.y()).abs() < tolerance
            }
            AnchorMatch::AboveY { threshold } => position.y() > threshold,
        }
    }
}

/// 强制配置下门半径的取法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadiusRule {
    /// 与一般流程相同（目录固定半径优先）。
    Catalog,
    /// 忽略目录固定半径，只由 X 缩放推出。
    ScaleOnly,
}

/// 一条坐标例外：命中时跳过候选评分，直接使用给定的铰链符号与角度偏移。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingOverride {
    pub anchor: AnchorMatch,
    pub hinge_signs: [HingeSign; 2],
    /// 铰链偏移额外旋转的角度（叠加在块旋转角上）。
    pub frame_rotation: f64,
    /// 开启弧起始角相对块旋转角的偏移。
    pub start_offset: f64,
    pub radius: RadiusRule,
}

impl SwingOverride {
    pub fn solve(&self, placement: &DoorPlacement) -> SwingSolution {
        let radius = match self.radius {
            RadiusRule::Catalog => placement.radius,
            RadiusRule::ScaleOnly => span_or_default(placement.scale.x(), DOOR_DEFAULT_WIDTH),
        };
        let frame = placement.angle + self.frame_rotation;
        SwingSolution {
            hinge: placement.hinge_point(self.hinge_signs, frame),
            radius,
            start_angle: placement.angle + self.start_offset,
        }
    }

    fn validate(&self, index: usize) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::InvalidOverride {
            index,
            reason: reason.to_string(),
        };
        match self.anchor {
            AnchorMatch::Near { anchor, tolerance } => {
                if !(tolerance.is_finite() && tolerance > 0.0) {
                    return Err(invalid("tolerance must be a positive finite number"));
                }
                if !(anchor.x().is_finite() && anchor.y().is_finite()) {
                    return Err(invalid("anchor coordinates must be finite"));
                }
            }
            AnchorMatch::AboveY { threshold } => {
                if !threshold.is_finite() {
                    return Err(invalid("threshold must be finite"));
                }
            }
        }
        if !(self.frame_rotation.is_finite() && self.start_offset.is_finite()) {
            return Err(invalid("rotation offsets must be finite"));
        }
        Ok(())
    }
}

impl TryFrom<&SwingOverrideConfig> for SwingOverride {
    type Error = String;

    fn try_from(config: &SwingOverrideConfig) -> Result<Self, Self::Error> {
        let sign = |raw: i8| {
            HingeSign::from_config(raw)
                .ok_or_else(|| format!("hinge sign must be 1 or -1, got {raw}"))
        };
        let anchor = match config.anchor {
            AnchorConfig::Near { x, y, tolerance } => AnchorMatch::Near {
                anchor: Point2::new(x, y),
                tolerance,
            },
            AnchorConfig::AboveY { threshold } => AnchorMatch::AboveY { threshold },
        };
        Ok(SwingOverride {
            anchor,
            hinge_signs: [sign(config.hinge_signs[0])?, sign(config.hinge_signs[1])?],
            frame_rotation: config.frame_rotation_deg.to_radians(),
            start_offset: config.start_offset_deg.to_radians(),
            radius: match config.radius {
                RadiusRuleConfig::Catalog => RadiusRule::Catalog,
                RadiusRuleConfig::ScaleOnly => RadiusRule::ScaleOnly,
            },
        })
    }
}

/// 有序的坐标例外表，先于一般规则查询，首个命中者生效。
#[derive(Debug, Clone, Default)]
pub struct SwingExceptionTable {
    rules: Vec<SwingOverride>,
}

impl SwingExceptionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 参考图纸中已知会被一般规则判错的门。
    pub fn builtin() -> Self {
        use HingeSign::{Negative, Positive};

        let inward = |x: f64, y: f64| SwingOverride {
            anchor: AnchorMatch::near(x, y),
            hinge_signs: [Negative, Positive],
            frame_rotation: 0.0,
            start_offset: -FRAC_PI_2,
            radius: RadiusRule::Catalog,
        };

        Self {
            rules: vec![
                SwingOverride {
                    anchor: AnchorMatch::near(7603.07, 15067.4),
                    hinge_signs: [Negative, Negative],
                    frame_rotation: PI,
                    start_offset: FRAC_PI_2,
                    radius: RadiusRule::ScaleOnly,
                },
                inward(20266.9, 10414.0),
                inward(18041.9, 10424.7),
                inward(21188.5, 12020.8),
                SwingOverride {
                    anchor: AnchorMatch::AboveY { threshold: 19000.0 },
                    hinge_signs: [Negative, Positive],
                    frame_rotation: 0.0,
                    start_offset: FRAC_PI_2,
                    radius: RadiusRule::Catalog,
                },
            ],
        }
    }

    /// 追加一条规则（排在已有规则之后）。
    pub fn push(&mut self, rule: SwingOverride) -> Result<(), EngineError> {
        rule.validate(self.rules.len())?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn push_config(&mut self, config: &SwingOverrideConfig) -> Result<(), EngineError> {
        let rule = SwingOverride::try_from(config).map_err(|reason| EngineError::InvalidOverride {
            index: self.rules.len(),
            reason,
        })?;
        self.push(rule)
    }

    pub fn find(&self, position: Point2) -> Option<&SwingOverride> {
        self.rules.iter().find(|rule| rule.anchor.matches(position))
    }

    #[inline]
    pub fn rules(&self) -> &[SwingOverride] {
        &self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(position: Point2, angle: f64) -> DoorPlacement {
        DoorPlacement {
            position,
            angle,
            scale: Vector2::new(1.0, 1.0),
            hinge_offset: Vector2::new(-0.5, 0.0),
            radius: 900.0,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn candidates_follow_fixed_order() {
        let candidates = swing_candidates(&placement(Point2::new(500.0, 0.0), 0.0));
        let order: Vec<_> = candidates
            .iter()
            .map(|c| (c.hinge_sign, c.start_offset))
            .collect();
        assert_eq!(
            order,
            [
                (HingeSign::Positive, FRAC_PI_2),
                (HingeSign::Positive, -FRAC_PI_2),
                (HingeSign::Negative, FRAC_PI_2),
                (HingeSign::Negative, -FRAC_PI_2),
            ]
        );
        assert!(close(candidates[0].solution.hinge.x(), 500.5));
        assert!(close(candidates[2].solution.hinge.x(), 499.5));
    }

    #[test]
    fn chosen_candidate_has_maximum_score() {
        for angle in [0.0, 0.3, FRAC_PI_2, 2.0, PI, -1.2] {
            let placement = DoorPlacement {
                hinge_offset: Vector2::new(55.6668, 946.667),
                radius: 958.667,
                ..placement(Point2::new(1000.0, 2000.0), angle)
            };
            let best = choose_swing(&placement);
            let max = swing_candidates(&placement)
                .iter()
                .map(|c| c.score)
                .fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(best.score, max);
        }
    }

    #[test]
    fn ties_keep_first_candidate() {
        // 铰链偏移为零时 4 个候选的门扇终点都在半径圆上，全部同分。
        let placement = DoorPlacement {
            hinge_offset: Vector2::new(0.0, 0.0),
            ..placement(Point2::new(0.0, 0.0), 0.0)
        };
        let best = choose_swing(&placement);
        assert_eq!(best.hinge_sign, HingeSign::Positive);
        assert_eq!(best.start_offset, FRAC_PI_2);
    }

    #[test]
    fn near_anchor_uses_strict_tolerance() {
        let anchor = AnchorMatch::near(100.0, 200.0);
        assert!(anchor.matches(Point2::new(119.9, 180.1)));
        assert!(!anchor.matches(Point2::new(120.0, 200.0)));
        assert!(!anchor.matches(Point2::new(100.0, 220.0)));

        let above = AnchorMatch::AboveY { threshold: 19000.0 };
        assert!(above.matches(Point2::new(0.0, 19000.5)));
        assert!(!above.matches(Point2::new(0.0, 19000.0)));
    }

    #[test]
    fn builtin_table_resolves_in_order() {
        let table = SwingExceptionTable::builtin();
        assert_eq!(table.len(), 5);

        let hit = table.find(Point2::new(7610.0, 15060.0)).expect("top-left door");
        assert_eq!(hit.radius, RadiusRule::ScaleOnly);
        assert_eq!(hit.frame_rotation, PI);

        let hit = table.find(Point2::new(18041.9, 10424.7)).expect("inward door");
        assert_eq!(hit.start_offset, -FRAC_PI_2);

        let hit = table.find(Point2::new(0.0, 19500.0)).expect("topmost door");
        assert_eq!(hit.start_offset, FRAC_PI_2);

        assert!(table.find(Point2::new(500.0, 0.0)).is_none());
    }

    #[test]
    fn forced_solution_applies_signs_and_frame() {
        let rule = SwingExceptionTable::builtin().rules()[0];
        let placement = DoorPlacement {
            hinge_offset: Vector2::new(-0.5, 0.25),
            scale: Vector2::new(2.0, 4.0),
            ..placement(Point2::new(7603.07, 15067.4), 0.0)
        };
        let solution = rule.solve(&placement);
        // (-1, -1) 再转 180° 得到 (+1, +1)。
        assert!(close(solution.hinge.x(), 7604.07));
        assert!(close(solution.hinge.y(), 15068.4));
        assert!(close(solution.start_angle, FRAC_PI_2));
        assert!(close(solution.end_angle() - solution.start_angle, FRAC_PI_2));
        // 半径只取 X 缩放。
        assert_eq!(solution.radius, 2.0);
    }

    #[test]
    fn scale_only_rule_replaces_fixed_radius() {
        let table = SwingExceptionTable::builtin();
        let top_left = table.rules()[0];
        let placement = DoorPlacement {
            hinge_offset: Vector2::new(55.6668, 946.667),
            radius: 958.667,
            ..placement(Point2::new(7603.07, 15067.4), 0.0)
        };
        assert_eq!(top_left.solve(&placement).radius, 900.0);

        let wide = DoorPlacement {
            scale: Vector2::new(1100.0, 1.0),
            ..placement
        };
        assert_eq!(top_left.solve(&wide).radius, 1100.0);

        let inward = table.rules()[1];
        assert_eq!(inward.radius, RadiusRule::Catalog);
        assert_eq!(inward.solve(&placement).radius, 958.667);
    }

    #[test]
    fn config_rules_are_validated() {
        let mut table = SwingExceptionTable::empty();
        let mut config = SwingOverrideConfig {
            anchor: AnchorConfig::Near {
                x: 1.0,
                y: 2.0,
                tolerance: 20.0,
            },
            hinge_signs: [-1, 1],
            frame_rotation_deg: 0.0,
            start_offset_deg: -90.0,
            radius: RadiusRuleConfig::Catalog,
        };
        table.push_config(&config).expect("valid rule");
        assert!(close(table.rules()[0].start_offset, -FRAC_PI_2));

        config.hinge_signs = [0, 1];
        let err = table.push_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOverride { index: 1, .. }));

        config.hinge_signs = [1, 1];
        config.anchor = AnchorConfig::Near {
            x: 1.0,
            y: 2.0,
            tolerance: 0.0,
        };
        let err = table.push_config(&config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidOverride { index: 1, .. }));
        assert_eq!(table.len(), 1);
    }
}
