//! Special-phase puzzle mechanisms.
//!
//! A mechanism is cleared exactly when its visual is hidden.  A mechanism
//! without a visual at all is treated as cleared from the start.

use glam::Vec2;
use rand::{Rng, RngCore};

use crate::compute::{lerp_path, random_point, rotate_degrees};
use crate::config::{MechanismConfig, MechanismKind, MechanismTemplate};
use crate::entities::{OverlapStage, Rect};

/// Placement attempts per mechanism before falling back to the boss position.
pub const PLACEMENT_ATTEMPTS: usize = 20;

/// Attempts at a hazard path whose end stays inside the arena.
pub const PATH_ATTEMPTS: usize = 30;

/// Side effect a mechanism asks the boss to carry out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MechanismEffect {
    /// A timed hazard reached the end of its path untouched.
    Explode { position: Vec2, radius: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HazardPath {
    pub start: Vec2,
    pub end: Vec2,
    pub mover: Vec2,
    pub mover_active: bool,
    elapsed: f32,
    travel_duration: f32,
    one_shot: bool,
    finished: bool,
    explosion_radius: f32,
}

impl HazardPath {
    pub fn progress(&self) -> f32 {
        if self.travel_duration <= 0.0 {
            0.0
        } else {
            self.elapsed / self.travel_duration
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mechanism {
    kind: MechanismKind,
    target_tag: String,
    position: Vec2,
    /// `None` means there is no visual to hide.
    visual_active: Option<bool>,
    hazard: Option<HazardPath>,
}

impl Mechanism {
    pub fn from_template(
        template: &MechanismTemplate,
        position: Vec2,
        arena: &Rect,
        rng: &mut dyn RngCore,
    ) -> Self {
        let hazard = match template.kind {
            MechanismKind::TimedHazard {
                travel_duration,
                path_length,
                one_shot,
                explosion_radius,
            } => Some(HazardPath {
                start: position,
                end: safe_path_end(position, path_length, arena, rng),
                mover: position,
                mover_active: true,
                elapsed: 0.0,
                travel_duration,
                one_shot,
                finished: false,
                explosion_radius,
            }),
            _ => None,
        };
        Self {
            kind: template.kind,
            target_tag: template.target_tag.clone(),
            position,
            visual_active: Some(true),
            hazard,
        }
    }

    /// Stand-in for a mechanism whose template is missing.
    pub fn placeholder(position: Vec2) -> Self {
        Self {
            kind: MechanismKind::DropTarget,
            target_tag: String::new(),
            position,
            visual_active: None,
            hazard: None,
        }
    }

    pub fn is_cleared(&self) -> bool {
        match self.visual_active {
            None => true,
            Some(active) => !active,
        }
    }

    pub fn kind(&self) -> MechanismKind {
        self.kind
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn target_tag(&self) -> &str {
        &self.target_tag
    }

    pub fn hazard(&self) -> Option<&HazardPath> {
        self.hazard.as_ref()
    }

    /// Current position of the hazard's moving part, while it is out.
    pub fn hazard_mover(&self) -> Option<Vec2> {
        self.hazard
            .as_ref()
            .filter(|h| h.mover_active && !self.is_cleared())
            .map(|h| h.mover)
    }

    /// Physics overlap with another actor.  Returns true if this cleared it.
    pub fn on_overlap(&mut self, stage: OverlapStage, tag: &str) -> bool {
        if tag != self.target_tag {
            return false;
        }
        let was_cleared = self.is_cleared();
        match (self.kind, stage) {
            (MechanismKind::DropTarget, _) => {}
            (MechanismKind::Overlap { .. }, OverlapStage::Enter | OverlapStage::Stay) => {
                self.hide();
            }
            (MechanismKind::Overlap { one_shot }, OverlapStage::Exit) => {
                if !one_shot {
                    self.show();
                }
            }
            (MechanismKind::TimedHazard { .. }, OverlapStage::Enter | OverlapStage::Stay) => {
                self.force_clear();
            }
            (MechanismKind::TimedHazard { .. }, OverlapStage::Exit) => {}
        }
        !was_cleared && self.is_cleared()
    }

    /// Explicit clear from a drag-and-drop release.  Wrong tags are ignored.
    pub fn manual_trigger(&mut self, tag: &str) -> bool {
        if tag != self.target_tag {
            return false;
        }
        let was_cleared = self.is_cleared();
        self.force_clear();
        !was_cleared
    }

    /// The gating actor touched the hazard's mover.
    pub fn on_mover_contact(&mut self, tag: &str) -> bool {
        if tag != self.target_tag || self.hazard_mover().is_none() {
            return false;
        }
        self.force_clear();
        true
    }

    /// Advance the hazard path, if any.
    pub fn tick(&mut self, dt: f32) -> Option<MechanismEffect> {
        if self.is_cleared() {
            return None;
        }
        let hazard = self.hazard.as_mut()?;
        if hazard.one_shot && hazard.finished {
            return None;
        }
        if hazard.travel_duration <= 0.0 {
            return None;
        }

        hazard.elapsed += dt;
        if hazard.one_shot {
            let t = (hazard.elapsed / hazard.travel_duration).min(1.0);
            hazard.mover = lerp_path(hazard.start, hazard.end, t);
            if t >= 1.0 {
                hazard.finished = true;
                hazard.mover_active = false;
                let effect = MechanismEffect::Explode {
                    position: hazard.mover,
                    radius: hazard.explosion_radius,
                };
                self.hide();
                return Some(effect);
            }
        } else {
            let t = (hazard.elapsed / hazard.travel_duration).fract();
            hazard.mover = lerp_path(hazard.start, hazard.end, t);
        }
        None
    }

    /// Hide everything; the mechanism counts as cleared from now on.
    pub fn force_clear(&mut self) {
        self.hide();
        if let Some(h) = self.hazard.as_mut() {
            h.finished = true;
            h.mover_active = false;
        }
    }

    /// Show the visual again and restart any hazard on a fresh path.
    pub fn reset(&mut self, arena: &Rect, rng: &mut dyn RngCore) {
        self.show();
        if let Some(h) = self.hazard.as_mut() {
            let length = h.start.distance(h.end);
            h.end = safe_path_end(h.start, length, arena, rng);
            h.mover = h.start;
            h.mover_active = true;
            h.elapsed = 0.0;
            h.finished = false;
        }
    }

    fn hide(&mut self) {
        if let Some(active) = self.visual_active.as_mut() {
            *active = false;
        }
    }

    fn show(&mut self) {
        if let Some(active) = self.visual_active.as_mut() {
            *active = true;
        }
    }
}

/// Random path end `length` away from `start` that stays inside `arena`.
fn safe_path_end(start: Vec2, length: f32, arena: &Rect, rng: &mut dyn RngCore) -> Vec2 {
    for _ in 0..PATH_ATTEMPTS {
        let dir = rotate_degrees(Vec2::Y, rng.gen_range(0.0..360.0));
        let end = start + dir * length;
        if arena.contains(end) {
            return end;
        }
    }
    start + rotate_degrees(Vec2::Y, rng.gen_range(0.0..360.0)) * length
}

/// Pick spawn positions inside the padded arena, `min_distance` apart from
/// each other and from the boss.  Positions that cannot be found fall back
/// to the boss position.
pub fn place_mechanisms(
    config: &MechanismConfig,
    arena: &Rect,
    boss: Vec2,
    rng: &mut dyn RngCore,
) -> Vec<Vec2> {
    let area = arena.shrink(config.padding);
    let mut placed: Vec<Vec2> = Vec::with_capacity(config.count);

    for _ in 0..config.count {
        let mut chosen = boss;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let candidate = random_point(area.min, area.max, rng);
            let too_close = placed
                .iter()
                .chain(std::iter::once(&boss))
                .any(|p| p.distance(candidate) < config.min_distance);
            if !too_close {
                chosen = candidate;
                break;
            }
        }
        placed.push(chosen);
    }
    placed
}
