//! Attack patterns as resumable per-tick emitters.
//!
//! `PatternInstance::execute` is fire-and-forget from the boss's point of
//! view: the boss registers the instance and keeps calling `advance` every
//! tick until `is_finished`.  A zero `shot_interval` emits every shot on the
//! first call; otherwise one shot goes out per interval.  A sequence emits
//! whole sub-patterns instead of projectiles and never waits for them.

use glam::Vec2;
use rand::{Rng, RngCore};

use crate::compute::{
    aim_direction, circle_direction, fan_direction, jittered_direction, line_offset,
    random_direction, random_point, rotate_degrees, scaled_speed, sequence_step_delay,
};
use crate::config::{Aim, DirectionRule, PatternDescriptor, PatternLibrary, PatternShape};
use crate::entities::ProjectileSpawn;

/// What one `advance` call asks the boss to do.
#[derive(Clone, Debug)]
pub enum PatternOutput {
    Projectile(ProjectileSpawn),
    /// A sequence step: run this as its own tracked pattern.
    SubPattern(PatternInstance),
}

#[derive(Clone, Debug)]
pub struct PatternInstance {
    descriptor: PatternDescriptor,
    /// Boss fire point at launch; sub-patterns of a sequence start here too.
    fire_point: Vec2,
    origin: Vec2,
    speed_multiplier: f32,
    is_angry: bool,
    /// Seconds until the next shot (or sequence step) is due.
    wait: f32,
    /// Index of the next shot (or sequence step).
    next: usize,
}

impl PatternInstance {
    pub fn execute(
        descriptor: &PatternDescriptor,
        fire_point: Vec2,
        speed_multiplier: f32,
        is_angry: bool,
    ) -> Self {
        let wait = match &descriptor.shape {
            PatternShape::Sequence { steps } => steps
                .first()
                .map(|s| sequence_step_delay(s.delay_before, is_angry))
                .unwrap_or(0.0),
            _ => 0.0,
        };
        Self {
            descriptor: descriptor.clone(),
            fire_point,
            origin: fire_point + descriptor.origin_offset,
            speed_multiplier,
            is_angry,
            wait,
            next: 0,
        }
    }

    pub fn descriptor(&self) -> &PatternDescriptor {
        &self.descriptor
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn is_angry(&self) -> bool {
        self.is_angry
    }

    /// Final projectile speed for this run.
    pub fn speed(&self) -> f32 {
        scaled_speed(self.descriptor.base_speed, self.speed_multiplier, self.is_angry)
    }

    /// Shots (or sequence steps) this pattern emits in total.
    pub fn total(&self) -> usize {
        match &self.descriptor.shape {
            PatternShape::Circle { bullet_count, .. }
            | PatternShape::Shotgun { bullet_count, .. }
            | PatternShape::Sniper { bullet_count, .. }
            | PatternShape::RandomSpray { bullet_count }
            | PatternShape::RandomRain { bullet_count, .. }
            | PatternShape::LinearLine { bullet_count, .. } => *bullet_count,
            PatternShape::CustomShape { spawn_points, .. } => spawn_points.len(),
            PatternShape::Sequence { steps } => steps.len(),
        }
    }

    pub fn emitted(&self) -> usize {
        self.next
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.total()
    }

    /// Move the schedule forward by `dt` and collect everything that is due.
    pub fn advance(
        &mut self,
        dt: f32,
        player: Option<Vec2>,
        library: &PatternLibrary,
        rng: &mut dyn RngCore,
    ) -> Vec<PatternOutput> {
        let mut out = Vec::new();
        if self.is_finished() {
            return out;
        }

        if let PatternShape::Sequence { steps } = &self.descriptor.shape {
            let steps = steps.clone();
            self.wait -= dt;
            while self.wait <= 0.0 && self.next < steps.len() {
                let step = &steps[self.next];
                match library.get(&step.pattern) {
                    Some(desc) => out.push(PatternOutput::SubPattern(PatternInstance::execute(
                        desc,
                        self.fire_point,
                        self.speed_multiplier,
                        self.is_angry,
                    ))),
                    None => tracing::warn!(pattern = %step.pattern, "sequence step references unknown pattern, skipped"),
                }
                self.next += 1;
                if let Some(following) = steps.get(self.next) {
                    self.wait += sequence_step_delay(following.delay_before, self.is_angry);
                }
            }
            return out;
        }

        let interval = self.descriptor.shot_interval;
        if interval <= 0.0 {
            while !self.is_finished() {
                out.push(PatternOutput::Projectile(self.fire_shot(self.next, player, rng)));
                self.next += 1;
            }
            return out;
        }

        self.wait -= dt;
        while self.wait <= 0.0 && !self.is_finished() {
            out.push(PatternOutput::Projectile(self.fire_shot(self.next, player, rng)));
            self.next += 1;
            self.wait += interval;
        }
        out
    }

    fn fire_shot(&self, index: usize, player: Option<Vec2>, rng: &mut dyn RngCore) -> ProjectileSpawn {
        let origin = self.origin;
        let (position, direction) = match &self.descriptor.shape {
            PatternShape::Circle {
                bullet_count,
                radius,
                start_angle,
            } => {
                let dir = circle_direction(index, *bullet_count, *start_angle);
                (origin + dir * *radius, dir)
            }
            PatternShape::Shotgun {
                bullet_count,
                spread_angle,
                aim,
            } => {
                let centre = match aim {
                    Aim::Player => aim_direction(origin, player),
                    Aim::Fixed { direction } => non_zero_or_down(*direction),
                };
                (origin, fan_direction(index, *bullet_count, centre, *spread_angle))
            }
            PatternShape::Sniper { jitter, .. } => {
                let aim = aim_direction(origin, player);
                (origin, jittered_direction(aim, *jitter, rng))
            }
            PatternShape::RandomSpray { .. } => (origin, random_direction(rng)),
            PatternShape::RandomRain { area, .. } => {
                (origin + random_point(area.min, area.max, rng), Vec2::NEG_Y)
            }
            PatternShape::LinearLine {
                bullet_count,
                half_width,
                vertical_jitter,
            } => {
                let dy = if *vertical_jitter > 0.0 {
                    rng.gen_range(-*vertical_jitter..=*vertical_jitter)
                } else {
                    0.0
                };
                let dx = line_offset(index, *bullet_count, *half_width);
                (origin + Vec2::new(dx, dy), Vec2::NEG_Y)
            }
            PatternShape::CustomShape {
                spawn_points,
                direction,
                fixed_direction,
            } => {
                let point = spawn_points[index];
                let position = origin + point.offset;
                let dir = match direction {
                    DirectionRule::SpawnPoint => rotate_degrees(Vec2::Y, point.rotation),
                    DirectionRule::Outward => non_zero_or_down(position - origin),
                    DirectionRule::Fixed => non_zero_or_down(*fixed_direction),
                };
                (position, dir)
            }
            // handled in advance
            PatternShape::Sequence { .. } => (origin, Vec2::NEG_Y),
        };

        ProjectileSpawn {
            position,
            direction,
            speed: self.speed(),
            kind: self.descriptor.projectile,
            penetrates_piece: self.descriptor.penetrates_piece,
        }
    }
}

fn non_zero_or_down(v: Vec2) -> Vec2 {
    let n = v.normalize_or_zero();
    if n == Vec2::ZERO {
        Vec2::NEG_Y
    } else {
        n
    }
}
