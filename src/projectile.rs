//! Enemy projectiles: straight bullets and homing missiles.

use glam::Vec2;
use rand::{Rng, RngCore};

use crate::compute::rotate_degrees;
use crate::entities::ProjectileKind;

// ── Tuning ───────────────────────────────────────────────────────────────────

pub const BULLET_MIN_LIFETIME: f32 = 3.0;
pub const BULLET_MAX_LIFETIME: f32 = 6.0;

pub const HOMING_LIFETIME: f32 = 5.0;
/// Launch deviation that gives missiles their curved opening.
pub const HOMING_ARC_DEGREES: f32 = 45.0;
/// Seconds of free flight before steering starts.
pub const HOMING_DELAY: f32 = 0.5;
/// Turn rate, degrees per second.
pub const HOMING_STRENGTH: f32 = 100.0;

/// Radius of the blast a missile leaves when it detonates.
pub const HOMING_EXPLOSION_RADIUS: f32 = 1.5;

// ── Collisions ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Contact {
    Player,
    /// Solid geometry; `normal` points away from the wall.
    Wall { normal: Vec2 },
    /// The puzzle piece; `normal` points from its centre toward the projectile.
    Piece { normal: Vec2 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollideOutcome {
    /// Hit the player and keeps flying.
    Damage,
    /// Bounced off and keeps flying.
    Bounced,
    /// Flew straight through.
    Passed,
    /// Blew up; everything within `HOMING_EXPLOSION_RADIUS` takes damage.
    Exploded,
}

// ── Projectile ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f32,
    pub age: f32,
    pub lifetime: f32,
    pub penetrates_piece: bool,
    /// Overlapping the player this step; damage lands on entry only.
    pub touching_player: bool,
}

impl Projectile {
    /// Launch a projectile.  Bullets fly along `direction`; missiles start
    /// off to one side of it (random side) and curve back later.
    pub fn initialize(
        kind: ProjectileKind,
        position: Vec2,
        direction: Vec2,
        speed: f32,
        rng: &mut dyn RngCore,
    ) -> Self {
        let direction = direction.normalize_or_zero();
        let (velocity, lifetime) = match kind {
            ProjectileKind::Bullet => (
                direction * speed,
                rng.gen_range(BULLET_MIN_LIFETIME..=BULLET_MAX_LIFETIME),
            ),
            ProjectileKind::Homing => {
                let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                (
                    rotate_degrees(direction, HOMING_ARC_DEGREES * side) * speed,
                    HOMING_LIFETIME,
                )
            }
        };
        Self {
            kind,
            position,
            velocity,
            speed,
            age: 0.0,
            lifetime,
            penetrates_piece: false,
            touching_player: false,
        }
    }

    pub fn with_penetration(mut self, penetrates_piece: bool) -> Self {
        self.penetrates_piece = penetrates_piece;
        self
    }

    /// Advance by `dt`.  Returns false once the projectile has expired.
    pub fn step(&mut self, dt: f32, target: Option<Vec2>) -> bool {
        self.age += dt;
        if self.kind == ProjectileKind::Homing && self.age >= HOMING_DELAY {
            if let Some(target) = target {
                self.steer_toward(target, dt);
            }
        }
        self.position += self.velocity * dt;
        self.age < self.lifetime
    }

    fn steer_toward(&mut self, target: Vec2, dt: f32) {
        let current = self.velocity.normalize_or_zero();
        let wanted = (target - self.position).normalize_or_zero();
        if current == Vec2::ZERO || wanted == Vec2::ZERO {
            return;
        }
        let diff = current.perp_dot(wanted).atan2(current.dot(wanted)).to_degrees();
        let max_turn = HOMING_STRENGTH * dt;
        let turn = diff.clamp(-max_turn, max_turn);
        self.velocity = rotate_degrees(current, turn) * self.speed;
    }

    pub fn on_collide(&mut self, contact: Contact) -> CollideOutcome {
        match (contact, self.kind) {
            (Contact::Player, ProjectileKind::Bullet) => CollideOutcome::Damage,
            (Contact::Wall { normal }, ProjectileKind::Bullet) => {
                self.reflect(normal);
                CollideOutcome::Bounced
            }
            (Contact::Piece { normal }, ProjectileKind::Bullet) if !self.penetrates_piece => {
                self.reflect(normal);
                CollideOutcome::Bounced
            }
            (Contact::Piece { .. }, _) => CollideOutcome::Passed,
            (Contact::Player | Contact::Wall { .. }, ProjectileKind::Homing) => {
                CollideOutcome::Exploded
            }
        }
    }

    fn reflect(&mut self, normal: Vec2) {
        let n = normal.normalize_or_zero();
        self.velocity -= 2.0 * self.velocity.dot(n) * n;
    }
}
