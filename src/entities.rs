//! Encounter data types, plus the small geometry and topic helpers on them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ── Boss phases ──────────────────────────────────────────────────────────────

/// One discrete state of the boss controller.  Exactly one is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossPhase {
    #[default]
    Idle,
    /// Puzzle mechanisms are on the field and the special timer runs down.
    Special,
    /// Waves from the current health tier are being fired.
    Attacking,
    /// The wave queue is spent; waiting for the last projectiles to die.
    WaitingForBullets,
    /// The boss can be hit by the player.
    Vulnerable,
}

// ── Handles ──────────────────────────────────────────────────────────────────

/// Opaque handle to an entity owned by the world.  The world may destroy it
/// at any time; holders find out through `World::is_alive`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u64);

/// Mechanisms live in the world like every other entity.
pub type MechanismHandle = EntityHandle;

// ── Spawning ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Flies straight along its initial direction.
    #[default]
    Bullet,
    /// Arcs away from its launch direction, then steers toward the player.
    Homing,
}

/// What the world is asked to create.
#[derive(Clone, Debug, PartialEq)]
pub enum SpawnDescriptor {
    Projectile {
        direction: Vec2,
        speed: f32,
        kind: ProjectileKind,
        /// Flies through the puzzle piece instead of bouncing off it.
        penetrates_piece: bool,
    },
    /// Placeholder entity standing for a running attack pattern.
    Pattern,
    /// Placeholder entity standing for a special-phase mechanism.
    Mechanism,
    /// Explosion left behind by a timed hazard that ran out.
    Hazard { radius: f32 },
}

/// A single projectile a pattern wants fired this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectileSpawn {
    pub position: Vec2,
    /// Unit vector.
    pub direction: Vec2,
    pub speed: f32,
    pub kind: ProjectileKind,
    pub penetrates_piece: bool,
}

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle in world units (y grows upward).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Shrink every side by `padding`.  Collapses to the centre instead of
    /// inverting when the padding is larger than half the size.
    pub fn shrink(&self, padding: f32) -> Self {
        let centre = (self.min + self.max) * 0.5;
        Self {
            min: (self.min + Vec2::splat(padding)).min(centre),
            max: (self.max - Vec2::splat(padding)).max(centre),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

// ── Physics notifications ────────────────────────────────────────────────────

/// Stage of an overlap between a mechanism trigger and another actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapStage {
    Enter,
    Stay,
    Exit,
}

// ── Events ───────────────────────────────────────────────────────────────────

/// Everything published on the encounter's event bus.
#[derive(Clone, Debug, PartialEq)]
pub enum EncounterEvent {
    PhaseEntered(BossPhase),
    /// Presentation hint for camera shake / sprite flash.
    BossDamaged { intensity: f32, duration: f32 },
    BossLowHealthStateChanged(bool),
    BossDefeated,
    /// Raised by the fight piece when the player confirms its position.
    FightTriggerRequested,
}

/// Subscription filter for `EncounterEvent`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Phase,
    Damage,
    LowHealth,
    Defeat,
    FightTrigger,
}

impl EncounterEvent {
    pub fn topic(&self) -> EventTopic {
        match self {
            EncounterEvent::PhaseEntered(_) => EventTopic::Phase,
            EncounterEvent::BossDamaged { .. } => EventTopic::Damage,
            EncounterEvent::BossLowHealthStateChanged(_) => EventTopic::LowHealth,
            EncounterEvent::BossDefeated => EventTopic::Defeat,
            EncounterEvent::FightTriggerRequested => EventTopic::FightTrigger,
        }
    }
}
