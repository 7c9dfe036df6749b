//! Fight configuration: boss tuning, wave tiers, pattern library, mechanism
//! templates and player tuning.  Loaded from TOML; every field has a default
//! so partial files work.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entities::{ProjectileKind, Rect};
use crate::error::ConfigError;

/// Name of a pattern in `BossConfig::patterns`.
pub type PatternRef = String;

/// Named pattern descriptors a boss can fire.
pub type PatternLibrary = BTreeMap<PatternRef, PatternDescriptor>;

// ── Top level ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FightConfig {
    pub boss: BossConfig,
    pub player: PlayerConfig,
}

impl FightConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: FightConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: FightConfig =
            toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.boss.validate()?;
        self.player.validate()
    }
}

// ── Boss ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub name: String,
    pub max_health: u32,
    /// Player hits needed, while vulnerable, to take one point of health.
    pub hits_per_damage: u32,
    /// Seconds the special phase lasts before it counts as failed.
    pub special_timer: f32,
    pub position: Vec2,
    /// Where patterns fire from, relative to `position`.
    pub fire_offset: Vec2,
    /// Playfield bounds; mechanisms and hazard paths stay inside it.
    pub arena: Rect,
    pub damage_feedback: DamageFeedback,
    /// Health at or below which the low-health state is raised.
    pub low_health_threshold: u32,
    pub mechanisms: MechanismConfig,
    /// Indexed by health lost: tier 0 is fired at full health.
    pub tiers: Vec<WaveTier>,
    pub patterns: PatternLibrary,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageFeedback {
    pub intensity: f32,
    pub duration: f32,
}

impl Default for DamageFeedback {
    fn default() -> Self {
        Self {
            intensity: 0.3,
            duration: 0.2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTier {
    pub waves: Vec<WaveSpec>,
}

/// One scheduled pattern in a tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub pattern: PatternRef,
    #[serde(default)]
    pub delay_before_next: f32,
    #[serde(default = "one")]
    pub speed_multiplier: f32,
}

impl WaveSpec {
    pub fn new(pattern: impl Into<PatternRef>, delay_before_next: f32) -> Self {
        Self {
            pattern: pattern.into(),
            delay_before_next,
            speed_multiplier: 1.0,
        }
    }
}

fn one() -> f32 {
    1.0
}

impl BossConfig {
    /// Waves for a tier, or `None` when the tier table is empty.
    pub fn tier(&self, index: usize) -> Option<&WaveTier> {
        self.tiers.get(index)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_health == 0 {
            return Err(ConfigError::invalid("boss.max_health must be at least 1"));
        }
        if self.hits_per_damage == 0 {
            return Err(ConfigError::invalid("boss.hits_per_damage must be at least 1"));
        }
        non_negative("boss.special_timer", self.special_timer)?;
        for (t, tier) in self.tiers.iter().enumerate() {
            for wave in &tier.waves {
                non_negative(&format!("tier {t} delay_before_next"), wave.delay_before_next)?;
                non_negative(&format!("tier {t} speed_multiplier"), wave.speed_multiplier)?;
                if !self.patterns.contains_key(&wave.pattern) {
                    return Err(ConfigError::invalid(format!(
                        "tier {t} references unknown pattern `{}`",
                        wave.pattern
                    )));
                }
            }
        }
        for (name, pattern) in &self.patterns {
            non_negative(&format!("pattern `{name}` base_speed"), pattern.base_speed)?;
            non_negative(&format!("pattern `{name}` shot_interval"), pattern.shot_interval)?;
            if let PatternShape::Sequence { steps } = &pattern.shape {
                for step in steps {
                    non_negative(&format!("sequence `{name}` delay_before"), step.delay_before)?;
                    if !self.patterns.contains_key(&step.pattern) {
                        return Err(ConfigError::invalid(format!(
                            "sequence `{name}` references unknown pattern `{}`",
                            step.pattern
                        )));
                    }
                }
            }
            let mut path = BTreeSet::new();
            if sequence_cycles(name, &self.patterns, &mut path) {
                return Err(ConfigError::invalid(format!(
                    "sequence `{name}` eventually references itself"
                )));
            }
        }
        if let Some(MechanismTemplate {
            kind: MechanismKind::TimedHazard { travel_duration, .. },
            ..
        }) = &self.mechanisms.template
        {
            non_negative("mechanisms.travel_duration", *travel_duration)?;
        }
        Ok(())
    }
}

/// Timers, speeds and multipliers must be finite and non-negative; a NaN
/// timer never expires.
fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(format!(
            "{field} must be a finite number >= 0, got {value}"
        )))
    }
}

/// Depth-first walk of sequence steps; true when `name` is reached again.
fn sequence_cycles(name: &str, library: &PatternLibrary, path: &mut BTreeSet<String>) -> bool {
    if !path.insert(name.to_string()) {
        return true;
    }
    if let Some(PatternDescriptor {
        shape: PatternShape::Sequence { steps },
        ..
    }) = library.get(name)
    {
        for step in steps {
            if sequence_cycles(&step.pattern, library, path) {
                return true;
            }
        }
    }
    path.remove(name);
    false
}

// ── Patterns ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternDescriptor {
    #[serde(default = "default_base_speed")]
    pub base_speed: f32,
    /// Seconds between shots; 0 fires every shot in the same instant.
    #[serde(default)]
    pub shot_interval: f32,
    #[serde(default)]
    pub projectile: ProjectileKind,
    /// Pattern centre relative to the boss fire point.
    #[serde(default)]
    pub origin_offset: Vec2,
    /// Shots fly through the puzzle piece instead of bouncing off it.
    #[serde(default)]
    pub penetrates_piece: bool,
    pub shape: PatternShape,
}

fn default_base_speed() -> f32 {
    5.0
}

impl PatternDescriptor {
    pub fn new(shape: PatternShape) -> Self {
        Self {
            base_speed: default_base_speed(),
            shot_interval: 0.0,
            projectile: ProjectileKind::Bullet,
            origin_offset: Vec2::ZERO,
            penetrates_piece: false,
            shape,
        }
    }

    pub fn with_speed(mut self, base_speed: f32) -> Self {
        self.base_speed = base_speed;
        self
    }

    pub fn with_interval(mut self, shot_interval: f32) -> Self {
        self.shot_interval = shot_interval;
        self
    }

    pub fn with_projectile(mut self, projectile: ProjectileKind) -> Self {
        self.projectile = projectile;
        self
    }

    pub fn penetrating(mut self) -> Self {
        self.penetrates_piece = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternShape {
    /// Ring of shots spaced `360/bullet_count` degrees.
    Circle {
        bullet_count: usize,
        #[serde(default)]
        radius: f32,
        #[serde(default)]
        start_angle: f32,
    },
    /// Fan of shots across `spread_angle` degrees.
    Shotgun {
        bullet_count: usize,
        #[serde(default = "default_spread")]
        spread_angle: f32,
        #[serde(default)]
        aim: Aim,
    },
    /// Shots at the player with a little angular jitter.
    Sniper {
        bullet_count: usize,
        #[serde(default = "default_jitter")]
        jitter: f32,
    },
    RandomSpray {
        bullet_count: usize,
    },
    /// Shots falling straight down from random points in `area`
    /// (relative to the pattern centre).
    RandomRain {
        bullet_count: usize,
        area: Rect,
    },
    /// Shots spread along a horizontal segment, falling straight down.
    LinearLine {
        bullet_count: usize,
        half_width: f32,
        #[serde(default)]
        vertical_jitter: f32,
    },
    /// Authored spawn points.
    CustomShape {
        spawn_points: Vec<SpawnPoint>,
        #[serde(default)]
        direction: DirectionRule,
        #[serde(default = "down")]
        fixed_direction: Vec2,
    },
    /// Other patterns fired one after the other.
    Sequence { steps: Vec<SequenceStep> },
}

fn default_spread() -> f32 {
    90.0
}

fn default_jitter() -> f32 {
    crate::compute::SNIPER_JITTER_DEGREES
}

fn down() -> Vec2 {
    Vec2::NEG_Y
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Aim {
    #[default]
    Player,
    Fixed { direction: Vec2 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionRule {
    /// Each point fires along its own rotation.
    #[default]
    SpawnPoint,
    /// Radiate away from the pattern centre.
    Outward,
    Fixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub offset: Vec2,
    /// Degrees; the point fires along its local "up" rotated by this much.
    #[serde(default)]
    pub rotation: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub pattern: PatternRef,
    #[serde(default)]
    pub delay_before: f32,
}

// ── Mechanisms ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MechanismConfig {
    pub count: usize,
    /// Inset from the arena edge for placement.
    pub padding: f32,
    /// Minimum spacing between mechanisms and from the boss.
    pub min_distance: f32,
    /// `None` leaves the special phase with pre-cleared placeholders.
    pub template: Option<MechanismTemplate>,
}

impl Default for MechanismConfig {
    fn default() -> Self {
        Self {
            count: 3,
            padding: 1.0,
            min_distance: 2.0,
            template: Some(MechanismTemplate::default()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MechanismTemplate {
    pub kind: MechanismKind,
    #[serde(default = "default_target_tag")]
    pub target_tag: String,
}

impl Default for MechanismTemplate {
    fn default() -> Self {
        Self {
            kind: MechanismKind::Overlap { one_shot: false },
            target_tag: default_target_tag(),
        }
    }
}

pub fn default_target_tag() -> String {
    "PlayerButton".to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MechanismKind {
    /// Cleared while the tagged actor overlaps it; reappears when it leaves
    /// unless `one_shot`.
    Overlap {
        #[serde(default)]
        one_shot: bool,
    },
    /// Ignores physical overlap; only a drop through `manual_trigger` clears it.
    DropTarget,
    /// A mover travels along a path; touching it clears the hazard, letting it
    /// reach the end blows it up.
    TimedHazard {
        #[serde(default = "default_travel")]
        travel_duration: f32,
        #[serde(default = "default_path")]
        path_length: f32,
        #[serde(default = "yes")]
        one_shot: bool,
        #[serde(default = "default_explosion")]
        explosion_radius: f32,
    },
}

fn default_travel() -> f32 {
    2.0
}

fn default_path() -> f32 {
    5.0
}

fn default_explosion() -> f32 {
    1.5
}

fn yes() -> bool {
    true
}

// ── Player ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    pub invincibility_duration: f32,
    pub move_speed: f32,
    pub max_stamina: f32,
    pub stamina_regen: f32,
    pub dash_cost: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub projectile_speed: f32,
    /// Drags shorter than this count as a click.
    pub drag_threshold: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 4,
            invincibility_duration: 1.5,
            move_speed: 5.0,
            max_stamina: 100.0,
            stamina_regen: 20.0,
            dash_cost: 30.0,
            dash_speed: 20.0,
            dash_duration: 0.2,
            dash_cooldown: 0.5,
            projectile_speed: 10.0,
            drag_threshold: 0.1,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_health == 0 {
            return Err(ConfigError::invalid("player.max_health must be at least 1"));
        }
        if self.max_stamina < 0.0 || self.dash_cost < 0.0 {
            return Err(ConfigError::invalid("player stamina values must be >= 0"));
        }
        Ok(())
    }
}

// ── Built-in demo boss ───────────────────────────────────────────────────────

impl Default for BossConfig {
    /// A playable "Cleaner" boss: three mechanisms per special phase and a
    /// tier table that escalates as it loses health.
    fn default() -> Self {
        let mut patterns = PatternLibrary::new();
        patterns.insert(
            "ring".into(),
            PatternDescriptor::new(PatternShape::Circle {
                bullet_count: 12,
                radius: 0.5,
                start_angle: 0.0,
            })
            .with_speed(4.0),
        );
        patterns.insert(
            "fan".into(),
            PatternDescriptor::new(PatternShape::Shotgun {
                bullet_count: 5,
                spread_angle: 60.0,
                aim: Aim::Player,
            }),
        );
        patterns.insert(
            "snipe".into(),
            PatternDescriptor::new(PatternShape::Sniper {
                bullet_count: 3,
                jitter: default_jitter(),
            })
            .with_speed(8.0)
            .with_interval(0.3),
        );
        patterns.insert(
            "rain".into(),
            PatternDescriptor::new(PatternShape::RandomRain {
                bullet_count: 10,
                area: Rect::new(Vec2::new(-12.0, 0.0), Vec2::new(12.0, 2.0)),
            })
            .with_speed(3.0)
            .with_interval(0.1),
        );
        patterns.insert(
            "missiles".into(),
            PatternDescriptor::new(PatternShape::Shotgun {
                bullet_count: 2,
                spread_angle: 40.0,
                aim: Aim::Player,
            })
            .with_speed(4.0)
            .with_projectile(ProjectileKind::Homing),
        );
        patterns.insert(
            "barrage".into(),
            PatternDescriptor::new(PatternShape::Sequence {
                steps: vec![
                    SequenceStep {
                        pattern: "ring".into(),
                        delay_before: 0.0,
                    },
                    SequenceStep {
                        pattern: "fan".into(),
                        delay_before: 0.5,
                    },
                    SequenceStep {
                        pattern: "snipe".into(),
                        delay_before: 0.5,
                    },
                ],
            }),
        );

        let tiers = vec![
            WaveTier {
                waves: vec![WaveSpec::new("ring", 1.0), WaveSpec::new("fan", 1.0)],
            },
            WaveTier {
                waves: vec![WaveSpec::new("rain", 1.0), WaveSpec::new("snipe", 0.8)],
            },
            WaveTier {
                waves: vec![WaveSpec::new("barrage", 1.0), WaveSpec::new("missiles", 1.0)],
            },
        ];

        Self {
            name: "Cleaner".to_string(),
            max_health: 6,
            hits_per_damage: 10,
            special_timer: 7.0,
            position: Vec2::new(0.0, 8.0),
            fire_offset: Vec2::new(0.0, -1.0),
            arena: Rect::new(Vec2::new(-14.0, -10.0), Vec2::new(14.0, 10.0)),
            damage_feedback: DamageFeedback::default(),
            low_health_threshold: 1,
            mechanisms: MechanismConfig::default(),
            tiers,
            patterns,
        }
    }
}
