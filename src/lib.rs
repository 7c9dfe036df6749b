//! Boss-fight encounter core for a 2D bullet-hell game.
//!
//! The library holds the boss phase machine, its attack patterns and puzzle
//! mechanisms, the liveness registry that gates phase changes, and the
//! player-side gate that reacts to phase events.  A game loop drives it
//! through `BossEncounter::tick` and a `World` implementation.

pub mod boss;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod game;
pub mod mechanism;
pub mod pattern;
pub mod player;
pub mod projectile;
pub mod registry;
pub mod world;

pub use boss::{BossEncounter, EncounterContext};
pub use config::{BossConfig, FightConfig, PlayerConfig};
pub use entities::{BossPhase, EncounterEvent, EntityHandle};
pub use error::ConfigError;
pub use events::EventBus;
pub use world::{SimWorld, World};
