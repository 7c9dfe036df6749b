//! World services the encounter consumes, plus an in-memory world.
//!
//! The encounter never owns entity lifetimes.  It asks the world to spawn
//! things, remembers the handles, and later asks whether they are still
//! alive.  `SimWorld` is the world the terminal game and the tests run on.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::entities::{EntityHandle, Rect, SpawnDescriptor};
use crate::projectile::{CollideOutcome, Contact, Projectile, HOMING_EXPLOSION_RADIUS};

/// Spawn / liveness / destroy services provided by the game loop.
pub trait World {
    /// Create an entity; `rotation` is in degrees.
    fn spawn(&mut self, descriptor: SpawnDescriptor, position: Vec2, rotation: f32) -> EntityHandle;
    fn is_alive(&self, handle: EntityHandle) -> bool;
    /// Destroying a dead handle is a no-op.
    fn destroy(&mut self, handle: EntityHandle);
    /// Where the player currently is, if there is one.
    fn player_position(&self) -> Option<Vec2>;
}

// ── SimWorld ─────────────────────────────────────────────────────────────────

/// Seconds an explosion lingers after a hazard detonates.
pub const HAZARD_LINGER: f32 = 0.3;

#[derive(Clone, Debug)]
pub enum SimEntity {
    Projectile(Projectile),
    Pattern { position: Vec2 },
    Mechanism { position: Vec2 },
    Hazard {
        position: Vec2,
        radius: f32,
        remaining: f32,
        detonated: bool,
    },
}

/// Things that happened to the player during `SimWorld::step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorldEvent {
    PlayerHit { by: EntityHandle },
}

pub struct SimWorld {
    next_id: u64,
    entities: BTreeMap<EntityHandle, SimEntity>,
    player: Option<Vec2>,
    pub player_radius: f32,
    /// Bullets bounce off these walls; missiles explode on them.
    pub bounds: Rect,
    /// Centre and radius of the puzzle piece, which bullets bounce off.
    shield: Option<(Vec2, f32)>,
    rng: StdRng,
}

impl SimWorld {
    pub fn new(bounds: Rect, seed: u64) -> Self {
        Self {
            next_id: 1,
            entities: BTreeMap::new(),
            player: None,
            player_radius: 0.5,
            bounds,
            shield: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn set_player_position(&mut self, position: Option<Vec2>) {
        self.player = position;
    }

    pub fn set_shield(&mut self, shield: Option<(Vec2, f32)>) {
        self.shield = shield;
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&SimEntity> {
        self.entities.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn projectiles(&self) -> impl Iterator<Item = (EntityHandle, &Projectile)> {
        self.entities.iter().filter_map(|(h, e)| match e {
            SimEntity::Projectile(p) => Some((*h, p)),
            _ => None,
        })
    }

    /// Live explosions as (position, radius).
    pub fn hazards(&self) -> impl Iterator<Item = (Vec2, f32)> + '_ {
        self.entities.values().filter_map(|e| match e {
            SimEntity::Hazard {
                position, radius, ..
            } => Some((*position, *radius)),
            _ => None,
        })
    }

    pub fn projectile_count(&self) -> usize {
        self.projectiles().count()
    }

    /// Remove every projectile, as if the player had dodged them all.
    pub fn clear_projectiles(&mut self) {
        self.entities
            .retain(|_, e| !matches!(e, SimEntity::Projectile(_)));
    }

    /// Advance projectiles and explosions by `dt`.
    pub fn step(&mut self, dt: f32) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        let mut dead = Vec::new();
        let mut blasts = Vec::new();
        let player = self.player;
        let hit_radius = self.player_radius;
        let bounds = self.bounds;
        let shield = self.shield;

        for (handle, entity) in self.entities.iter_mut() {
            match entity {
                SimEntity::Projectile(p) => {
                    if !p.step(dt, player) {
                        dead.push(*handle);
                        continue;
                    }
                    let mut outcome = None;
                    if let Some(normal) = wall_normal(&bounds, p.position) {
                        p.position = p.position.clamp(bounds.min, bounds.max);
                        outcome = Some(p.on_collide(Contact::Wall { normal }));
                    }
                    if let (None, Some((centre, radius))) = (outcome, shield) {
                        let offset = p.position - centre;
                        if offset.length() <= radius {
                            let normal = offset
                                .try_normalize()
                                .unwrap_or_else(|| -p.velocity.normalize_or_zero());
                            outcome = Some(p.on_collide(Contact::Piece { normal }));
                            if outcome == Some(CollideOutcome::Bounced) {
                                p.position = centre + normal * radius;
                            }
                        }
                    }
                    if let (None | Some(CollideOutcome::Passed), Some(pp)) = (outcome, player) {
                        let touching = pp.distance(p.position) <= hit_radius;
                        if touching && !p.touching_player {
                            outcome = Some(p.on_collide(Contact::Player));
                        }
                        p.touching_player = touching;
                    }

                    match outcome {
                        Some(CollideOutcome::Damage) => {
                            events.push(WorldEvent::PlayerHit { by: *handle });
                        }
                        Some(CollideOutcome::Exploded) => {
                            if player.is_some_and(|pp| {
                                pp.distance(p.position) <= HOMING_EXPLOSION_RADIUS + hit_radius
                            }) {
                                events.push(WorldEvent::PlayerHit { by: *handle });
                            }
                            blasts.push(p.position);
                            dead.push(*handle);
                        }
                        Some(CollideOutcome::Bounced | CollideOutcome::Passed) | None => {}
                    }
                }
                SimEntity::Hazard {
                    position,
                    radius,
                    remaining,
                    detonated,
                } => {
                    if !*detonated {
                        *detonated = true;
                        if let Some(pp) = player {
                            if pp.distance(*position) <= *radius + hit_radius {
                                events.push(WorldEvent::PlayerHit { by: *handle });
                            }
                        }
                    }
                    *remaining -= dt;
                    if *remaining <= 0.0 {
                        dead.push(*handle);
                    }
                }
                SimEntity::Pattern { .. } | SimEntity::Mechanism { .. } => {}
            }
        }

        for handle in dead {
            self.entities.remove(&handle);
        }
        // blasts have already dealt their damage and only linger for display
        for position in blasts {
            let handle = self.next_handle();
            self.entities.insert(
                handle,
                SimEntity::Hazard {
                    position,
                    radius: HOMING_EXPLOSION_RADIUS,
                    remaining: HAZARD_LINGER,
                    detonated: true,
                },
            );
        }
        events
    }

    fn next_handle(&mut self) -> EntityHandle {
        let handle = EntityHandle(self.next_id);
        self.next_id += 1;
        handle
    }
}

/// Outward normal of the wall `p` has crossed, if any.
fn wall_normal(bounds: &Rect, p: Vec2) -> Option<Vec2> {
    if p.x < bounds.min.x {
        Some(Vec2::X)
    } else if p.x > bounds.max.x {
        Some(Vec2::NEG_X)
    } else if p.y < bounds.min.y {
        Some(Vec2::Y)
    } else if p.y > bounds.max.y {
        Some(Vec2::NEG_Y)
    } else {
        None
    }
}

impl World for SimWorld {
    fn spawn(&mut self, descriptor: SpawnDescriptor, position: Vec2, _rotation: f32) -> EntityHandle {
        let handle = self.next_handle();
        let entity = match descriptor {
            SpawnDescriptor::Projectile {
                direction,
                speed,
                kind,
                penetrates_piece,
            } => SimEntity::Projectile(
                Projectile::initialize(kind, position, direction, speed, &mut self.rng)
                    .with_penetration(penetrates_piece),
            ),
            SpawnDescriptor::Pattern => SimEntity::Pattern { position },
            SpawnDescriptor::Mechanism => SimEntity::Mechanism { position },
            SpawnDescriptor::Hazard { radius } => SimEntity::Hazard {
                position,
                radius,
                remaining: HAZARD_LINGER,
                detonated: false,
            },
        };
        self.entities.insert(handle, entity);
        handle
    }

    fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(&handle)
    }

    fn destroy(&mut self, handle: EntityHandle) {
        self.entities.remove(&handle);
    }

    fn player_position(&self) -> Option<Vec2> {
        self.player
    }
}
