//! Game-loop integration: owns the world, the bus and every participant,
//! performs the event wiring, and turns one frame of input into calls on
//! the encounter.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::boss::{BossEncounter, EncounterContext};
use crate::config::FightConfig;
use crate::entities::{BossPhase, EncounterEvent, EventTopic, MechanismHandle, OverlapStage};
use crate::events::{EventBus, SubscriptionId};
use crate::player::{DragOutcome, Draggable, PlayerGate};
use crate::world::{SimWorld, WorldEvent};

/// Distance at which the piece counts as sitting on a mechanism.
pub const TRIGGER_RADIUS: f32 = 1.0;
/// How close the player must be to pick the piece up.
pub const REACH: f32 = 1.5;
/// Player shots within this distance of the boss land.
pub const BOSS_RADIUS: f32 = 1.5;
/// Enemy bullets bounce off a resting piece at this distance.
pub const PIECE_RADIUS: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Playing,
    Won,
    Lost,
}

/// One frame of player intent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Input {
    pub movement: Vec2,
    pub shoot: bool,
    pub dash: bool,
    /// Pick the piece up, or drop it if carried.
    pub interact: bool,
}

pub struct Game {
    pub world: SimWorld,
    pub bus: EventBus,
    rng: StdRng,
    pub boss: BossEncounter,
    pub player: PlayerGate,
    pub player_position: Vec2,
    pub piece: Draggable,
    /// Player shots in flight.
    pub shots: Vec<Vec2>,
    touching: BTreeSet<MechanismHandle>,
    feed: SubscriptionId,
    /// Seconds of boss damage flash left.
    pub flash: f32,
    /// Last phase announced on the bus.
    pub banner: Option<BossPhase>,
    pub status: Status,
}

impl Game {
    pub fn new(config: FightConfig, seed: u64) -> Self {
        let arena = config.boss.arena;
        let mut world = SimWorld::new(arena, seed);
        let mut bus = EventBus::new();
        let mut rng = StdRng::seed_from_u64(seed);

        let player_position = Vec2::new(0.0, arena.min.y + 2.0);
        let mut piece = Draggable::fight_piece(
            crate::config::default_target_tag(),
            player_position + Vec2::new(0.0, 2.0),
            config.player.drag_threshold,
        );
        let mut player = PlayerGate::new(config.player);
        let mut boss = BossEncounter::new(config.boss);

        boss.attach(&mut bus);
        player.attach(&mut bus);
        piece.attach(&mut bus);
        let feed = bus.subscribe(&[EventTopic::Phase, EventTopic::Damage, EventTopic::Defeat]);

        world.set_player_position(Some(player_position));
        boss.start_battle(&mut EncounterContext {
            world: &mut world,
            bus: &mut bus,
            rng: &mut rng,
        });

        let mut game = Self {
            world,
            bus,
            rng,
            boss,
            player,
            player_position,
            piece,
            shots: Vec::new(),
            touching: BTreeSet::new(),
            feed,
            flash: 0.0,
            banner: None,
            status: Status::Playing,
        };
        game.dispatch();
        game
    }

    pub fn is_carrying(&self) -> bool {
        self.piece.is_dragging()
    }

    /// Advance the whole fight by one frame.
    pub fn step(&mut self, input: &Input, dt: f32) {
        if self.status != Status::Playing {
            return;
        }

        if input.dash {
            self.player.try_dash(input.movement);
        }
        let arena = self.boss.config().arena;
        self.player_position = (self.player_position + self.player.velocity(input.movement) * dt)
            .clamp(arena.min, arena.max);
        self.piece.drag_to(self.player_position);

        if input.interact {
            self.interact();
        }
        if input.shoot && self.player.try_shoot() {
            self.shots.push(self.player_position + Vec2::Y * 0.5);
        }
        self.move_shots(dt);

        self.world.set_player_position(Some(self.player_position));
        // a carried piece sits on the player and must not shield them
        let shield = (!self.is_carrying()).then_some((self.piece.position, PIECE_RADIUS));
        self.world.set_shield(shield);
        for event in self.world.step(dt) {
            match event {
                WorldEvent::PlayerHit { .. } => {
                    self.player.take_damage();
                }
            }
        }

        self.report_overlaps();
        self.boss.tick(
            dt,
            &mut EncounterContext {
                world: &mut self.world,
                bus: &mut self.bus,
                rng: &mut self.rng,
            },
        );
        self.dispatch();

        self.player.tick(dt);
        self.flash = (self.flash - dt).max(0.0);

        if self.player.is_dead() {
            tracing::info!("player defeated");
            self.status = Status::Lost;
        }
    }

    fn interact(&mut self) {
        if self.piece.is_dragging() {
            let Some(outcome) = self.piece.end_drag(&mut self.bus) else {
                return;
            };
            let tag = self.piece.tag().to_string();
            for handle in self.mechanisms_near(self.piece.position) {
                self.boss.manual_trigger(handle, &tag);
            }
            if outcome == DragOutcome::Repositioned {
                tracing::debug!(x = self.piece.position.x, y = self.piece.position.y, "piece moved");
            }
        } else if self.piece.position.distance(self.player_position) <= REACH {
            self.piece.begin_drag();
        }
    }

    fn move_shots(&mut self, dt: f32) {
        let speed = self.player.config().projectile_speed;
        let boss = self.boss.position();
        let arena = self.boss.config().arena;
        let mut hits = 0;
        self.shots.retain_mut(|shot| {
            shot.y += speed * dt;
            if shot.distance(boss) <= BOSS_RADIUS {
                hits += 1;
                return false;
            }
            arena.contains(*shot)
        });

        for _ in 0..hits {
            self.boss.take_hit(&mut EncounterContext {
                world: &mut self.world,
                bus: &mut self.bus,
                rng: &mut self.rng,
            });
        }
    }

    /// Turn piece proximity into Enter / Stay / Exit notifications.
    fn report_overlaps(&mut self) {
        let now: BTreeSet<MechanismHandle> =
            self.mechanisms_near(self.piece.position).into_iter().collect();
        let tag = self.piece.tag().to_string();

        for handle in &now {
            let stage = if self.touching.contains(handle) {
                OverlapStage::Stay
            } else {
                OverlapStage::Enter
            };
            self.boss.mechanism_overlap(*handle, stage, &tag);
        }
        for handle in self.touching.difference(&now) {
            self.boss.mechanism_overlap(*handle, OverlapStage::Exit, &tag);
        }

        let movers: Vec<MechanismHandle> = self
            .boss
            .mechanisms()
            .filter(|(_, m)| {
                m.hazard_mover()
                    .is_some_and(|p| p.distance(self.piece.position) <= TRIGGER_RADIUS)
            })
            .map(|(h, _)| h)
            .collect();
        for handle in movers {
            self.boss.mechanism_contact(handle, &tag);
        }

        self.touching = now;
    }

    fn mechanisms_near(&self, position: Vec2) -> Vec<MechanismHandle> {
        self.boss
            .mechanisms()
            .filter(|(_, m)| m.position().distance(position) <= TRIGGER_RADIUS)
            .map(|(h, _)| h)
            .collect()
    }

    /// Hand queued bus traffic to every subscriber.
    fn dispatch(&mut self) {
        self.player.sync(&mut self.bus);
        self.piece.sync(&mut self.bus);
        for event in self.bus.poll(self.feed) {
            match event {
                EncounterEvent::PhaseEntered(phase) => self.banner = Some(phase),
                EncounterEvent::BossDamaged { duration, .. } => self.flash = duration,
                EncounterEvent::BossDefeated => self.status = Status::Won,
                _ => {}
            }
        }
    }
}
