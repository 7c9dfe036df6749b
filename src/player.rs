//! Player side of the fight: the combat gate driven by boss phase events,
//! and the draggable puzzle piece.

use glam::Vec2;

use crate::config::PlayerConfig;
use crate::entities::{BossPhase, EncounterEvent, EventTopic};
use crate::events::{EventBus, SubscriptionId};

/// Tag a piece carries while it is unlocked or being dragged.  Mechanisms
/// never accept it.
pub const UNTAGGED: &str = "Untagged";

// ── Combat gate ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DashState {
    Ready,
    Dashing { remaining: f32, direction: Vec2 },
    Cooldown { remaining: f32 },
}

#[derive(Debug)]
pub struct PlayerGate {
    config: PlayerConfig,
    can_shoot: bool,
    health: u32,
    invincible_for: f32,
    stamina: f32,
    dash: DashState,
    subscription: Option<SubscriptionId>,
}

impl PlayerGate {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            health: config.max_health,
            stamina: config.max_stamina,
            config,
            can_shoot: false,
            invincible_for: 0.0,
            dash: DashState::Ready,
            subscription: None,
        }
    }

    pub fn attach(&mut self, bus: &mut EventBus) {
        if self.subscription.is_none() {
            self.subscription = Some(bus.subscribe(&[EventTopic::Phase]));
        }
    }

    pub fn detach(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription.take() {
            bus.unsubscribe(id);
        }
    }

    /// Apply everything queued for this gate since the last call.
    pub fn sync(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription {
            for event in bus.poll(id) {
                self.apply_event(&event);
            }
        }
    }

    pub fn apply_event(&mut self, event: &EncounterEvent) {
        match event {
            EncounterEvent::PhaseEntered(BossPhase::Vulnerable) => self.can_shoot = true,
            EncounterEvent::PhaseEntered(BossPhase::Attacking) => self.can_shoot = false,
            _ => {}
        }
    }

    pub fn can_shoot(&self) -> bool {
        self.can_shoot
    }

    /// True when a shot may be fired right now.
    pub fn try_shoot(&self) -> bool {
        self.can_shoot && !self.is_dead()
    }

    /// One point of damage, unless invincible or already dead.
    pub fn take_damage(&mut self) -> bool {
        if self.is_dead() || self.invincible_for > 0.0 {
            return false;
        }
        self.health -= 1;
        if self.health > 0 {
            self.invincible_for = self.config.invincibility_duration;
        }
        tracing::info!(health = self.health, "player hit");
        true
    }

    pub fn tick(&mut self, dt: f32) {
        self.invincible_for = (self.invincible_for - dt).max(0.0);

        self.dash = match self.dash {
            DashState::Dashing {
                remaining,
                direction,
            } if remaining - dt > 0.0 => DashState::Dashing {
                remaining: remaining - dt,
                direction,
            },
            DashState::Dashing { .. } => DashState::Cooldown {
                remaining: self.config.dash_cooldown,
            },
            DashState::Cooldown { remaining } if remaining - dt > 0.0 => DashState::Cooldown {
                remaining: remaining - dt,
            },
            DashState::Cooldown { .. } | DashState::Ready => DashState::Ready,
        };

        if !self.is_dashing() {
            self.stamina = (self.stamina + self.config.stamina_regen * dt).min(self.config.max_stamina);
        }
    }

    /// Start a dash along `input`.  Needs a direction, enough stamina and no
    /// dash in progress or cooling down.
    pub fn try_dash(&mut self, input: Vec2) -> bool {
        let direction = input.normalize_or_zero();
        if direction == Vec2::ZERO
            || self.dash != DashState::Ready
            || self.stamina < self.config.dash_cost
            || self.is_dead()
        {
            return false;
        }
        self.stamina -= self.config.dash_cost;
        self.dash = DashState::Dashing {
            remaining: self.config.dash_duration,
            direction,
        };
        true
    }

    /// Velocity for this frame given the movement input.
    pub fn velocity(&self, input: Vec2) -> Vec2 {
        match self.dash {
            DashState::Dashing { direction, .. } => direction * self.config.dash_speed,
            _ => input.normalize_or_zero() * self.config.move_speed,
        }
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.dash, DashState::Dashing { .. })
    }

    pub fn dash(&self) -> DashState {
        self.dash
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.config.max_health
    }

    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    pub fn max_stamina(&self) -> f32 {
        self.config.max_stamina
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_for > 0.0
    }

    pub fn is_low_health(&self) -> bool {
        self.health == 1
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }
}

// ── Draggable piece ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// Released about where it was picked up.
    Clicked,
    Repositioned,
}

#[derive(Debug)]
pub struct Draggable {
    original_tag: String,
    tag: String,
    draggable: bool,
    pub position: Vec2,
    drag_start: Option<Vec2>,
    threshold: f32,
    /// A fight piece asks for the fight to start when clicked.
    triggers_fight: bool,
    subscription: Option<SubscriptionId>,
}

impl Draggable {
    /// Starts locked, carrying `tag`.
    pub fn new(tag: impl Into<String>, position: Vec2, threshold: f32) -> Self {
        let tag = tag.into();
        Self {
            original_tag: tag.clone(),
            tag,
            draggable: false,
            position,
            drag_start: None,
            threshold,
            triggers_fight: false,
            subscription: None,
        }
    }

    pub fn fight_piece(tag: impl Into<String>, position: Vec2, threshold: f32) -> Self {
        Self {
            triggers_fight: true,
            ..Self::new(tag, position, threshold)
        }
    }

    pub fn attach(&mut self, bus: &mut EventBus) {
        if self.subscription.is_none() {
            self.subscription = Some(bus.subscribe(&[EventTopic::Phase]));
        }
    }

    pub fn detach(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription.take() {
            bus.unsubscribe(id);
        }
    }

    pub fn sync(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription {
            for event in bus.poll(id) {
                self.apply_event(&event);
            }
        }
    }

    pub fn apply_event(&mut self, event: &EncounterEvent) {
        match event {
            EncounterEvent::PhaseEntered(BossPhase::Idle) => {
                self.draggable = true;
                self.tag = UNTAGGED.to_string();
            }
            EncounterEvent::PhaseEntered(BossPhase::Vulnerable) => {
                self.draggable = false;
                self.tag = self.original_tag.clone();
            }
            _ => {}
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    pub fn begin_drag(&mut self) -> bool {
        if !self.draggable || self.is_dragging() {
            return false;
        }
        self.drag_start = Some(self.position);
        self.tag = UNTAGGED.to_string();
        true
    }

    pub fn drag_to(&mut self, position: Vec2) {
        if self.is_dragging() {
            self.position = position;
        }
    }

    /// Release the piece.  The original tag comes back, so the caller should
    /// now report the drop to whatever mechanism lies under `position`.
    pub fn end_drag(&mut self, bus: &mut EventBus) -> Option<DragOutcome> {
        let start = self.drag_start.take()?;
        self.tag = self.original_tag.clone();

        if self.position.distance(start) < self.threshold {
            if self.triggers_fight {
                tracing::info!("fight piece confirmed in place");
                bus.publish(EncounterEvent::FightTriggerRequested);
            }
            Some(DragOutcome::Clicked)
        } else {
            Some(DragOutcome::Repositioned)
        }
    }
}
