//! Boss phase machine.
//!
//! One `BossEncounter` per fight.  The game loop calls `tick(dt, ctx)` once
//! per frame and forwards player hits, mechanism overlaps and drops.  Every
//! collaborator comes in through `EncounterContext`; the encounter holds no
//! references between calls.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use rand::RngCore;

use crate::compute::{post_wave_delay, tier_index};
use crate::config::{BossConfig, WaveSpec};
use crate::entities::{
    BossPhase, EncounterEvent, EntityHandle, EventTopic, MechanismHandle, OverlapStage,
    SpawnDescriptor,
};
use crate::events::{EventBus, SubscriptionId};
use crate::mechanism::{place_mechanisms, Mechanism, MechanismEffect};
use crate::pattern::{PatternInstance, PatternOutput};
use crate::registry::LivenessRegistry;
use crate::world::World;

/// Services the encounter borrows for the duration of one call.
pub struct EncounterContext<'a> {
    pub world: &'a mut dyn World,
    pub bus: &'a mut EventBus,
    pub rng: &'a mut dyn RngCore,
}

pub struct BossEncounter {
    config: BossConfig,
    health: u32,
    phase: BossPhase,
    /// Counts down during Special only.
    phase_timer: f32,
    hit_count: u32,
    was_last_special_blocked: bool,
    wave_queue: VecDeque<WaveSpec>,
    wave_delay: f32,
    projectiles: LivenessRegistry,
    patterns: LivenessRegistry,
    pattern_runs: BTreeMap<EntityHandle, PatternInstance>,
    mechanism_handles: LivenessRegistry,
    mechanisms: BTreeMap<MechanismHandle, Mechanism>,
    /// Mechanisms spawned on Special entry.  Zero means the set was never
    /// populated, which must not count as "all cleared".
    expected_mechanisms: usize,
    low_health: bool,
    defeated: bool,
    subscription: Option<SubscriptionId>,
}

impl BossEncounter {
    pub fn new(config: BossConfig) -> Self {
        let health = config.max_health;
        Self {
            config,
            health,
            phase: BossPhase::Idle,
            phase_timer: 0.0,
            hit_count: 0,
            was_last_special_blocked: false,
            wave_queue: VecDeque::new(),
            wave_delay: 0.0,
            projectiles: LivenessRegistry::new(),
            patterns: LivenessRegistry::new(),
            pattern_runs: BTreeMap::new(),
            mechanism_handles: LivenessRegistry::new(),
            mechanisms: BTreeMap::new(),
            expected_mechanisms: 0,
            low_health: false,
            defeated: false,
            subscription: None,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &BossConfig {
        &self.config
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    pub fn phase_timer(&self) -> f32 {
        self.phase_timer
    }

    pub fn hit_count(&self) -> u32 {
        self.hit_count
    }

    pub fn was_last_special_blocked(&self) -> bool {
        self.was_last_special_blocked
    }

    pub fn wave_queue(&self) -> &VecDeque<WaveSpec> {
        &self.wave_queue
    }

    pub fn wave_delay(&self) -> f32 {
        self.wave_delay
    }

    pub fn active_projectiles(&self) -> &LivenessRegistry {
        &self.projectiles
    }

    pub fn active_patterns(&self) -> &LivenessRegistry {
        &self.patterns
    }

    pub fn active_mechanisms(&self) -> &LivenessRegistry {
        &self.mechanism_handles
    }

    pub fn mechanisms(&self) -> impl Iterator<Item = (MechanismHandle, &Mechanism)> {
        self.mechanisms.iter().map(|(h, m)| (*h, m))
    }

    pub fn mechanism(&self, handle: MechanismHandle) -> Option<&Mechanism> {
        self.mechanisms.get(&handle)
    }

    pub fn expected_mechanisms(&self) -> usize {
        self.expected_mechanisms
    }

    pub fn is_low_health(&self) -> bool {
        self.low_health
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn position(&self) -> Vec2 {
        self.config.position
    }

    pub fn fire_point(&self) -> Vec2 {
        self.config.position + self.config.fire_offset
    }

    // ── Wiring ───────────────────────────────────────────────────────────────

    /// Listen for `FightTriggerRequested`.  Call once from the integration layer.
    pub fn attach(&mut self, bus: &mut EventBus) {
        if self.subscription.is_none() {
            self.subscription = Some(bus.subscribe(&[EventTopic::FightTrigger]));
        }
    }

    pub fn detach(&mut self, bus: &mut EventBus) {
        if let Some(id) = self.subscription.take() {
            bus.unsubscribe(id);
        }
    }

    /// Full health, back to Idle.
    pub fn start_battle(&mut self, ctx: &mut EncounterContext) {
        self.health = self.config.max_health;
        self.hit_count = 0;
        self.low_health = false;
        self.defeated = false;
        tracing::info!(boss = %self.config.name, health = self.health, "battle started");
        self.enter_phase(BossPhase::Idle, ctx);
    }

    /// External start signal.  Ignored outside Idle.
    pub fn trigger_fight(&mut self, ctx: &mut EncounterContext) {
        if self.defeated || self.phase != BossPhase::Idle {
            return;
        }
        self.enter_phase(BossPhase::Special, ctx);
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    pub fn tick(&mut self, dt: f32, ctx: &mut EncounterContext) {
        if self.defeated {
            return;
        }

        if let Some(id) = self.subscription {
            let requested = ctx
                .bus
                .poll(id)
                .iter()
                .any(|e| *e == EncounterEvent::FightTriggerRequested);
            if requested {
                self.trigger_fight(ctx);
            }
        }

        self.advance_patterns(dt, ctx);

        match self.phase {
            BossPhase::Idle | BossPhase::Vulnerable => {}
            BossPhase::Special => self.tick_special(dt, ctx),
            BossPhase::Attacking => self.tick_attacking(dt, ctx),
            BossPhase::WaitingForBullets => {
                self.prune(ctx.world);
                if self.projectiles.is_empty() && self.patterns.is_empty() {
                    self.enter_phase(BossPhase::Idle, ctx);
                }
            }
        }
    }

    fn tick_special(&mut self, dt: f32, ctx: &mut EncounterContext) {
        let mut explosions = Vec::new();
        for mechanism in self.mechanisms.values_mut() {
            if let Some(MechanismEffect::Explode { position, radius }) = mechanism.tick(dt) {
                explosions.push((position, radius));
            }
        }
        for (position, radius) in explosions {
            tracing::debug!(x = position.x, y = position.y, "hazard ran out and exploded");
            ctx.world.spawn(SpawnDescriptor::Hazard { radius }, position, 0.0);
        }

        if self.special_cleared(ctx.world) {
            self.was_last_special_blocked = true;
            self.clear_mechanisms(ctx.world);
            self.enter_phase(BossPhase::Vulnerable, ctx);
            return;
        }

        self.phase_timer -= dt;
        if self.phase_timer <= 0.0 {
            self.was_last_special_blocked = self.special_cleared(ctx.world);
            self.clear_mechanisms(ctx.world);
            self.enter_phase(BossPhase::Vulnerable, ctx);
        }
    }

    fn tick_attacking(&mut self, dt: f32, ctx: &mut EncounterContext) {
        self.prune(ctx.world);
        if !self.projectiles.is_empty() || !self.patterns.is_empty() {
            return;
        }
        if self.wave_delay > 0.0 {
            self.wave_delay -= dt;
            return;
        }
        match self.wave_queue.pop_front() {
            None => self.enter_phase(BossPhase::WaitingForBullets, ctx),
            Some(wave) => self.launch_wave(&wave, ctx),
        }
    }

    /// Success: the set was populated, and everything still alive is cleared.
    fn special_cleared(&mut self, world: &dyn World) -> bool {
        if self.expected_mechanisms == 0 {
            return false;
        }
        self.prune_mechanisms(world);
        self.mechanisms.values().all(Mechanism::is_cleared)
    }

    // ── Waves and patterns ───────────────────────────────────────────────────

    fn launch_wave(&mut self, wave: &WaveSpec, ctx: &mut EncounterContext) {
        let is_angry = !self.was_last_special_blocked;
        self.wave_delay = post_wave_delay(wave.delay_before_next, self.was_last_special_blocked);

        let Some(descriptor) = self.config.patterns.get(&wave.pattern) else {
            tracing::warn!(pattern = %wave.pattern, "wave references unknown pattern, skipped");
            return;
        };
        tracing::debug!(
            pattern = %wave.pattern,
            angry = is_angry,
            delay = self.wave_delay,
            "launching wave"
        );
        let instance =
            PatternInstance::execute(descriptor, self.fire_point(), wave.speed_multiplier, is_angry);
        self.start_pattern(instance, ctx);
    }

    /// Register a pattern and let it emit whatever is due right away.
    fn start_pattern(&mut self, instance: PatternInstance, ctx: &mut EncounterContext) {
        let handle = ctx
            .world
            .spawn(SpawnDescriptor::Pattern, instance.origin(), 0.0);
        self.patterns.register(handle);
        self.pattern_runs.insert(handle, instance);
        self.drive_pattern(handle, 0.0, ctx);
    }

    fn advance_patterns(&mut self, dt: f32, ctx: &mut EncounterContext) {
        let handles: Vec<EntityHandle> = self.pattern_runs.keys().copied().collect();
        for handle in handles {
            if !ctx.world.is_alive(handle) {
                self.pattern_runs.remove(&handle);
                continue;
            }
            self.drive_pattern(handle, dt, ctx);
        }
    }

    fn drive_pattern(&mut self, handle: EntityHandle, dt: f32, ctx: &mut EncounterContext) {
        let player = ctx.world.player_position();
        let (outputs, finished) = match self.pattern_runs.get_mut(&handle) {
            Some(run) => {
                let outputs = run.advance(dt, player, &self.config.patterns, &mut *ctx.rng);
                (outputs, run.is_finished())
            }
            None => return,
        };

        for output in outputs {
            match output {
                PatternOutput::Projectile(shot) => {
                    let projectile = ctx.world.spawn(
                        SpawnDescriptor::Projectile {
                            direction: shot.direction,
                            speed: shot.speed,
                            kind: shot.kind,
                            penetrates_piece: shot.penetrates_piece,
                        },
                        shot.position,
                        crate::compute::degrees_of(shot.direction),
                    );
                    self.projectiles.register(projectile);
                }
                PatternOutput::SubPattern(sub) => self.start_pattern(sub, ctx),
            }
        }

        if finished {
            self.pattern_runs.remove(&handle);
            ctx.world.destroy(handle);
        }
    }

    /// Stop every running pattern.  Projectiles already out are left alone.
    fn cancel_patterns(&mut self, world: &mut dyn World) {
        for handle in std::mem::take(&mut self.pattern_runs).into_keys() {
            world.destroy(handle);
        }
        for handle in self.patterns.iter().collect::<Vec<_>>() {
            world.destroy(handle);
        }
        self.patterns.prune(world);
    }

    fn prune(&mut self, world: &dyn World) {
        self.projectiles.prune(world);
        self.patterns.prune(world);
        let patterns = &self.patterns;
        self.pattern_runs.retain(|h, _| patterns.contains(*h));
    }

    // ── Mechanisms ───────────────────────────────────────────────────────────

    fn prune_mechanisms(&mut self, world: &dyn World) {
        self.mechanism_handles.prune(world);
        let live = &self.mechanism_handles;
        self.mechanisms.retain(|h, _| live.contains(*h));
    }

    /// Force-clear and destroy every mechanism of the current Special phase.
    fn clear_mechanisms(&mut self, world: &mut dyn World) {
        for (handle, mut mechanism) in std::mem::take(&mut self.mechanisms) {
            mechanism.force_clear();
            world.destroy(handle);
        }
        for handle in self.mechanism_handles.iter().collect::<Vec<_>>() {
            world.destroy(handle);
        }
        self.mechanism_handles.prune(world);
    }

    /// Special-phase spawn hook: scatter mechanisms over the arena.
    fn spawn_mechanisms(&mut self, ctx: &mut EncounterContext) {
        let settings = &self.config.mechanisms;
        let positions = place_mechanisms(
            settings,
            &self.config.arena,
            self.config.position,
            &mut *ctx.rng,
        );
        if settings.template.is_none() && !positions.is_empty() {
            tracing::warn!(
                count = positions.len(),
                "no mechanism template configured, spawning pre-cleared placeholders"
            );
        }

        for position in positions {
            let mechanism = match &settings.template {
                Some(template) => {
                    Mechanism::from_template(template, position, &self.config.arena, &mut *ctx.rng)
                }
                None => Mechanism::placeholder(position),
            };
            let handle = ctx.world.spawn(SpawnDescriptor::Mechanism, position, 0.0);
            self.mechanism_handles.register(handle);
            self.mechanisms.insert(handle, mechanism);
        }
        self.expected_mechanisms = self.mechanisms.len();
    }

    /// Overlap notification for a mechanism's trigger region.
    pub fn mechanism_overlap(
        &mut self,
        handle: MechanismHandle,
        stage: OverlapStage,
        tag: &str,
    ) -> bool {
        if self.phase != BossPhase::Special {
            return false;
        }
        let cleared = self
            .mechanisms
            .get_mut(&handle)
            .is_some_and(|m| m.on_overlap(stage, tag));
        if cleared {
            tracing::debug!(mechanism = handle.0, "mechanism cleared by overlap");
        }
        cleared
    }

    /// The gating actor touched a timed hazard's mover.
    pub fn mechanism_contact(&mut self, handle: MechanismHandle, tag: &str) -> bool {
        if self.phase != BossPhase::Special {
            return false;
        }
        let cleared = self
            .mechanisms
            .get_mut(&handle)
            .is_some_and(|m| m.on_mover_contact(tag));
        if cleared {
            tracing::debug!(mechanism = handle.0, "hazard intercepted");
        }
        cleared
    }

    /// Drag-and-drop release onto a mechanism.  Wrong tags are ignored.
    pub fn manual_trigger(&mut self, handle: MechanismHandle, tag: &str) -> bool {
        if self.phase != BossPhase::Special {
            return false;
        }
        let cleared = self
            .mechanisms
            .get_mut(&handle)
            .is_some_and(|m| m.manual_trigger(tag));
        if cleared {
            tracing::debug!(mechanism = handle.0, "mechanism cleared by drop");
        }
        cleared
    }

    // ── Hits ─────────────────────────────────────────────────────────────────

    /// Register one player hit.  No-op unless Vulnerable.  Returns whether the
    /// hit counted.
    pub fn take_hit(&mut self, ctx: &mut EncounterContext) -> bool {
        if self.defeated || self.phase != BossPhase::Vulnerable {
            return false;
        }
        self.hit_count += 1;
        if self.hit_count < self.config.hits_per_damage {
            return true;
        }

        self.hit_count = 0;
        self.health = self.health.saturating_sub(1);
        let feedback = self.config.damage_feedback;
        ctx.bus.publish(EncounterEvent::BossDamaged {
            intensity: feedback.intensity,
            duration: feedback.duration,
        });
        tracing::info!(health = self.health, "boss damaged");

        if !self.low_health && self.health > 0 && self.health <= self.config.low_health_threshold {
            self.low_health = true;
            ctx.bus.publish(EncounterEvent::BossLowHealthStateChanged(true));
        }

        if self.health == 0 {
            self.die(ctx);
        } else {
            self.enter_phase(BossPhase::Attacking, ctx);
        }
        true
    }

    fn die(&mut self, ctx: &mut EncounterContext) {
        self.defeated = true;
        self.cancel_patterns(ctx.world);
        self.clear_mechanisms(ctx.world);
        self.wave_queue.clear();
        if self.low_health {
            self.low_health = false;
            ctx.bus.publish(EncounterEvent::BossLowHealthStateChanged(false));
        }
        ctx.bus.publish(EncounterEvent::BossDefeated);
        tracing::info!(boss = %self.config.name, "boss defeated");
    }

    // ── Phase entry ──────────────────────────────────────────────────────────

    fn enter_phase(&mut self, phase: BossPhase, ctx: &mut EncounterContext) {
        self.phase = phase;
        tracing::info!(?phase, health = self.health, "phase entered");
        ctx.bus.publish(EncounterEvent::PhaseEntered(phase));

        match phase {
            BossPhase::Idle | BossPhase::WaitingForBullets => {}
            BossPhase::Special => {
                self.phase_timer = self.config.special_timer;
                self.was_last_special_blocked = false;
                self.clear_mechanisms(ctx.world);
                self.expected_mechanisms = 0;
                self.spawn_mechanisms(ctx);
            }
            BossPhase::Vulnerable => {
                self.hit_count = 0;
            }
            BossPhase::Attacking => {
                self.hit_count = 0;
                self.wave_delay = 0.0;
                self.load_attack_phase();
                if self.wave_queue.is_empty() {
                    self.enter_phase(BossPhase::WaitingForBullets, ctx);
                }
            }
        }
    }

    /// Fill the wave queue from the tier for the current health.
    fn load_attack_phase(&mut self) {
        self.wave_queue.clear();
        let Some(index) = tier_index(self.config.max_health, self.health, self.config.tiers.len())
        else {
            tracing::error!(boss = %self.config.name, "wave-tier table is empty");
            return;
        };
        if let Some(tier) = self.config.tier(index) {
            self.wave_queue.extend(tier.waves.iter().cloned());
        }
        if self.wave_queue.is_empty() {
            tracing::warn!(tier = index, "wave tier has no waves");
        }
    }
}
