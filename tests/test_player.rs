use boss_fight::config::PlayerConfig;
use boss_fight::entities::{BossPhase, EncounterEvent, EventTopic};
use boss_fight::events::EventBus;
use boss_fight::player::{DashState, DragOutcome, Draggable, PlayerGate, UNTAGGED};

use glam::Vec2;

fn gate() -> PlayerGate {
    PlayerGate::new(PlayerConfig::default())
}

fn phase(p: BossPhase) -> EncounterEvent {
    EncounterEvent::PhaseEntered(p)
}

// ── Shooting gate ─────────────────────────────────────────────────────────────

#[test]
fn cannot_shoot_before_the_boss_is_vulnerable() {
    let g = gate();
    assert!(!g.can_shoot());
    assert!(!g.try_shoot());
}

#[test]
fn shooting_follows_boss_phases() {
    let mut g = gate();
    g.apply_event(&phase(BossPhase::Vulnerable));
    assert!(g.try_shoot());
    g.apply_event(&phase(BossPhase::Attacking));
    assert!(!g.can_shoot());
    // other phases leave the gate alone
    g.apply_event(&phase(BossPhase::Vulnerable));
    g.apply_event(&phase(BossPhase::Idle));
    g.apply_event(&EncounterEvent::BossDefeated);
    assert!(g.can_shoot());
}

#[test]
fn gate_syncs_from_the_bus() {
    let mut bus = EventBus::new();
    let mut g = gate();
    g.attach(&mut bus);

    bus.publish(phase(BossPhase::Special));
    bus.publish(phase(BossPhase::Vulnerable));
    g.sync(&mut bus);
    assert!(g.can_shoot());

    g.detach(&mut bus);
    bus.publish(phase(BossPhase::Attacking));
    g.sync(&mut bus);
    assert!(g.can_shoot());
}

#[test]
fn dead_player_cannot_shoot() {
    let mut g = PlayerGate::new(PlayerConfig {
        max_health: 1,
        ..PlayerConfig::default()
    });
    g.apply_event(&phase(BossPhase::Vulnerable));
    assert!(g.take_damage());
    assert!(g.is_dead());
    assert!(!g.try_shoot());
}

// ── Health ────────────────────────────────────────────────────────────────────

#[test]
fn damage_grants_invincibility() {
    let mut g = gate();
    assert!(g.take_damage());
    assert_eq!(g.health(), 3);
    assert!(g.is_invincible());
    assert!(!g.take_damage());
    assert_eq!(g.health(), 3);

    g.tick(1.6);
    assert!(!g.is_invincible());
    assert!(g.take_damage());
    assert_eq!(g.health(), 2);
}

#[test]
fn low_health_at_one_heart() {
    let mut g = gate();
    for _ in 0..3 {
        g.take_damage();
        g.tick(2.0);
    }
    assert_eq!(g.health(), 1);
    assert!(g.is_low_health());
    assert!(g.take_damage());
    assert!(g.is_dead());
    assert!(!g.is_invincible());
    assert!(!g.take_damage());
    assert_eq!(g.health(), 0);
}

// ── Dash and stamina ──────────────────────────────────────────────────────────

#[test]
fn dash_spends_stamina_and_overrides_movement() {
    let mut g = gate();
    assert!(g.try_dash(Vec2::new(3.0, 0.0)));
    assert_eq!(g.stamina(), 70.0);
    assert!(g.is_dashing());
    assert_eq!(g.velocity(Vec2::Y), Vec2::new(20.0, 0.0));
}

#[test]
fn dash_needs_a_direction() {
    let mut g = gate();
    assert!(!g.try_dash(Vec2::ZERO));
    assert_eq!(g.stamina(), 100.0);
    assert_eq!(g.dash(), DashState::Ready);
}

#[test]
fn dash_runs_then_cools_down() {
    let mut g = gate();
    g.try_dash(Vec2::X);
    assert!(!g.try_dash(Vec2::X));

    g.tick(0.25);
    assert!(matches!(g.dash(), DashState::Cooldown { .. }));
    assert!(!g.try_dash(Vec2::X));
    assert_eq!(g.velocity(Vec2::X), Vec2::new(5.0, 0.0));

    g.tick(0.6);
    assert_eq!(g.dash(), DashState::Ready);
    assert!(g.try_dash(Vec2::X));
}

#[test]
fn dash_needs_enough_stamina() {
    let mut g = PlayerGate::new(PlayerConfig {
        stamina_regen: 0.0,
        ..PlayerConfig::default()
    });
    for _ in 0..3 {
        assert!(g.try_dash(Vec2::X));
        g.tick(1.0);
        g.tick(1.0);
    }
    assert_eq!(g.stamina(), 10.0);
    assert!(!g.try_dash(Vec2::X));
}

#[test]
fn stamina_regenerates_up_to_max() {
    let mut g = gate();
    g.try_dash(Vec2::X);
    g.tick(0.25);
    let after_dash = g.stamina();
    assert!(after_dash > 70.0 && after_dash < 100.0);
    g.tick(10.0);
    assert_eq!(g.stamina(), g.max_stamina());
}

#[test]
fn no_regeneration_while_dashing() {
    let mut g = gate();
    g.try_dash(Vec2::X);
    g.tick(0.1);
    assert!(g.is_dashing());
    assert_eq!(g.stamina(), 70.0);
}

// ── Draggable ─────────────────────────────────────────────────────────────────

const TAG: &str = "PlayerButton";

#[test]
fn piece_starts_locked() {
    let mut piece = Draggable::new(TAG, Vec2::ZERO, 0.1);
    assert!(!piece.is_draggable());
    assert_eq!(piece.tag(), TAG);
    assert!(!piece.begin_drag());
}

#[test]
fn idle_unlocks_and_vulnerable_locks() {
    let mut piece = Draggable::new(TAG, Vec2::ZERO, 0.1);
    piece.apply_event(&phase(BossPhase::Idle));
    assert!(piece.is_draggable());
    assert_eq!(piece.tag(), UNTAGGED);

    piece.apply_event(&phase(BossPhase::Vulnerable));
    assert!(!piece.is_draggable());
    assert_eq!(piece.tag(), TAG);
}

#[test]
fn dragging_hides_the_tag_until_release() {
    let mut bus = EventBus::new();
    let mut piece = Draggable::new(TAG, Vec2::ZERO, 0.1);
    piece.apply_event(&phase(BossPhase::Idle));

    assert!(piece.begin_drag());
    assert!(piece.is_dragging());
    assert_eq!(piece.tag(), UNTAGGED);

    piece.drag_to(Vec2::new(4.0, 1.0));
    assert_eq!(piece.end_drag(&mut bus), Some(DragOutcome::Repositioned));
    assert_eq!(piece.tag(), TAG);
    assert_eq!(piece.position, Vec2::new(4.0, 1.0));
    assert_eq!(piece.end_drag(&mut bus), None);
}

#[test]
fn drag_to_is_ignored_when_not_dragging() {
    let mut piece = Draggable::new(TAG, Vec2::ZERO, 0.1);
    piece.drag_to(Vec2::ONE);
    assert_eq!(piece.position, Vec2::ZERO);
}

#[test]
fn clicking_the_fight_piece_requests_the_fight() {
    let mut bus = EventBus::new();
    let requests = bus.subscribe(&[EventTopic::FightTrigger]);
    let mut piece = Draggable::fight_piece(TAG, Vec2::ZERO, 0.1);
    piece.attach(&mut bus);
    bus.publish(phase(BossPhase::Idle));
    piece.sync(&mut bus);

    piece.begin_drag();
    piece.drag_to(Vec2::new(0.05, 0.0));
    assert_eq!(piece.end_drag(&mut bus), Some(DragOutcome::Clicked));
    assert_eq!(bus.poll(requests), vec![EncounterEvent::FightTriggerRequested]);
}

#[test]
fn moving_the_fight_piece_does_not_start_the_fight() {
    let mut bus = EventBus::new();
    let requests = bus.subscribe(&[EventTopic::FightTrigger]);
    let mut piece = Draggable::fight_piece(TAG, Vec2::ZERO, 0.1);
    piece.apply_event(&phase(BossPhase::Idle));

    piece.begin_drag();
    piece.drag_to(Vec2::new(2.0, 0.0));
    piece.end_drag(&mut bus);
    assert!(bus.poll(requests).is_empty());
}

#[test]
fn plain_piece_click_publishes_nothing() {
    let mut bus = EventBus::new();
    let requests = bus.subscribe(&[EventTopic::FightTrigger]);
    let mut piece = Draggable::new(TAG, Vec2::ZERO, 0.1);
    piece.apply_event(&phase(BossPhase::Idle));
    piece.begin_drag();
    assert_eq!(piece.end_drag(&mut bus), Some(DragOutcome::Clicked));
    assert!(bus.poll(requests).is_empty());
}
