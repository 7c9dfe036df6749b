use boss_fight::compute::{degrees_of, direction_from_degrees};
use boss_fight::config::*;
use boss_fight::entities::{ProjectileKind, ProjectileSpawn, Rect};
use boss_fight::pattern::{PatternInstance, PatternOutput};

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const EPS: f32 = 1e-4;

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn close(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < EPS
}

fn shots(outputs: Vec<PatternOutput>) -> Vec<ProjectileSpawn> {
    outputs
        .into_iter()
        .map(|o| match o {
            PatternOutput::Projectile(p) => p,
            PatternOutput::SubPattern(_) => panic!("unexpected sub-pattern"),
        })
        .collect()
}

fn subs(outputs: Vec<PatternOutput>) -> Vec<PatternInstance> {
    outputs
        .into_iter()
        .map(|o| match o {
            PatternOutput::SubPattern(p) => p,
            PatternOutput::Projectile(_) => panic!("unexpected projectile"),
        })
        .collect()
}

/// Run an instant pattern once and return its shots.
fn fire(desc: &PatternDescriptor, player: Option<Vec2>) -> Vec<ProjectileSpawn> {
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(desc, Vec2::ZERO, 1.0, false);
    let out = shots(run.advance(0.0, player, &PatternLibrary::new(), &mut rng));
    assert!(run.is_finished());
    out
}

// ── Shapes ────────────────────────────────────────────────────────────────────

#[test]
fn circle_of_four_fires_at_the_cardinals() {
    let desc = PatternDescriptor::new(PatternShape::Circle {
        bullet_count: 4,
        radius: 0.0,
        start_angle: 0.0,
    });
    let out = fire(&desc, None);
    assert_eq!(out.len(), 4);
    for (shot, angle) in out.iter().zip([0.0, 90.0, 180.0, 270.0]) {
        assert!(close(shot.direction, direction_from_degrees(angle)));
    }
}

#[test]
fn circle_radius_offsets_spawn_points() {
    let desc = PatternDescriptor::new(PatternShape::Circle {
        bullet_count: 2,
        radius: 2.0,
        start_angle: 0.0,
    });
    let out = fire(&desc, None);
    assert!(close(out[0].position, Vec2::new(2.0, 0.0)));
    assert!(close(out[1].position, Vec2::new(-2.0, 0.0)));
}

#[test]
fn shotgun_centres_on_the_player() {
    let desc = PatternDescriptor::new(PatternShape::Shotgun {
        bullet_count: 3,
        spread_angle: 60.0,
        aim: Aim::Player,
    });
    let out = fire(&desc, Some(Vec2::new(5.0, 0.0)));
    assert_eq!(out.len(), 3);
    assert!((degrees_of(out[0].direction) + 30.0).abs() < EPS);
    assert!(close(out[1].direction, Vec2::X));
    assert!((degrees_of(out[2].direction) - 30.0).abs() < EPS);
}

#[test]
fn shotgun_fixed_aim_ignores_the_player() {
    let desc = PatternDescriptor::new(PatternShape::Shotgun {
        bullet_count: 1,
        spread_angle: 90.0,
        aim: Aim::Fixed {
            direction: Vec2::new(0.0, 2.0),
        },
    });
    let out = fire(&desc, Some(Vec2::new(5.0, 0.0)));
    assert!(close(out[0].direction, Vec2::Y));
}

#[test]
fn sniper_aims_within_jitter() {
    let desc = PatternDescriptor::new(PatternShape::Sniper {
        bullet_count: 20,
        jitter: 5.0,
    });
    let out = fire(&desc, Some(Vec2::new(-3.0, 0.0)));
    assert_eq!(out.len(), 20);
    for shot in &out {
        // aim line is 180°, compare through the dot product to dodge wraparound
        let off = shot.direction.dot(Vec2::NEG_X).clamp(-1.0, 1.0).acos().to_degrees();
        assert!(off <= 5.0 + 1e-3, "off by {off}");
    }
}

#[test]
fn sniper_without_player_fires_down() {
    let desc = PatternDescriptor::new(PatternShape::Sniper {
        bullet_count: 1,
        jitter: 0.0,
    });
    let out = fire(&desc, None);
    assert!(close(out[0].direction, Vec2::NEG_Y));
}

#[test]
fn random_spray_fires_unit_vectors() {
    let desc = PatternDescriptor::new(PatternShape::RandomSpray { bullet_count: 30 });
    let out = fire(&desc, None);
    assert_eq!(out.len(), 30);
    assert!(out.iter().all(|s| (s.direction.length() - 1.0).abs() < EPS));
    assert!(out.iter().all(|s| close(s.position, Vec2::ZERO)));
}

#[test]
fn random_rain_falls_from_the_area() {
    let area = Rect::new(Vec2::new(-4.0, 1.0), Vec2::new(4.0, 2.0));
    let desc = PatternDescriptor::new(PatternShape::RandomRain {
        bullet_count: 25,
        area,
    });
    let out = fire(&desc, None);
    for shot in &out {
        assert!(area.contains(shot.position));
        assert!(close(shot.direction, Vec2::NEG_Y));
    }
}

#[test]
fn linear_line_spreads_along_the_segment() {
    let desc = PatternDescriptor::new(PatternShape::LinearLine {
        bullet_count: 3,
        half_width: 4.0,
        vertical_jitter: 0.5,
    });
    let out = fire(&desc, None);
    let xs: Vec<f32> = out.iter().map(|s| s.position.x).collect();
    assert_eq!(xs, vec![-4.0, 0.0, 4.0]);
    for shot in &out {
        assert!(shot.position.y.abs() <= 0.5);
        assert!(close(shot.direction, Vec2::NEG_Y));
    }
}

#[test]
fn custom_shape_direction_rules() {
    let points = vec![
        SpawnPoint {
            offset: Vec2::new(1.0, 0.0),
            rotation: 90.0,
        },
        SpawnPoint {
            offset: Vec2::new(0.0, -2.0),
            rotation: 0.0,
        },
    ];
    let shape = |direction| PatternShape::CustomShape {
        spawn_points: points.clone(),
        direction,
        fixed_direction: Vec2::X,
    };

    // local "up" rotated by the point's rotation
    let out = fire(&PatternDescriptor::new(shape(DirectionRule::SpawnPoint)), None);
    assert!(close(out[0].position, Vec2::new(1.0, 0.0)));
    assert!(close(out[0].direction, Vec2::NEG_X));
    assert!(close(out[1].direction, Vec2::Y));

    let out = fire(&PatternDescriptor::new(shape(DirectionRule::Outward)), None);
    assert!(close(out[0].direction, Vec2::X));
    assert!(close(out[1].direction, Vec2::NEG_Y));

    let out = fire(&PatternDescriptor::new(shape(DirectionRule::Fixed)), None);
    assert!(out.iter().all(|s| close(s.direction, Vec2::X)));
}

#[test]
fn origin_offset_moves_the_pattern() {
    let mut desc = PatternDescriptor::new(PatternShape::RandomSpray { bullet_count: 1 });
    desc.origin_offset = Vec2::new(0.0, -2.0);
    let run = PatternInstance::execute(&desc, Vec2::new(1.0, 5.0), 1.0, false);
    assert!(close(run.origin(), Vec2::new(1.0, 3.0)));
}

// ── Speed modifiers ───────────────────────────────────────────────────────────

#[test]
fn speed_uses_multiplier_and_anger() {
    let desc = PatternDescriptor::new(PatternShape::RandomSpray { bullet_count: 2 })
        .with_speed(4.0)
        .with_projectile(ProjectileKind::Homing);
    let mut rng = seeded_rng();

    let mut calm = PatternInstance::execute(&desc, Vec2::ZERO, 1.0, false);
    let out = shots(calm.advance(0.0, None, &PatternLibrary::new(), &mut rng));
    assert!(out.iter().all(|s| s.speed == 4.0));
    assert!(out.iter().all(|s| s.kind == ProjectileKind::Homing));

    let mut angry = PatternInstance::execute(&desc, Vec2::ZERO, 2.0, true);
    let out = shots(angry.advance(0.0, None, &PatternLibrary::new(), &mut rng));
    assert!(out.iter().all(|s| s.speed == 12.0));
}

// ── Pacing ────────────────────────────────────────────────────────────────────

#[test]
fn zero_interval_fires_everything_at_once() {
    let desc = PatternDescriptor::new(PatternShape::RandomSpray { bullet_count: 7 });
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(&desc, Vec2::ZERO, 1.0, false);
    assert_eq!(run.total(), 7);
    assert!(!run.is_finished());
    assert_eq!(
        run.advance(0.0, None, &PatternLibrary::new(), &mut rng).len(),
        7
    );
    assert!(run.is_finished());
    assert!(run
        .advance(1.0, None, &PatternLibrary::new(), &mut rng)
        .is_empty());
}

#[test]
fn interval_paces_one_shot_per_tick() {
    let desc =
        PatternDescriptor::new(PatternShape::RandomSpray { bullet_count: 3 }).with_interval(0.5);
    let lib = PatternLibrary::new();
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(&desc, Vec2::ZERO, 1.0, false);

    // first shot goes out immediately
    assert_eq!(run.advance(0.0, None, &lib, &mut rng).len(), 1);
    assert_eq!(run.advance(0.25, None, &lib, &mut rng).len(), 0);
    assert_eq!(run.advance(0.25, None, &lib, &mut rng).len(), 1);
    assert_eq!(run.emitted(), 2);
    assert!(!run.is_finished());

    // a long tick catches up but never overshoots the count
    assert_eq!(run.advance(5.0, None, &lib, &mut rng).len(), 1);
    assert!(run.is_finished());
}

#[test]
fn empty_pattern_is_finished_immediately() {
    let desc = PatternDescriptor::new(PatternShape::Circle {
        bullet_count: 0,
        radius: 0.0,
        start_angle: 0.0,
    });
    let run = PatternInstance::execute(&desc, Vec2::ZERO, 1.0, false);
    assert!(run.is_finished());
}

// ── Sequences ────────────────────────────────────────────────────────────────

fn library() -> PatternLibrary {
    let mut lib = PatternLibrary::new();
    lib.insert(
        "ring".into(),
        PatternDescriptor::new(PatternShape::Circle {
            bullet_count: 4,
            radius: 0.0,
            start_angle: 0.0,
        }),
    );
    lib.insert(
        "spray".into(),
        PatternDescriptor::new(PatternShape::RandomSpray { bullet_count: 2 }).with_speed(2.0),
    );
    lib
}

fn sequence(steps: &[(&str, f32)]) -> PatternDescriptor {
    PatternDescriptor::new(PatternShape::Sequence {
        steps: steps
            .iter()
            .map(|(name, delay)| SequenceStep {
                pattern: (*name).into(),
                delay_before: *delay,
            })
            .collect(),
    })
}

#[test]
fn sequence_steps_wait_for_their_delay() {
    let lib = library();
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(&sequence(&[("ring", 0.0), ("spray", 0.5)]), Vec2::ZERO, 1.0, false);

    let first = subs(run.advance(0.0, None, &lib, &mut rng));
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].total(), 4);
    assert!(!run.is_finished());

    assert!(run.advance(0.3, None, &lib, &mut rng).is_empty());
    let second = subs(run.advance(0.3, None, &lib, &mut rng));
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].total(), 2);
    assert!(run.is_finished());
}

#[test]
fn sequence_first_step_delay_applies() {
    let lib = library();
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(&sequence(&[("ring", 1.0)]), Vec2::ZERO, 1.0, false);
    assert!(run.advance(0.0, None, &lib, &mut rng).is_empty());
    assert!(run.advance(0.9, None, &lib, &mut rng).is_empty());
    assert_eq!(run.advance(0.2, None, &lib, &mut rng).len(), 1);
}

#[test]
fn angry_sequence_shortens_delays() {
    let lib = library();
    let mut rng = seeded_rng();
    let mut run =
        PatternInstance::execute(&sequence(&[("ring", 0.0), ("spray", 0.5)]), Vec2::ZERO, 1.0, true);

    assert_eq!(run.advance(0.0, None, &lib, &mut rng).len(), 1);
    // 0.5 × 0.8 = 0.4
    assert!(run.advance(0.35, None, &lib, &mut rng).is_empty());
    assert_eq!(run.advance(0.06, None, &lib, &mut rng).len(), 1);
}

#[test]
fn sub_patterns_inherit_modifiers() {
    let lib = library();
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(&sequence(&[("spray", 0.0)]), Vec2::new(0.0, 3.0), 1.5, true);
    let sub = subs(run.advance(0.0, None, &lib, &mut rng)).remove(0);
    assert!(sub.is_angry());
    // 2.0 × 1.5 × 1.5
    assert!((sub.speed() - 4.5).abs() < EPS);
    assert!(close(sub.origin(), Vec2::new(0.0, 3.0)));
}

#[test]
fn unknown_sequence_step_is_skipped() {
    let lib = library();
    let mut rng = seeded_rng();
    let mut run = PatternInstance::execute(&sequence(&[("ghost", 0.0), ("ring", 0.0)]), Vec2::ZERO, 1.0, false);
    let out = subs(run.advance(0.0, None, &lib, &mut rng));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].total(), 4);
    assert!(run.is_finished());
}
