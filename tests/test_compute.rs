use boss_fight::compute::*;

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

// ── Angles ────────────────────────────────────────────────────────────────────

#[test]
fn direction_from_degrees_cardinals() {
    assert!(close(direction_from_degrees(0.0), Vec2::X));
    assert!(close(direction_from_degrees(90.0), Vec2::Y));
    assert!(close(direction_from_degrees(180.0), Vec2::NEG_X));
    assert!(close(direction_from_degrees(270.0), Vec2::NEG_Y));
}

#[test]
fn degrees_of_inverts_direction_from_degrees() {
    for angle in [-170.0_f32, -45.0, 0.0, 30.0, 135.0] {
        assert!((degrees_of(direction_from_degrees(angle)) - angle).abs() < EPS);
    }
}

#[test]
fn aim_direction_points_at_target() {
    let d = aim_direction(Vec2::ZERO, Some(Vec2::new(3.0, 4.0)));
    assert!(close(d, Vec2::new(0.6, 0.8)));
}

#[test]
fn aim_direction_defaults_down_without_target() {
    assert!(close(aim_direction(Vec2::ONE, None), Vec2::NEG_Y));
    // target on top of the origin is no direction at all
    assert!(close(aim_direction(Vec2::ONE, Some(Vec2::ONE)), Vec2::NEG_Y));
}

#[test]
fn rotate_degrees_quarter_turn() {
    assert!(close(rotate_degrees(Vec2::Y, 90.0), Vec2::NEG_X));
    assert!(close(rotate_degrees(Vec2::X, -90.0), Vec2::NEG_Y));
}

// ── Pattern geometry ─────────────────────────────────────────────────────────

#[test]
fn circle_of_four_hits_the_cardinals() {
    let dirs = circle_directions(4, 0.0);
    assert_eq!(dirs.len(), 4);
    assert!(close(dirs[0], Vec2::X));
    assert!(close(dirs[1], Vec2::Y));
    assert!(close(dirs[2], Vec2::NEG_X));
    assert!(close(dirs[3], Vec2::NEG_Y));
}

#[test]
fn circle_start_angle_rotates_the_ring() {
    let dirs = circle_directions(2, 90.0);
    assert!(close(dirs[0], Vec2::Y));
    assert!(close(dirs[1], Vec2::NEG_Y));
}

#[test]
fn fan_spans_the_spread_evenly() {
    // 3 shots over 90° centred on straight down: 225°, 270°, 315°
    let centre = Vec2::NEG_Y;
    let a = fan_direction(0, 3, centre, 90.0);
    let b = fan_direction(1, 3, centre, 90.0);
    let c = fan_direction(2, 3, centre, 90.0);
    assert!(close(a, direction_from_degrees(225.0)));
    assert!(close(b, Vec2::NEG_Y));
    assert!(close(c, direction_from_degrees(315.0)));
}

#[test]
fn fan_single_shot_goes_down_the_centre() {
    let centre = Vec2::new(1.0, 1.0).normalize();
    assert!(close(fan_direction(0, 1, centre, 120.0), centre));
}

#[test]
fn jitter_stays_within_bounds() {
    let mut rng = seeded_rng();
    let aim = Vec2::NEG_Y;
    for _ in 0..200 {
        let d = jittered_direction(aim, SNIPER_JITTER_DEGREES, &mut rng);
        let off = degrees_of(d) - degrees_of(aim);
        assert!(off.abs() <= SNIPER_JITTER_DEGREES + EPS, "offset {off}");
        assert!((d.length() - 1.0).abs() < EPS);
    }
}

#[test]
fn zero_jitter_is_exact() {
    let mut rng = seeded_rng();
    assert!(close(jittered_direction(Vec2::X, 0.0, &mut rng), Vec2::X));
}

#[test]
fn random_point_stays_in_rectangle() {
    let mut rng = seeded_rng();
    let (min, max) = (Vec2::new(-2.0, 1.0), Vec2::new(3.0, 4.0));
    for _ in 0..200 {
        let p = random_point(min, max, &mut rng);
        assert!(p.x >= min.x && p.x <= max.x);
        assert!(p.y >= min.y && p.y <= max.y);
    }
}

#[test]
fn random_point_degenerate_rectangle() {
    let mut rng = seeded_rng();
    let p = random_point(Vec2::ONE, Vec2::ONE, &mut rng);
    assert!(close(p, Vec2::ONE));
}

#[test]
fn line_offsets_cover_the_segment() {
    assert_eq!(line_offset(0, 5, 2.0), -2.0);
    assert_eq!(line_offset(2, 5, 2.0), 0.0);
    assert_eq!(line_offset(4, 5, 2.0), 2.0);
    assert_eq!(line_offset(0, 1, 2.0), 0.0);
}

// ── Policy rules ──────────────────────────────────────────────────────────────

#[test]
fn speed_scales_by_multiplier_then_anger() {
    assert_eq!(scaled_speed(4.0, 1.0, false), 4.0);
    assert_eq!(scaled_speed(4.0, 2.0, false), 8.0);
    assert_eq!(scaled_speed(4.0, 1.0, true), 6.0);
    assert_eq!(scaled_speed(4.0, 2.0, true), 12.0);
}

#[test]
fn failed_special_halves_post_wave_delay() {
    assert_eq!(post_wave_delay(1.0, true), 1.0);
    assert_eq!(post_wave_delay(1.0, false), 0.5);
}

#[test]
fn angry_sequences_step_faster() {
    assert_eq!(sequence_step_delay(1.0, false), 1.0);
    assert!((sequence_step_delay(1.0, true) - 0.8).abs() < EPS);
}

#[test]
fn tier_index_full_health_is_first_tier() {
    assert_eq!(tier_index(6, 6, 3), Some(0));
}

#[test]
fn tier_index_tracks_health_lost() {
    assert_eq!(tier_index(6, 5, 3), Some(1));
    assert_eq!(tier_index(6, 4, 3), Some(2));
}

#[test]
fn tier_index_clamps_to_last_tier() {
    assert_eq!(tier_index(6, 1, 3), Some(2));
    assert_eq!(tier_index(6, 0, 3), Some(2));
}

#[test]
fn tier_index_health_above_max_clamps_to_zero() {
    assert_eq!(tier_index(3, 5, 2), Some(0));
}

#[test]
fn tier_index_without_tiers() {
    assert_eq!(tier_index(6, 3, 0), None);
}

#[test]
fn lerp_path_clamps_progress() {
    let (a, b) = (Vec2::ZERO, Vec2::new(4.0, 0.0));
    assert!(close(lerp_path(a, b, 0.5), Vec2::new(2.0, 0.0)));
    assert!(close(lerp_path(a, b, -1.0), a));
    assert!(close(lerp_path(a, b, 3.0), b));
}
