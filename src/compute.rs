//! Pure encounter-logic functions.
//!
//! Geometry for the bullet patterns and the numeric policy rules of the
//! phase machine.  Nothing in here touches the world; anything random takes
//! an injected RNG so callers control determinism.

use glam::Vec2;
use rand::{Rng, RngCore};

// ── Policy constants ─────────────────────────────────────────────────────────

/// Speed multiplier applied on top of the wave multiplier when the boss is angry.
pub const ANGRY_SPEED_FACTOR: f32 = 1.5;

/// A failed special phase halves the recovery time between waves.
pub const PUNISH_DELAY_FACTOR: f32 = 0.5;

/// Sequences run their steps 20% faster when angry.
pub const ANGRY_SEQUENCE_DELAY_FACTOR: f32 = 0.8;

/// Default sniper spread, in degrees either side of the aim line.
pub const SNIPER_JITTER_DEGREES: f32 = 5.0;

// ── Angles ───────────────────────────────────────────────────────────────────

/// Unit vector for an angle in degrees (0° = +x, counter-clockwise).
pub fn direction_from_degrees(degrees: f32) -> Vec2 {
    let r = degrees.to_radians();
    Vec2::new(r.cos(), r.sin())
}

/// Angle of `v` in degrees.
pub fn degrees_of(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Direction from `from` toward `target`, or straight down when there is no
/// target (or it sits exactly on `from`).
pub fn aim_direction(from: Vec2, target: Option<Vec2>) -> Vec2 {
    target
        .map(|t| (t - from).normalize_or_zero())
        .filter(|d| *d != Vec2::ZERO)
        .unwrap_or(Vec2::NEG_Y)
}

/// Rotate `v` by `degrees`.
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

// ── Pattern geometry ─────────────────────────────────────────────────────────

/// Direction of shot `index` in a ring of `count` shots spaced `360/count`.
pub fn circle_direction(index: usize, count: usize, start_angle: f32) -> Vec2 {
    if count == 0 {
        return direction_from_degrees(start_angle);
    }
    let step = 360.0 / count as f32;
    direction_from_degrees(start_angle + step * index as f32)
}

/// All ring directions at once.
pub fn circle_directions(count: usize, start_angle: f32) -> Vec<Vec2> {
    (0..count)
        .map(|i| circle_direction(i, count, start_angle))
        .collect()
}

/// Direction of shot `index` in a fan of `count` shots covering `spread`
/// degrees centred on `centre`, spaced `spread/(count-1)`.  A single shot
/// goes straight down the centre line.
pub fn fan_direction(index: usize, count: usize, centre: Vec2, spread: f32) -> Vec2 {
    let base = degrees_of(centre);
    if count <= 1 {
        return direction_from_degrees(base);
    }
    let start = base - spread / 2.0;
    let step = spread / (count - 1) as f32;
    direction_from_degrees(start + step * index as f32)
}

/// Aim line with uniform angular jitter in `[-jitter, jitter]` degrees.
pub fn jittered_direction(aim: Vec2, jitter: f32, rng: &mut dyn RngCore) -> Vec2 {
    let offset = if jitter > 0.0 {
        rng.gen_range(-jitter..=jitter)
    } else {
        0.0
    };
    direction_from_degrees(degrees_of(aim) + offset)
}

/// Uniformly random unit vector.
pub fn random_direction(rng: &mut dyn RngCore) -> Vec2 {
    direction_from_degrees(rng.gen_range(0.0..360.0))
}

/// Uniformly random point inside `[min, max]`.
pub fn random_point(min: Vec2, max: Vec2, rng: &mut dyn RngCore) -> Vec2 {
    Vec2::new(
        rng.gen_range(min.x.min(max.x)..=max.x.max(min.x)),
        rng.gen_range(min.y.min(max.y)..=max.y.max(min.y)),
    )
}

/// Horizontal offset of shot `index` on a segment of half-width `half_width`
/// split evenly between `count` shots.  A single shot sits in the middle.
pub fn line_offset(index: usize, count: usize, half_width: f32) -> f32 {
    if count <= 1 {
        return 0.0;
    }
    -half_width + (2.0 * half_width) * index as f32 / (count - 1) as f32
}

// ── Policy rules ─────────────────────────────────────────────────────────────

/// Final projectile speed: base × multiplier, × 1.5 again when angry.
pub fn scaled_speed(base_speed: f32, speed_multiplier: f32, is_angry: bool) -> f32 {
    let speed = base_speed * speed_multiplier;
    if is_angry {
        speed * ANGRY_SPEED_FACTOR
    } else {
        speed
    }
}

/// Delay after a wave: full when the last special phase was blocked,
/// halved when the player failed it.
pub fn post_wave_delay(delay_before_next: f32, was_last_special_blocked: bool) -> f32 {
    if was_last_special_blocked {
        delay_before_next
    } else {
        delay_before_next * PUNISH_DELAY_FACTOR
    }
}

/// Delay before a sequence step.
pub fn sequence_step_delay(delay_before: f32, is_angry: bool) -> f32 {
    if is_angry {
        delay_before * ANGRY_SEQUENCE_DELAY_FACTOR
    } else {
        delay_before
    }
}

/// Index into the wave-tier table: `clamp(max_health - health, 0, tier_count-1)`.
/// `None` when there are no tiers at all.
pub fn tier_index(max_health: u32, health: u32, tier_count: usize) -> Option<usize> {
    if tier_count == 0 {
        return None;
    }
    let lost = max_health.saturating_sub(health) as usize;
    Some(lost.min(tier_count - 1))
}

/// Linear interpolation along a hazard path, `t` clamped to `[0, 1]`.
pub fn lerp_path(start: Vec2, end: Vec2, t: f32) -> Vec2 {
    start.lerp(end, t.clamp(0.0, 1.0))
}
