//! Rendering layer: all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! game.  No game logic is performed; this module only translates world
//! coordinates (y up) into terminal cells (row down) and queues commands.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};
use glam::Vec2;

use boss_fight::compute::degrees_of;
use boss_fight::entities::{BossPhase, ProjectileKind, Rect};
use boss_fight::game::{Game, Status};
use boss_fight::player::DashState;

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD: Color = Color::Yellow;
const C_HUD_HEALTH: Color = Color::Red;
const C_BOSS: Color = Color::Magenta;
const C_BOSS_FLASH: Color = Color::White;
const C_BOSS_LOW: Color = Color::Red;
const C_PLAYER: Color = Color::White;
const C_PLAYER_HURT: Color = Color::DarkRed;
const C_PIECE_FREE: Color = Color::Green;
const C_PIECE_LOCKED: Color = Color::DarkGreen;
const C_MECHANISM: Color = Color::Yellow;
const C_MECHANISM_CLEARED: Color = Color::DarkGrey;
const C_HAZARD: Color = Color::Red;
const C_BULLET_PLAYER: Color = Color::Cyan;
const C_BULLET_ENEMY: Color = Color::Magenta;
const C_MISSILE: Color = Color::DarkYellow;
const C_HINT: Color = Color::DarkGrey;

// ── Viewport ──────────────────────────────────────────────────────────────────

/// Maps the arena onto the terminal area inside the border (rows 2..h-3).
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    arena: Rect,
    width: u16,
    height: u16,
}

impl Viewport {
    pub fn new(arena: Rect, width: u16, height: u16) -> Self {
        Self {
            arena,
            width,
            height,
        }
    }

    fn cols(&self) -> f32 {
        self.width.saturating_sub(3).max(1) as f32
    }

    fn rows(&self) -> f32 {
        self.height.saturating_sub(5).max(1) as f32
    }

    /// Terminal cell for a world point, `None` when it falls outside.
    pub fn cell(&self, p: Vec2) -> Option<(u16, u16)> {
        if !self.arena.contains(p) || self.arena.width() <= 0.0 || self.arena.height() <= 0.0 {
            return None;
        }
        let fx = (p.x - self.arena.min.x) / self.arena.width();
        let fy = (self.arena.max.y - p.y) / self.arena.height();
        let col = 1 + (fx * self.cols()).round() as u16;
        let row = 2 + (fy * self.rows()).round() as u16;
        Some((col, row))
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, view)?;
    draw_hud(out, game, view)?;

    draw_mechanisms(out, game, view)?;
    for (position, radius) in game.world.hazards() {
        draw_explosion(out, view, position, radius)?;
    }
    for (_, projectile) in game.world.projectiles() {
        let glyph = match projectile.kind {
            ProjectileKind::Bullet => ("•", C_BULLET_ENEMY),
            ProjectileKind::Homing => (arrow_for(projectile.velocity), C_MISSILE),
        };
        put(out, view, projectile.position, glyph.0, glyph.1)?;
    }
    for shot in &game.shots {
        put(out, view, *shot, "║", C_BULLET_PLAYER)?;
    }

    draw_boss(out, game, view)?;
    draw_piece(out, game, view)?;
    draw_player(out, game, view)?;
    draw_status_line(out, game, view)?;

    if game.status != Status::Playing {
        draw_game_over(out, game, view)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, view.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

fn put<W: Write>(
    out: &mut W,
    view: &Viewport,
    p: Vec2,
    glyph: &str,
    color: Color,
) -> std::io::Result<()> {
    if let Some((col, row)) = view.cell(p) {
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(color))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

fn arrow_for(velocity: Vec2) -> &'static str {
    const ARROWS: [&str; 8] = ["→", "↗", "↑", "↖", "←", "↙", "↓", "↘"];
    let sector = ((degrees_of(velocity).rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    ARROWS[sector]
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, view: &Viewport) -> std::io::Result<()> {
    let w = view.width as usize;
    let h = view.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    // Row 1: top bar
    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    // Row h-2: bottom bar
    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(view.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    let boss = &game.boss;
    let config = boss.config();

    // Name and health, left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
    let filled = boss.health() as usize;
    let empty = config.max_health.saturating_sub(boss.health()) as usize;
    out.queue(Print(format!(
        "{} [{}{}]",
        config.name,
        "█".repeat(filled),
        "░".repeat(empty)
    )))?;

    // Phase, centre
    let (label, color) = phase_label(boss.phase());
    let phase_str = match boss.phase() {
        BossPhase::Special => format!("[ {} {:>4.1}s ]", label, boss.phase_timer().max(0.0)),
        BossPhase::Vulnerable => format!(
            "[ {} {}/{} ]",
            label,
            boss.hit_count(),
            config.hits_per_damage
        ),
        _ => format!("[ {} ]", label),
    };
    let px = (view.width / 2).saturating_sub(phase_str.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(px, 0))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(&phase_str))?;

    // Player health and stamina, right
    let hearts = "♥".repeat(game.player.health() as usize);
    let ratio = if game.player.max_stamina() > 0.0 {
        game.player.stamina() / game.player.max_stamina()
    } else {
        0.0
    };
    let bar_len = 10usize;
    let bar_fill = ((ratio * bar_len as f32).round() as usize).min(bar_len);
    let right_str = format!(
        "Stamina[{}{}] {}",
        "=".repeat(bar_fill),
        " ".repeat(bar_len - bar_fill),
        hearts
    );
    let rx = view
        .width
        .saturating_sub(right_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD))?;
    out.queue(Print(&right_str))?;

    Ok(())
}

fn phase_label(phase: BossPhase) -> (&'static str, Color) {
    match phase {
        BossPhase::Idle => ("READY", Color::Green),
        BossPhase::Special => ("SPECIAL", Color::Yellow),
        BossPhase::Attacking => ("ATTACK", Color::Red),
        BossPhase::WaitingForBullets => ("INCOMING", Color::DarkYellow),
        BossPhase::Vulnerable => ("VULNERABLE", Color::Cyan),
    }
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_boss<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    //  ╔◆╗   ← body
    //  ╚▼╝   ← gun
    let color = if game.flash > 0.0 {
        C_BOSS_FLASH
    } else if game.boss.is_low_health() {
        C_BOSS_LOW
    } else {
        C_BOSS
    };
    let Some((col, row)) = view.cell(game.boss.position()) else {
        return Ok(());
    };
    out.queue(style::SetForegroundColor(color))?;
    out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row))?;
    out.queue(Print("╔◆╗"))?;
    if row + 1 < view.height.saturating_sub(2) {
        out.queue(cursor::MoveTo(col.saturating_sub(1).max(1), row + 1))?;
        out.queue(Print("╚▼╝"))?;
    }
    Ok(())
}

fn draw_mechanisms<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    for (_, mechanism) in game.boss.mechanisms() {
        let color = if mechanism.is_cleared() {
            C_MECHANISM_CLEARED
        } else {
            C_MECHANISM
        };
        put(out, view, mechanism.position(), "◎", color)?;
        if let Some(mover) = mechanism.hazard_mover() {
            put(out, view, mover, "✸", C_HAZARD)?;
        }
    }
    Ok(())
}

fn draw_explosion<W: Write>(
    out: &mut W,
    view: &Viewport,
    centre: Vec2,
    radius: f32,
) -> std::io::Result<()> {
    put(out, view, centre, "✹", C_HAZARD)?;
    for dir in [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y] {
        put(out, view, centre + dir * radius, "*", C_HAZARD)?;
    }
    Ok(())
}

fn draw_piece<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    let color = if game.piece.is_draggable() {
        C_PIECE_FREE
    } else {
        C_PIECE_LOCKED
    };
    let glyph = if game.is_carrying() { "▣" } else { "■" };
    put(out, view, game.piece.position, glyph, color)
}

fn draw_player<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    let color = if game.player.is_invincible() {
        C_PLAYER_HURT
    } else {
        C_PLAYER
    };
    let glyph = match game.player.dash() {
        DashState::Dashing { .. } => "△",
        _ => "▲",
    };
    put(out, view, game.player_position, glyph, color)
}

// ── Status line (last row) ────────────────────────────────────────────────────

fn draw_status_line<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, view.height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    let hint = match game.boss.phase() {
        BossPhase::Idle => "Carry ■ with E, drop it in place to start the fight",
        BossPhase::Special => "Drop ■ on every ◎ before the timer runs out",
        BossPhase::Vulnerable => "SPACE : Shoot the boss!",
        _ => "Dodge!  SHIFT : Dash",
    };
    out.queue(Print(format!(
        "{}   ARROWS / WASD : Move   Q : Quit",
        hint
    )))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(out: &mut W, game: &Game, view: &Viewport) -> std::io::Result<()> {
    let (title, color) = match game.status {
        Status::Won => ("║   BOSS DEFEATED    ║", Color::Green),
        _ => ("║    GAME  OVER      ║", Color::Red),
    };
    let lines = [
        "╔════════════════════╗",
        title,
        "╚════════════════════╝",
    ];

    let cx = view.width / 2;
    let total_rows = lines.len() + 1;
    let start_row = (view.height / 2).saturating_sub(total_rows as u16 / 2);

    out.queue(style::SetForegroundColor(color))?;
    for (i, msg) in lines.iter().enumerate() {
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, start_row + i as u16))?;
        out.queue(Print(*msg))?;
    }

    let hint = "R - Fight Again  Q - Quit";
    let col = cx.saturating_sub(hint.chars().count() as u16 / 2);
    out.queue(cursor::MoveTo(col, start_row + lines.len() as u16))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print(hint))?;

    Ok(())
}
