mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        ModifierKeyCode, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use glam::Vec2;
use tracing_subscriber::EnvFilter;

use boss_fight::config::FightConfig;
use boss_fight::game::{Game, Input, Status};

use display::Viewport;

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS

/// Min frames between shots while Space is held.
const SHOOT_COOLDOWN: u32 = 4;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 4 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 4;

#[derive(Parser, Debug)]
#[command(name = "boss_fight", about = "Terminal bullet-hell boss fight")]
struct Args {
    /// Fight configuration (TOML).  The built-in boss is used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for patterns and mechanism placement.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where log output goes; the terminal is busy drawing the game.
    #[arg(long, default_value = "boss_fight.log")]
    log_file: PathBuf,
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

// ── Title screen ──────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_title<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &FightConfig,
) -> io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = format!("◆  {}  ◆", config.boss.name.to_uppercase());
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(6),
    ))?;
    out.queue(style::SetForegroundColor(Color::Magenta))?;
    out.queue(Print(&title))?;

    let rules: &[(&str, Color)] = &[
        ("Carry the ■ piece and drop it in place to start.", Color::Green),
        ("Clear every ◎ before the special timer ends.", Color::Yellow),
        ("Fail and the next barrage comes angrier.", Color::Red),
        ("Shoot the boss while it is VULNERABLE.", Color::Cyan),
    ];
    for (i, (line, color)) in rules.iter().enumerate() {
        out.queue(cursor::MoveTo(cx.saturating_sub(24), cy.saturating_sub(3) + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*line))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(24), cy + 2))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print(
        "ARROWS / WASD : Move   SPACE : Shoot   E : Pick up / Drop   SHIFT : Dash",
    ))?;

    out.queue(cursor::MoveTo(cx.saturating_sub(24), cy + 4))?;
    out.queue(style::SetForegroundColor(Color::White))?;
    out.queue(Print("[ENTER] Fight   [Q] Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the user makes a choice
    loop {
        if let Ok(Event::Key(KeyEvent { code, kind, .. })) = rx.recv() {
            if kind != KeyEventKind::Press {
                continue;
            }
            match code {
                KeyCode::Enter | KeyCode::Char(' ') => return Ok(MenuResult::Start),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            }
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Returns `true` → quit program,  `false` → back to the title screen.
///
/// Held keys are tracked in `key_frame` (frame of the last press/repeat) so
/// moving, shooting and dashing can all happen in the same frame.  One-shot
/// actions (pick up / drop, dash) fire on the press event itself.
fn game_loop<W: Write>(
    out: &mut W,
    game: &mut Game,
    rx: &mpsc::Receiver<Event>,
) -> io::Result<bool> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut shoot_cooldown: u32 = 0;
    let mut frame: u64 = 0;
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;

        let mut interact = false;
        let mut dash = false;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent {
            code,
            kind,
            modifiers,
            ..
        })) = rx.try_recv()
        {
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(normalize(code), frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(true);
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(true);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R')
                            if game.status != Status::Playing =>
                        {
                            return Ok(false);
                        }
                        KeyCode::Char('e') | KeyCode::Char('E') => interact = true,
                        KeyCode::Modifier(
                            ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift,
                        ) => dash = true,
                        _ => {}
                    }
                    // Classic terminals only report Shift as a modifier.
                    if modifiers.contains(KeyModifiers::SHIFT) {
                        dash = true;
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(normalize(code), frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&normalize(code));
                }
            }
        }

        // ── Apply held-key actions every frame ────────────────────────────────
        let mut movement = Vec2::ZERO;
        if any_held(&key_frame, &[KeyCode::Left, KeyCode::Char('a')], frame) {
            movement.x -= 1.0;
        }
        if any_held(&key_frame, &[KeyCode::Right, KeyCode::Char('d')], frame) {
            movement.x += 1.0;
        }
        if any_held(&key_frame, &[KeyCode::Up, KeyCode::Char('w')], frame) {
            movement.y += 1.0;
        }
        if any_held(&key_frame, &[KeyCode::Down, KeyCode::Char('s')], frame) {
            movement.y -= 1.0;
        }

        let shoot = shoot_cooldown == 0 && is_held(&key_frame, &KeyCode::Char(' '), frame);
        if shoot {
            shoot_cooldown = SHOOT_COOLDOWN;
        }
        shoot_cooldown = shoot_cooldown.saturating_sub(1);

        let now = Instant::now();
        // A stalled terminal must not teleport everything forward.
        let dt = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;

        game.step(
            &Input {
                movement,
                shoot,
                dash,
                interact,
            },
            dt,
        );

        let (width, height) = terminal::size()?;
        let view = Viewport::new(game.boss.config().arena, width, height);
        display::render(out, game, &view)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

/// Fold shifted letters onto their lowercase key so held-key lookups match.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    let config = match &args.config {
        Some(path) => FightConfig::load(path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        None => FightConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(boss = %config.boss.name, seed, "starting");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Ghostty / kitty-protocol terminals report releases; others fall back.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &config, seed);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &FightConfig,
    seed: u64,
) -> io::Result<()> {
    let mut round: u64 = 0;
    loop {
        match show_title(out, rx, config)? {
            MenuResult::Quit => break,
            MenuResult::Start => {
                let mut game = Game::new(config.clone(), seed.wrapping_add(round));
                round += 1;
                if game_loop(out, &mut game, rx)? {
                    break;
                }
            }
        }
    }
    tracing::info!("bye");
    Ok(())
}
