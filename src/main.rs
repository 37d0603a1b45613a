//! Heightmap Roll headless runner
//!
//! Plays through a level pack without a window: menus are driven with
//! simulated clicks and each ball is steered at its finish zone.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use glam::Vec2;

use heightmap_roll::camera::player_viewport;
use heightmap_roll::input::Autopilot;
use heightmap_roll::session::{PlayerCount, PlayerId};
use heightmap_roll::ui::{Menu, PointerState};
use heightmap_roll::{
    FrameInput, GamePhase, LevelPack, LevelSource, MenuTarget, PhysicsPreset, Session, SessionEvent,
    Settings,
};

/// Fixed timestep
const FRAME_DT: f32 = 1.0 / 60.0;
const SCREEN: Vec2 = Vec2::new(1280.0, 720.0);

#[derive(Parser, Debug)]
#[command(name = "heightmap-roll")]
#[command(about = "Headless autopilot run through a heightmap roll level pack")]
struct Cli {
    /// Number of players (1 or 2)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    players: u8,
    /// Frame limit for the whole run
    #[arg(long, default_value_t = 36_000)]
    frames: u32,
    /// Settings JSON; defaults apply when the file is missing
    #[arg(long, default_value = "heightmap_roll.json")]
    settings: PathBuf,
    /// Level pack JSON, overriding the settings file
    #[arg(long)]
    levels: Option<PathBuf>,
    /// Physics preset (classic, floaty, heavy)
    #[arg(long)]
    preset: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.settings);
    if let Some(name) = &cli.preset {
        let preset =
            PhysicsPreset::from_str(name).ok_or_else(|| anyhow!("unknown physics preset '{name}'"))?;
        settings.physics.apply_preset(preset);
        log::info!("Using {} physics", preset.as_str());
    }

    let pack = match cli.levels.as_ref().or(settings.level_pack.as_ref()) {
        Some(path) => LevelPack::load_from(path)
            .with_context(|| format!("loading level pack {}", path.display()))?,
        None => LevelPack::classic(),
    };
    let level_count = pack.level_count();
    let mut session = Session::new(pack, settings.physics.clone());

    let (players, start) = if cli.players == 2 {
        (PlayerCount::Two, MenuTarget::TwoPlayer)
    } else {
        (PlayerCount::One, MenuTarget::OnePlayer)
    };
    let mut clock = 0.0;
    click(&mut session, MenuTarget::PlayerSelect, clock)?;
    click(&mut session, start, clock)?;

    let mut pilots = [Autopilot::new(), Autopilot::new()];
    let mut frame = 0;
    while frame < cli.frames {
        match session.phase() {
            GamePhase::InGame { .. } => {
                let Some(level) = session.level() else {
                    break;
                };
                let target = level.finish.center();
                let mut input = FrameInput::default();
                for (i, slot) in session.players().iter().enumerate() {
                    input.players[i] = pilots[i].drive(&slot.ball, target, session.settings());
                }
                for event in session.update(&input, FRAME_DT)? {
                    report(&event);
                }
                frame += 1;
                clock += f64::from(FRAME_DT);
            }
            GamePhase::BetweenLevels { .. } => {
                log_cameras(&session, &settings, players);
                for player in PlayerId::ALL {
                    for event in session.confirm_ready(player) {
                        report(&event);
                    }
                }
            }
            _ => break,
        }
    }

    let reached = session.level_index() + 1;
    if matches!(session.phase(), GamePhase::InGame { .. }) {
        log::warn!("Frame limit reached on level {reached} of {level_count}");
    }
    for (i, slot) in session.players().iter().enumerate() {
        println!(
            "player {}: {:.2}s total, {}",
            i + 1,
            slot.total_time,
            if slot.finished { "finished" } else { "still rolling" }
        );
    }
    println!("reached level {reached} of {level_count} in {frame} frames");

    if session.phase() != GamePhase::Finish {
        let exit = FrameInput {
            exit: true,
            ..Default::default()
        };
        for event in session.update(&exit, FRAME_DT)? {
            report(&event);
        }
    }
    click(&mut session, MenuTarget::Exit, clock)?;
    Ok(())
}

/// Press and release the mouse over `target` on the current menu screen
fn click<S: LevelSource>(session: &mut Session<S>, target: MenuTarget, now: f64) -> Result<()> {
    let phase = session.phase();
    let mut menu =
        Menu::for_phase(phase, SCREEN).ok_or_else(|| anyhow!("no menu in {}", phase.as_str()))?;
    let position = menu
        .button(target)
        .ok_or_else(|| anyhow!("no {target:?} button in {}", phase.as_str()))?
        .rect
        .center();

    menu.update(
        PointerState {
            position,
            pressed: true,
        },
        None,
        now,
    );
    let released = PointerState {
        position,
        pressed: false,
    };
    if let Some(activated) = menu.update(released, None, now) {
        for event in session.activate(activated)? {
            report(&event);
        }
    }
    Ok(())
}

fn log_cameras<S: LevelSource>(session: &Session<S>, settings: &Settings, players: PlayerCount) {
    let Some(level) = session.level() else {
        return;
    };
    for (ball, player) in session.balls().zip(PlayerId::ALL) {
        let view = settings.camera.view(ball, &level.terrain);
        let viewport = player_viewport(player, players, SCREEN.x as u32, SCREEN.y as u32);
        log::debug!(
            "{player:?} camera at {:?} looking at {:?} in {}x{} viewport",
            view.eye,
            view.target,
            viewport.width,
            viewport.height
        );
    }
}

fn report(event: &SessionEvent) {
    match event {
        SessionEvent::PhaseChanged { .. } => {}
        SessionEvent::LevelStarted { level } => log::info!("Level {} started", level + 1),
        SessionEvent::PlayerFinished {
            player,
            level,
            time,
        } => println!("{player:?} cleared level {} in {time:.2}s", level + 1),
        SessionEvent::LevelComplete { level } => log::info!("Level {} complete", level + 1),
        SessionEvent::GameFinished => println!("all levels cleared"),
    }
}
