use clap::Args;
use focusbell_core::timer::TICK_INTERVAL;
use focusbell_core::{
    Config, Dispatcher, SessionEngine, SharedSettings, SoundPlayer, SystemClock,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::backend::{self, BackendKind};
use crate::render::Output;
use crate::visual::TerminalNotifier;

/// A wakeup this much later than requested means the process was throttled
/// or suspended.
const THROTTLE_GAP: Duration = Duration::from_secs(2);

const HELP: &str = "\
commands:
  s, start           start the current session
  p, pause           pause the countdown
  r, resume          resume a paused countdown
  x, stop            stop and return to an idle work session
  reset              stop and clear the completed count
  status             print the current state
  set <key> <value>  change a config value (e.g. set sound.volume 80)
  h, help            show this help
  q, quit            exit";

#[derive(Args)]
pub struct RunArgs {
    /// Print events as JSON lines instead of a live countdown
    #[arg(long)]
    json: bool,
    /// Hide the countdown during work sessions
    #[arg(long)]
    blind: bool,
    /// Audio output used for notification sounds
    #[arg(long, value_enum, default_value_t = BackendKind::Bell)]
    backend: BackendKind,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(args))
}

async fn drive(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    let settings = Arc::new(SharedSettings::new(config.settings()));

    let player = Arc::new(SoundPlayer::new(
        backend::factory(args.backend),
        settings.clone(),
    ));
    let dispatcher =
        Dispatcher::new(Arc::clone(&player)).with_visual(Arc::new(TerminalNotifier));
    dispatcher.request_permission_at_startup();

    let mut engine = SessionEngine::new(
        Arc::new(SystemClock),
        settings.clone(),
        Arc::new(dispatcher),
    );
    let mut out = Output::new(args.json, args.blind);
    out.message(HELP);
    out.snapshot(&engine.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let wait = engine.next_wakeup().map(|d| d.min(TICK_INTERVAL));
        let slept_at = Instant::now();

        tokio::select! {
            _ = sleep_for(wait) => {
                let event = if is_late(wait, slept_at.elapsed()) {
                    engine.recover_foreground()
                } else {
                    engine.tick()
                };
                if let Some(event) = event {
                    out.event(&event);
                }
                out.progress(&engine.snapshot());
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                // Typing is the only gesture a terminal gets.
                player.on_user_gesture();
                match handle_line(line.trim(), &mut engine, &mut config, &settings, &mut out) {
                    Flow::Continue => {}
                    Flow::Quit => break,
                }
            }
        }
    }

    info!(completed_work = engine.completed_work(), "session driver exiting");
    Ok(())
}

/// Whether a wakeup after sleeping `slept` for a `requested` wait means the
/// process was throttled. An idle wait (`None`) is never late.
fn is_late(requested: Option<Duration>, slept: Duration) -> bool {
    match requested {
        Some(wait) => slept > wait + THROTTLE_GAP,
        None => false,
    }
}

async fn sleep_for(wait: Option<Duration>) {
    match wait {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending::<()>().await,
    }
}

fn handle_line(
    line: &str,
    engine: &mut SessionEngine,
    config: &mut Config,
    settings: &SharedSettings,
    out: &mut Output,
) -> Flow {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Flow::Continue;
    };

    let event = match command {
        "s" | "start" => engine.start(),
        "p" | "pause" => engine.pause(),
        "r" | "resume" => engine.resume(),
        "x" | "stop" => engine.stop(),
        "reset" => engine.reset(),
        "status" => {
            out.snapshot(&engine.snapshot());
            return Flow::Continue;
        }
        "set" => {
            let (Some(key), Some(value)) = (words.next(), words.next()) else {
                eprintln!("usage: set <key> <value>");
                return Flow::Continue;
            };
            match apply_setting(config, key, value) {
                Ok(()) => {
                    settings.replace(config.settings());
                    out.message(&format!("{key} = {value}"));
                }
                Err(e) => eprintln!("error: {e}"),
            }
            return Flow::Continue;
        }
        "h" | "help" | "?" => {
            out.message(HELP);
            return Flow::Continue;
        }
        "q" | "quit" | "exit" => return Flow::Quit,
        other => {
            eprintln!("unknown command: {other} (try `help`)");
            return Flow::Continue;
        }
    };

    match event {
        Some(event) => out.event(&event),
        None => out.message("nothing to do"),
    }
    Flow::Continue
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<(), focusbell_core::ConfigError> {
    config.set(key, value)?;
    tokio::task::block_in_place(|| config.save())
}
