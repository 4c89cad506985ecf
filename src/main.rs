//! The server's entrypoint file.
mod args;
mod commands;
mod config;
mod consts;
mod fs_manager;
mod logging;
mod player;
mod region_parser;
mod reset;
mod server;
mod zone;

use std::sync::Arc;

use log::{error, info, warn};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use commands::ConsoleFlow;
use config::Settings;
use consts::messages;
use reset::ResetPipeline;
use server::Server;
use zone::registry::ZoneRegistry;

#[tokio::main]
async fn main() {
    let args = args::init();

    // This must executes as early as possible
    logging::init(args.log_level);

    info!("{}", *messages::SERVER_STARTING);

    let settings = match Settings::from_args(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to start the server, invalid configuration: {e}. \nExiting...");
            gracefully_exit(ExitCode::Failure);
        }
    };

    let (interrupts_tx, interrupts) = mpsc::unbounded_channel();
    if let Err(e) = init(&settings, interrupts_tx) {
        error!("Failed to start the server, error in initialization: {e}. \nExiting...");
        gracefully_exit(ExitCode::Failure);
    }

    let exit_code = start(settings, interrupts).await;

    gracefully_exit(exit_code);
}

/// Essential server initialization logic.
fn init(
    settings: &Settings,
    interrupts: mpsc::UnboundedSender<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Adds custom behavior to CTRL + C signal
    init_ctrlc_handler(interrupts)?;

    // Makes sure server files are initialized and valid.
    fs_manager::init(settings)?;

    info!(
        "World directory: {}, zone store: {}",
        settings.world_dir.display(),
        settings.zone_store.display()
    );
    Ok(())
}

/// Runs the main loop until `stop` or Ctrl+C. Neither interrupts a running reset.
async fn start(settings: Settings, mut interrupts: mpsc::UnboundedReceiver<()>) -> ExitCode {
    let registry = Arc::new(RwLock::new(ZoneRegistry::load(&settings.zone_store)));
    let zone_count: usize = registry.read().all_zones().values().map(Vec::len).sum();
    info!("Loaded {zone_count} protected zones");

    let mut server = Server::new(settings.clone(), Arc::clone(&registry));
    let resets = Arc::new(ResetPipeline::new(settings, registry, server.handle()));

    let mut console = commands::listen_console_commands();
    let mut console_open = true;
    let mut ticks = tokio::time::interval(server.settings().tick_interval);
    ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut interrupted = false;
    info!("{}", *messages::SERVER_STARTED);
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                server.tick();
                if interrupted && !resets.is_running() {
                    break;
                }
            }
            Some(()) = interrupts.recv() => {
                if !resets.is_running() {
                    interrupted = true;
                    break;
                }
                if !interrupted {
                    warn!("A dimension reset is still running, the server will stop once it finishes");
                }
                interrupted = true;
            }
            line = console.recv(), if console_open => match line {
                Some(line) => {
                    if commands::handle_line(&line, &mut server, &resets) == ConsoleFlow::Stop {
                        warn!("Server will stop in few second…");
                        break;
                    }
                }
                None => {
                    console_open = false;
                    info!("Console closed, the server keeps running until Ctrl+C");
                }
            },
        }
    }

    // Answer requests queued since the last tick.
    server.run_scheduled_tasks();

    if interrupted {
        ExitCode::CtrlC
    } else {
        ExitCode::Success
    }
}

/// Sets up a behavior when the user executes CTRL + C.
///
/// The main loop decides when to stop. Once it is gone, Ctrl+C exits right away.
fn init_ctrlc_handler(interrupts: mpsc::UnboundedSender<()>) -> Result<(), Box<dyn std::error::Error>> {
    ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down...");
        if interrupts.send(()).is_err() {
            gracefully_exit(ExitCode::CtrlC);
        }
    })?;

    Ok(())
}

/// Enum representing standardized server exit codes.
pub enum ExitCode {
    Success,
    Failure,
    CtrlC,
}

/// Gracefully exits the server with an exit code.
pub fn gracefully_exit(exit_code: ExitCode) -> ! {
    let numerical_exit_code: i32 = match exit_code {
        ExitCode::Success => {
            info!("{}", *messages::SERVER_SHUTDOWN_SUCCESS);
            // 0 means success
            0
        }
        ExitCode::Failure => {
            warn!("{}", *messages::SERVER_SHUTDOWN_ERROR);
            // 1 mean general error
            1
        }
        ExitCode::CtrlC => {
            info!("{}", *messages::SERVER_SHUTDOWN_CTRL_C);
            // 130 mean script terminated by Ctrl+C
            130
        }
    };

    std::process::exit(numerical_exit_code);
}
