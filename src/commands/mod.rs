//! Console commands. Lines arrive from [`listen_console_commands`] and run on the main loop.
pub mod command_line;
pub mod softborder;

use std::sync::Arc;

use log::{error, info, warn};
use uuid::Uuid;

use crate::config::normalize_dimension;
use crate::consts::dimensions;
use crate::player::OnlinePlayer;
use crate::reset::ResetPipeline;
use crate::server::{MainHandle, Server};
use softborder::{CommandOutput, CommandSource};

pub use command_line::listen_console_commands;

const HELP: &[&str] = &[
    "Available commands:",
    "  softborder <create|remove|list|info|reset> ...  - manage protected zones",
    "  join <name> [dimension] [x z]                   - connect a simulated player",
    "  tp <name> <x> <z> [dimension]                   - move a player",
    "  quit <name>                                      - disconnect a player",
    "  op <name> [level]                                - set a player's permission level",
    "  sudo <name> <command...>                        - run a command as a player",
    "  players                                          - list connected players",
    "  stop                                             - stop the server",
];

/// What the main loop does after a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFlow {
    Continue,
    Stop,
}

/// Runs one console line against the server.
pub fn handle_line(line: &str, server: &mut Server, resets: &Arc<ResetPipeline>) -> ConsoleFlow {
    let args = match softborder::tokenize(line) {
        Ok(args) => args,
        Err(e) => {
            warn!("{e}");
            return ConsoleFlow::Continue;
        }
    };
    let Some((command, rest)) = args.split_first() else {
        return ConsoleFlow::Continue;
    };

    let result = match command.to_lowercase().as_str() {
        "stop" if resets.is_running() => {
            Err("A dimension reset is still running, try again once it finishes".to_string())
        }
        "stop" => return ConsoleFlow::Stop,
        "help" => {
            HELP.iter().for_each(|line| info!("{line}"));
            Ok(())
        }
        "players" => {
            list_players(server);
            Ok(())
        }
        "join" => join(server, rest),
        "tp" => teleport(server, rest),
        "quit" => match rest {
            [name] => server.quit(name),
            _ => Err("Usage: quit <name>".to_string()),
        },
        "op" => op(server, rest),
        "sudo" => sudo(server, resets, rest),
        softborder::ROOT => {
            run_softborder(server, resets, CommandSource::console(), rest);
            Ok(())
        }
        other => Err(format!("Unknown command: {other}. Type 'help' for a list.")),
    };

    if let Err(e) = result {
        warn!("{e}");
    }
    ConsoleFlow::Continue
}

fn list_players(server: &Server) {
    let players = server.players();
    info!("There are {} players online", players.len());
    for player in players {
        info!(
            "  {} in {} at ({:.1}, {:.1}), chunk {}, zone {}, permission level {}",
            player.name,
            player.dimension,
            player.x,
            player.z,
            player.chunk(),
            server
                .current_zone(player.uuid)
                .unwrap_or_else(|| "none".to_string()),
            player.permission_level
        );
    }
}

fn parse_coordinate(input: &str) -> Result<f64, String> {
    input
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("Invalid coordinate: {input}"))
}

fn join(server: &mut Server, args: &[String]) -> Result<(), String> {
    const USAGE: &str = "Usage: join <name> [dimension] [x z]";
    let (name, rest) = args.split_first().ok_or(USAGE)?;
    let (dimension, x, z) = match rest {
        [] => (dimensions::OVERWORLD.to_string(), "0", "0"),
        [dimension] => (normalize_dimension(dimension), "0", "0"),
        [x, z] => (dimensions::OVERWORLD.to_string(), x.as_str(), z.as_str()),
        [dimension, x, z] => (normalize_dimension(dimension), x.as_str(), z.as_str()),
        _ => return Err(USAGE.to_string()),
    };
    server.join(OnlinePlayer::new(
        name.clone(),
        dimension,
        parse_coordinate(x)?,
        parse_coordinate(z)?,
    ))
}

fn teleport(server: &mut Server, args: &[String]) -> Result<(), String> {
    match args {
        [name, x, z] => server.teleport(name, parse_coordinate(x)?, parse_coordinate(z)?, None),
        [name, x, z, dimension] => server.teleport(
            name,
            parse_coordinate(x)?,
            parse_coordinate(z)?,
            Some(normalize_dimension(dimension)),
        ),
        _ => Err("Usage: tp <name> <x> <z> [dimension]".to_string()),
    }
}

fn op(server: &mut Server, args: &[String]) -> Result<(), String> {
    let (name, level) = match args {
        [name] => (name, softborder::CONSOLE_PERMISSION),
        [name, level] => (
            name,
            level
                .parse::<u8>()
                .ok()
                .filter(|level| *level <= softborder::CONSOLE_PERMISSION)
                .ok_or_else(|| format!("Invalid permission level: {level}"))?,
        ),
        _ => return Err("Usage: op <name> [level]".to_string()),
    };
    server.set_permission(name, level)?;
    info!("Set the permission level of {name} to {level}");
    Ok(())
}

fn sudo(server: &mut Server, resets: &Arc<ResetPipeline>, args: &[String]) -> Result<(), String> {
    const USAGE: &str = "Usage: sudo <name> <command...>";
    let [name, command, rest @ ..] = args else {
        return Err(USAGE.to_string());
    };
    if !command.eq_ignore_ascii_case(softborder::ROOT) {
        return Err(format!("Unknown command: {command}"));
    }
    let source = server
        .player_by_name(name)
        .map(CommandSource::player)
        .ok_or_else(|| format!("No player was found: {name}"))?;
    run_softborder(server, resets, source, rest);
    Ok(())
}

fn run_softborder(
    server: &mut Server,
    resets: &Arc<ResetPipeline>,
    source: CommandSource,
    args: &[String],
) {
    let output = {
        let mut registry = server.registry().write();
        softborder::run(args, &source, &mut registry, server.settings())
    };
    let requester = source.player.as_ref().map(|player| player.uuid);
    deliver(server, requester, &output);

    if let Some(dimension) = output.reset {
        info!("{} started a reset of {dimension}", source.name);
        spawn_reset(Arc::clone(resets), dimension, requester, server.handle());
    }
}

fn deliver(server: &Server, requester: Option<Uuid>, output: &CommandOutput) {
    for line in &output.feedback {
        match requester {
            Some(player) => server.tell(player, line),
            None if output.success => info!("{line}"),
            None => warn!("{line}"),
        }
    }
}

/// Runs a reset in the background and reports back to whoever started it.
fn spawn_reset(
    resets: Arc<ResetPipeline>,
    dimension: String,
    requester: Option<Uuid>,
    host: MainHandle,
) {
    tokio::spawn(async move {
        let feedback = match resets.run(&dimension).await {
            Ok(report) => {
                info!(
                    "Reset of {dimension} finished: {} of {} planned chunks deleted, {} players evacuated",
                    report.deleted,
                    report.planned,
                    report.evacuated.len()
                );
                report.feedback()
            }
            Err(e) => {
                error!("Reset of {dimension} failed: {e}");
                e.feedback()
            }
        };

        for line in feedback {
            match requester {
                Some(player) => {
                    if host.send_message(player, line).is_err() {
                        break;
                    }
                }
                None => info!("{line}"),
            }
        }
    });
}
