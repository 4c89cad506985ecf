//! The `softborder` operator command: zone management and dimension resets.
use thiserror::Error;

use crate::config::{dimension_label, normalize_dimension, Settings};
use crate::consts::dimensions;
use crate::consts::zones::{MAX_RADIUS, MIN_RADIUS};
use crate::player::OnlinePlayer;
use crate::zone::registry::ZoneRegistry;
use crate::zone::{Zone, ZoneError};

pub const ROOT: &str = "softborder";

/// Permission level of the server console.
pub const CONSOLE_PERMISSION: u8 = 4;

const USAGE: &str =
    "Usage: softborder <create <name> <radius> | remove <zoneName> | list | info <zoneName> | reset <dimension>>";

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("Unterminated quoted string")]
    UnterminatedQuote,

    #[error("{0}")]
    Usage(&'static str),

    #[error(
        "Invalid radius '{0}', expected an integer between {min} and {max}",
        min = MIN_RADIUS,
        max = MAX_RADIUS
    )]
    InvalidRadius(String),

    #[error("You do not have permission to use this command")]
    PermissionDenied,

    #[error("A player is required to run this command here")]
    PlayerOnly,

    #[error(transparent)]
    Zone(#[from] ZoneError),
}

/// Splits a command line on whitespace. Double quotes group words, `\"` and `\\` escape inside
/// them.
pub fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => return Err(CommandError::UnterminatedQuote),
                    },
                    Some(c) => token.push(c),
                    None => return Err(CommandError::UnterminatedQuote),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneCommand {
    Create { name: String, radius: i32 },
    Remove { name: String },
    List,
    Info { name: String },
    Reset { dimension: String },
}

impl ZoneCommand {
    /// Parses the arguments following the root literal.
    pub fn parse(args: &[String]) -> Result<Self, CommandError> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match args.as_slice() {
            ["create", name, radius] => Ok(Self::Create {
                name: name.to_string(),
                radius: parse_radius(radius)?,
            }),
            ["create", ..] => Err(CommandError::Usage("Usage: softborder create <name> <radius>")),
            ["remove", name] => Ok(Self::Remove {
                name: name.to_string(),
            }),
            ["remove", ..] => Err(CommandError::Usage("Usage: softborder remove <zoneName>")),
            ["list"] => Ok(Self::List),
            ["info", name] => Ok(Self::Info {
                name: name.to_string(),
            }),
            ["info", ..] => Err(CommandError::Usage("Usage: softborder info <zoneName>")),
            ["reset", dimension] => Ok(Self::Reset {
                dimension: dimension.to_string(),
            }),
            ["reset", ..] => Err(CommandError::Usage("Usage: softborder reset <dimension>")),
            _ => Err(CommandError::Usage(USAGE)),
        }
    }
}

fn parse_radius(input: &str) -> Result<i32, CommandError> {
    input
        .parse::<i32>()
        .ok()
        .filter(|radius| (MIN_RADIUS..=MAX_RADIUS).contains(radius))
        .ok_or_else(|| CommandError::InvalidRadius(input.to_string()))
}

/// Who runs a command, and where.
#[derive(Debug, Clone)]
pub struct CommandSource {
    pub name: String,
    /// The executing player, `None` for the console.
    pub player: Option<OnlinePlayer>,
    pub dimension: String,
    pub permission_level: u8,
}

impl CommandSource {
    /// The console acts in the overworld with the highest permission level.
    pub fn console() -> Self {
        Self {
            name: "Server".to_string(),
            player: None,
            dimension: dimensions::OVERWORLD.to_string(),
            permission_level: CONSOLE_PERMISSION,
        }
    }

    pub fn player(player: &OnlinePlayer) -> Self {
        Self {
            name: player.name.clone(),
            dimension: player.dimension.clone(),
            permission_level: player.permission_level,
            player: Some(player.clone()),
        }
    }
}

/// What a command reports back to its source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub success: bool,
    pub feedback: Vec<String>,
    /// Normalized dimension whose reset the caller must start.
    pub reset: Option<String>,
}

impl CommandOutput {
    fn success(feedback: Vec<String>) -> Self {
        Self {
            success: true,
            feedback,
            reset: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            feedback: vec![message.into()],
            reset: None,
        }
    }
}

/// Runs `softborder` with the already tokenized `args`. Errors become failed outputs.
pub fn run(
    args: &[String],
    source: &CommandSource,
    registry: &mut ZoneRegistry,
    settings: &Settings,
) -> CommandOutput {
    dispatch(args, source, registry, settings)
        .unwrap_or_else(|e| CommandOutput::failure(e.to_string()))
}

fn dispatch(
    args: &[String],
    source: &CommandSource,
    registry: &mut ZoneRegistry,
    settings: &Settings,
) -> Result<CommandOutput, CommandError> {
    if source.permission_level < settings.command_permission {
        return Err(CommandError::PermissionDenied);
    }
    let command = ZoneCommand::parse(args)?;
    execute(&command, source, registry, settings)
}

pub fn execute(
    command: &ZoneCommand,
    source: &CommandSource,
    registry: &mut ZoneRegistry,
    settings: &Settings,
) -> Result<CommandOutput, CommandError> {
    match command {
        ZoneCommand::Create { name, radius } => {
            let player = source.player.as_ref().ok_or(CommandError::PlayerOnly)?;
            let (x, z) = (player.x.floor() as i32, player.z.floor() as i32);
            registry.add(Zone::new(&player.dimension, name, x, z, *radius)?)?;
            Ok(CommandOutput::success(vec![format!(
                "Created exclusion zone '{name}' with radius {radius} at ({x}, {z}) in {}",
                dimension_label(&player.dimension)
            )]))
        }
        ZoneCommand::Remove { name } => {
            if !registry.remove_by_name(&source.dimension, name) {
                return Err(ZoneError::NotFound(name.clone()).into());
            }
            Ok(CommandOutput::success(vec![format!(
                "Removed exclusion zone: {name}"
            )]))
        }
        ZoneCommand::List => {
            let label = dimension_label(&source.dimension);
            let zones = registry.zones_for(&source.dimension);
            if zones.is_empty() {
                return Ok(CommandOutput::success(vec![format!(
                    "No exclusion zones in current dimension ({label})"
                )]));
            }
            let mut feedback = vec![format!("Exclusion zones in {label}:")];
            feedback.extend(zones.iter().map(|zone| {
                format!(
                    "- {} at ({}, {}) radius {}",
                    zone.name, zone.center_x, zone.center_z, zone.radius
                )
            }));
            Ok(CommandOutput::success(feedback))
        }
        ZoneCommand::Info { name } => {
            let zone = registry
                .zone_by_name(&source.dimension, name)
                .ok_or_else(|| ZoneError::NotFound(name.clone()))?;
            Ok(CommandOutput::success(vec![
                "Zone Information:".to_string(),
                format!("Name: {}", zone.name),
                format!("Dimension: {}", dimension_label(&zone.dimension)),
                format!("Center: ({}, {})", zone.center_x, zone.center_z),
                format!("Radius: {}", zone.radius),
            ]))
        }
        ZoneCommand::Reset { dimension } => {
            if source.permission_level < settings.reset_permission {
                return Err(CommandError::PermissionDenied);
            }
            let dimension = normalize_dimension(dimension);
            Ok(CommandOutput {
                success: true,
                feedback: vec![format!(
                    "Starting dimension reset for {}...",
                    dimension_label(&dimension)
                )],
                reset: Some(dimension),
            })
        }
    }
}
