//! Moves players out of chunks that are about to be deleted.
use std::collections::HashSet;

use log::{info, warn};

use crate::consts::messages::{EVACUATION_NOTICE, EVACUATION_REASON};
use crate::region_parser::chunk::ChunkPos;
use crate::server::{HostError, MainHandle};

/// Disconnects every player of `dimension` standing in a worklist chunk and waits until the main
/// loop has done so. Returns the names of the players that were disconnected.
///
/// A failed disconnect is logged and does not stop the reset. Not being able to list the players
/// at all does.
pub async fn evacuate(
    host: &MainHandle,
    dimension: &str,
    worklist: &HashSet<ChunkPos>,
) -> Result<Vec<String>, HostError> {
    let players = host.players_in(dimension).await?;

    let mut pending = Vec::new();
    for player in players.iter().filter(|p| worklist.contains(&p.chunk())) {
        host.send_message(player.uuid, EVACUATION_NOTICE)?;
        let ack = host.schedule_disconnect(player.uuid, EVACUATION_REASON)?;
        pending.push((player.name.clone(), ack));
    }

    let mut evacuated = Vec::new();
    for (name, ack) in pending {
        match ack.await {
            Ok(Ok(())) => evacuated.push(name),
            Ok(Err(e)) => warn!("Failed to disconnect player {name}: {e}"),
            Err(_) => warn!("Failed to disconnect player {name}: the main loop dropped the request"),
        }
    }

    if !evacuated.is_empty() {
        info!(
            "Disconnected players from deletion zones: {}",
            evacuated.join(", ")
        );
    }
    Ok(evacuated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::OnlinePlayer;
    use crate::server::MainTask;

    #[tokio::test]
    async fn test_only_players_in_worklist_chunks_are_disconnected() {
        let (host, mut rx) = MainHandle::channel();
        let doomed = OnlinePlayer::new("doomed", "minecraft:overworld", 40.0, 3.0);
        let safe = OnlinePlayer::new("safe", "minecraft:overworld", 0.0, 0.0);
        let gone = OnlinePlayer::new("gone", "minecraft:overworld", 41.0, 3.0);
        let players = vec![doomed.clone(), safe.clone(), gone.clone()];
        let gone_id = gone.uuid;

        let driver = tokio::spawn(async move {
            let mut log = Vec::new();
            while let Some(task) = rx.recv().await {
                match task {
                    MainTask::Players { reply, .. } => {
                        let _ = reply.send(players.clone());
                    }
                    MainTask::Message { player, .. } => log.push(format!("message {player}")),
                    MainTask::Disconnect { player, reply, .. } => {
                        log.push(format!("disconnect {player}"));
                        let result = if player == gone_id {
                            Err(HostError::PlayerNotFound(player))
                        } else {
                            Ok(())
                        };
                        let _ = reply.send(result);
                    }
                }
            }
            log
        });

        let worklist: HashSet<ChunkPos> = [ChunkPos::new(2, 0)].into_iter().collect();
        let evacuated = evacuate(&host, "minecraft:overworld", &worklist)
            .await
            .unwrap();
        drop(host);

        assert_eq!(evacuated, vec!["doomed".to_string()]);
        let log = driver.await.unwrap();
        assert!(log.contains(&format!("message {}", doomed.uuid)));
        assert!(log.contains(&format!("disconnect {}", doomed.uuid)));
        assert!(!log.iter().any(|entry| entry.contains(&safe.uuid.to_string())));
    }

    #[tokio::test]
    async fn test_unavailable_host_aborts() {
        let (host, rx) = MainHandle::channel();
        drop(rx);
        let worklist: HashSet<ChunkPos> = [ChunkPos::new(0, 0)].into_iter().collect();
        assert_eq!(
            evacuate(&host, "minecraft:overworld", &worklist).await,
            Err(HostError::Unavailable)
        );
    }
}
