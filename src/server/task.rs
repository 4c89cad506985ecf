//! Work scheduled onto the main loop, the only context allowed to touch player state.
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::player::OnlinePlayer;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("The main loop is not running")]
    Unavailable,

    #[error("No connected player with id {0}")]
    PlayerNotFound(Uuid),
}

/// A request executed on the main loop at the start of the next tick.
#[derive(Debug)]
pub enum MainTask {
    /// Snapshot of the players currently in a dimension.
    Players {
        dimension: String,
        reply: oneshot::Sender<Vec<OnlinePlayer>>,
    },
    /// A chat message to one player.
    Message { player: Uuid, message: String },
    /// Disconnects a player. The reply carries the outcome once it happened.
    Disconnect {
        player: Uuid,
        reason: String,
        reply: oneshot::Sender<Result<(), HostError>>,
    },
}

/// Cloneable sender of `MainTask`s, usable from any thread or task.
#[derive(Debug, Clone)]
pub struct MainHandle {
    tx: mpsc::UnboundedSender<MainTask>,
}

impl MainHandle {
    /// A handle and the receiving end the main loop drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<MainTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn schedule(&self, task: MainTask) -> Result<(), HostError> {
        self.tx.send(task).map_err(|_| HostError::Unavailable)
    }

    pub async fn players_in(&self, dimension: &str) -> Result<Vec<OnlinePlayer>, HostError> {
        let (reply, rx) = oneshot::channel();
        self.schedule(MainTask::Players {
            dimension: dimension.to_string(),
            reply,
        })?;
        rx.await.map_err(|_| HostError::Unavailable)
    }

    pub fn send_message(&self, player: Uuid, message: impl Into<String>) -> Result<(), HostError> {
        self.schedule(MainTask::Message {
            player,
            message: message.into(),
        })
    }

    /// Schedules a disconnect and returns the receiver of its outcome.
    pub fn schedule_disconnect(
        &self,
        player: Uuid,
        reason: impl Into<String>,
    ) -> Result<oneshot::Receiver<Result<(), HostError>>, HostError> {
        let (reply, rx) = oneshot::channel();
        self.schedule(MainTask::Disconnect {
            player,
            reason: reason.into(),
            reply,
        })?;
        Ok(rx)
    }
}
