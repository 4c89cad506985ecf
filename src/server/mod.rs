//! A minimal in-process host: it owns the connected players and runs the per-tick polling.
//!
//! All player state lives here and is only touched from the main loop. Code running elsewhere,
//! such as a reset pipeline, goes through a [`MainHandle`].
pub mod task;

use std::collections::HashMap;
use std::sync::Arc;

use colored::Colorize;
use log::{debug, info, trace, warn};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Settings;
use crate::consts::messages;
use crate::player::presence::{PresenceListener, PresenceTracker};
use crate::player::OnlinePlayer;
use crate::zone::border::visible_borders;
use crate::zone::registry::ZoneRegistry;

pub use task::{HostError, MainHandle, MainTask};

/// Writes presence changes to the player's chat.
#[derive(Debug, Default)]
pub struct ChatNotifier;

impl PresenceListener for ChatNotifier {
    fn on_enter_zone(&mut self, _player: Uuid, player_name: &str, zone_name: &str) {
        info!("[to {player_name}] {}", messages::ENTER_ZONE.green());
        debug!("{player_name} entered zone {zone_name}");
    }

    fn on_leave_zone(&mut self, _player: Uuid, player_name: &str) {
        info!("[to {player_name}] {}", messages::LEAVE_ZONE.red());
    }
}

pub struct Server {
    settings: Settings,
    registry: Arc<RwLock<ZoneRegistry>>,
    players: HashMap<Uuid, OnlinePlayer>,
    presence: PresenceTracker,
    notifier: Box<dyn PresenceListener + Send>,
    tasks: mpsc::UnboundedReceiver<MainTask>,
    handle: MainHandle,
}

impl Server {
    pub fn new(settings: Settings, registry: Arc<RwLock<ZoneRegistry>>) -> Self {
        let (handle, tasks) = MainHandle::channel();
        Self {
            settings,
            registry,
            players: HashMap::new(),
            presence: PresenceTracker::new(),
            notifier: Box::new(ChatNotifier),
            tasks,
            handle,
        }
    }

    /// Replaces the presence listener.
    #[cfg(test)]
    pub fn with_notifier(mut self, notifier: impl PresenceListener + Send + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn handle(&self) -> MainHandle {
        self.handle.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<RwLock<ZoneRegistry>> {
        &self.registry
    }

    /// One tick: scheduled tasks first, then presence polling and border refresh.
    pub fn tick(&mut self) {
        self.run_scheduled_tasks();
        self.poll_presence();
        self.refresh_borders();
    }

    pub fn run_scheduled_tasks(&mut self) {
        while let Ok(task) = self.tasks.try_recv() {
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: MainTask) {
        match task {
            MainTask::Players { dimension, reply } => {
                let players = self
                    .players
                    .values()
                    .filter(|player| player.dimension == dimension)
                    .cloned()
                    .collect();
                // The requester may have given up, nothing to do then.
                let _ = reply.send(players);
            }
            MainTask::Message { player, message } => self.tell(player, &message),
            MainTask::Disconnect {
                player,
                reason,
                reply,
            } => {
                let result = self.disconnect(player, &reason);
                if let Err(e) = &result {
                    warn!("{e}");
                }
                let _ = reply.send(result);
            }
        }
    }

    fn poll_presence(&mut self) {
        let players: Vec<OnlinePlayer> = self.players.values().cloned().collect();
        let events = self.presence.poll(&self.registry.read(), &players);
        for event in &events {
            self.notifier.dispatch(event);
        }
    }

    fn refresh_borders(&self) {
        let registry = self.registry.read();
        for player in self.players.values() {
            let zones = registry.zones_for(&player.dimension);
            for hint in visible_borders(&zones, player.x, player.z, self.settings.border_threshold)
            {
                trace!(
                    "{} sees the {} border of {}",
                    player.name,
                    if hint.inside { "safe" } else { "danger" },
                    hint.zone.name
                );
            }
        }
    }

    /// Sends a chat message to a connected player.
    pub fn tell(&self, player: Uuid, message: &str) {
        match self.players.get(&player) {
            Some(player) => info!("[to {}] {message}", player.name),
            None => debug!("Dropping message to disconnected player {player}: {message}"),
        }
    }

    pub fn join(&mut self, player: OnlinePlayer) -> Result<(), String> {
        if self.player_by_name(&player.name).is_some() {
            return Err(format!("{} is already connected", player.name));
        }
        info!(
            "{} joined the game in {} at ({}, {})",
            player.name, player.dimension, player.x, player.z
        );
        self.players.insert(player.uuid, player);
        Ok(())
    }

    /// Moves a connected player, optionally to another dimension.
    pub fn teleport(
        &mut self,
        name: &str,
        x: f64,
        z: f64,
        dimension: Option<String>,
    ) -> Result<(), String> {
        let uuid = self.uuid_of(name)?;
        if let Some(player) = self.players.get_mut(&uuid) {
            player.x = x;
            player.z = z;
            if let Some(dimension) = dimension {
                player.dimension = dimension;
            }
        }
        Ok(())
    }

    pub fn set_permission(&mut self, name: &str, level: u8) -> Result<(), String> {
        let uuid = self.uuid_of(name)?;
        if let Some(player) = self.players.get_mut(&uuid) {
            player.permission_level = level;
        }
        Ok(())
    }

    /// Removes a player that left on its own.
    pub fn quit(&mut self, name: &str) -> Result<(), String> {
        let uuid = self.uuid_of(name)?;
        self.remove_player(uuid);
        info!("{name} left the game");
        Ok(())
    }

    fn disconnect(&mut self, player: Uuid, reason: &str) -> Result<(), HostError> {
        let player = self
            .remove_player(player)
            .ok_or(HostError::PlayerNotFound(player))?;
        info!("{} lost connection: {reason}", player.name);
        Ok(())
    }

    fn remove_player(&mut self, player: Uuid) -> Option<OnlinePlayer> {
        self.presence.forget(&player);
        self.players.remove(&player)
    }

    fn uuid_of(&self, name: &str) -> Result<Uuid, String> {
        self.player_by_name(name)
            .map(|player| player.uuid)
            .ok_or_else(|| format!("No player was found: {name}"))
    }

    /// Name of the zone the player stood in at the last tick.
    pub fn current_zone(&self, player: Uuid) -> Option<String> {
        let zone = self.presence.zone_of(&player)?;
        self.registry
            .read()
            .all_zones()
            .values()
            .flatten()
            .find(|candidate| candidate.id == zone)
            .map(|zone| zone.name.clone())
    }

    pub fn player_by_name(&self, name: &str) -> Option<&OnlinePlayer> {
        self.players
            .values()
            .find(|player| player.name.eq_ignore_ascii_case(name))
    }

    /// Connected players, sorted by name.
    pub fn players(&self) -> Vec<&OnlinePlayer> {
        let mut players: Vec<&OnlinePlayer> = self.players.values().collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        players
    }
}


#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::zone::Zone;

    const OVERWORLD: &str = "minecraft:overworld";

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl PresenceListener for Recorder {
        fn on_enter_zone(&mut self, _player: Uuid, player_name: &str, zone_name: &str) {
            self.0.lock().push(format!("enter {player_name} {zone_name}"));
        }

        fn on_leave_zone(&mut self, _player: Uuid, player_name: &str) {
            self.0.lock().push(format!("leave {player_name}"));
        }
    }

    fn server() -> (Server, Recorder) {
        let mut registry = ZoneRegistry::in_memory();
        registry
            .add(Zone::new(OVERWORLD, "spawn", 0, 0, 16).unwrap())
            .unwrap();
        let recorder = Recorder::default();
        let server = Server::new(
            testing::settings(Path::new("world")),
            Arc::new(RwLock::new(registry)),
        )
        .with_notifier(recorder.clone());
        (server, recorder)
    }

    #[test]
    fn test_tick_fires_presence_events() {
        let (mut server, recorder) = server();
        server
            .join(OnlinePlayer::new("alex", OVERWORLD, 100.0, 0.0))
            .unwrap();
        server.tick();
        server.teleport("alex", 1.0, 1.0, None).unwrap();
        server.tick();
        server.teleport("alex", 100.0, 1.0, None).unwrap();
        server.tick();

        assert_eq!(*recorder.0.lock(), vec!["enter alex spawn", "leave alex"]);
        let alex = server.player_by_name("alex").unwrap().uuid;
        assert_eq!(server.current_zone(alex), None);

        server.teleport("alex", 3.0, 3.0, None).unwrap();
        server.tick();
        assert_eq!(server.current_zone(alex).as_deref(), Some("spawn"));
    }

    #[test]
    fn test_join_rejects_duplicate_names() {
        let (mut server, _) = server();
        server.join(OnlinePlayer::new("alex", OVERWORLD, 0.0, 0.0)).unwrap();
        assert!(server.join(OnlinePlayer::new("Alex", OVERWORLD, 0.0, 0.0)).is_err());
        assert!(server.quit("bob").is_err());
        server.quit("ALEX").unwrap();
        assert!(server.players().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_disconnect_runs_on_tick() {
        let (mut server, _) = server();
        let player = OnlinePlayer::new("alex", OVERWORLD, 0.0, 0.0);
        let uuid = player.uuid;
        server.join(player).unwrap();

        let handle = server.handle();
        let mut ack = handle.schedule_disconnect(uuid, "bye").unwrap();
        assert!(ack.try_recv().is_err());
        assert_eq!(server.players().len(), 1);

        server.tick();
        assert_eq!(ack.await.unwrap(), Ok(()));
        assert!(server.players().is_empty());

        let ack = handle.schedule_disconnect(uuid, "bye").unwrap();
        server.tick();
        assert_eq!(ack.await.unwrap(), Err(HostError::PlayerNotFound(uuid)));
    }
}
