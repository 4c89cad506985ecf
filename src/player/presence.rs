//! Tracks which zone each player is in and reports when players enter or leave protection.
use std::collections::HashMap;

use log::debug;
use uuid::Uuid;

use crate::zone::registry::ZoneRegistry;

use super::OnlinePlayer;

/// A change of a player's protection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// The player went from outside all zones into a zone.
    Enter {
        player: Uuid,
        player_name: String,
        zone_name: String,
    },
    /// The player went from a zone to outside all zones.
    Leave { player: Uuid, player_name: String },
}

/// Receives presence events. Implementations are cosmetic: messages, sounds, particles.
pub trait PresenceListener {
    fn on_enter_zone(&mut self, player: Uuid, player_name: &str, zone_name: &str);
    fn on_leave_zone(&mut self, player: Uuid, player_name: &str);

    fn dispatch(&mut self, event: &PresenceEvent) {
        match event {
            PresenceEvent::Enter {
                player,
                player_name,
                zone_name,
            } => self.on_enter_zone(*player, player_name, zone_name),
            PresenceEvent::Leave {
                player,
                player_name,
            } => self.on_leave_zone(*player, player_name),
        }
    }
}

/// Last known zone per player. A player missing from the map is outside all zones.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    last_zone: HashMap<Uuid, Uuid>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates every player once and returns the events of this poll.
    ///
    /// Moving directly from one zone into an overlapping one updates the state without an event.
    pub fn poll(&mut self, registry: &ZoneRegistry, players: &[OnlinePlayer]) -> Vec<PresenceEvent> {
        let mut events = Vec::new();

        for player in players {
            let current = registry.zone_containing(&player.dimension, player.x, player.z);
            let last = self.last_zone.get(&player.uuid).copied();

            if current.map(|zone| zone.id) == last {
                continue;
            }

            match (last, current) {
                (None, Some(zone)) => {
                    self.last_zone.insert(player.uuid, zone.id);
                    events.push(PresenceEvent::Enter {
                        player: player.uuid,
                        player_name: player.name.clone(),
                        zone_name: zone.name.clone(),
                    });
                }
                (Some(_), None) => {
                    self.last_zone.remove(&player.uuid);
                    events.push(PresenceEvent::Leave {
                        player: player.uuid,
                        player_name: player.name.clone(),
                    });
                }
                (Some(_), Some(zone)) => {
                    debug!("{} moved into overlapping zone {}", player.name, zone.name);
                    self.last_zone.insert(player.uuid, zone.id);
                }
                (None, None) => {}
            }
        }

        events
    }

    /// Drops the state of a disconnected player.
    pub fn forget(&mut self, player: &Uuid) {
        self.last_zone.remove(player);
    }

    /// The zone the player was in at the last poll.
    pub fn zone_of(&self, player: &Uuid) -> Option<Uuid> {
        self.last_zone.get(player).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Zone;

    const OVERWORLD: &str = "minecraft:overworld";

    fn registry() -> ZoneRegistry {
        let mut registry = ZoneRegistry::in_memory();
        registry
            .add(Zone::new(OVERWORLD, "spawn", 0, 0, 16).unwrap())
            .unwrap();
        registry
            .add(Zone::new(OVERWORLD, "annex", 20, 0, 16).unwrap())
            .unwrap();
        registry
    }

    #[test]
    fn test_enter_then_leave() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        let mut player = OnlinePlayer::new("alex", OVERWORLD, 100.0, 100.0);

        assert!(tracker.poll(&registry, &[player.clone()]).is_empty());

        player.x = 0.0;
        player.z = 0.0;
        let events = tracker.poll(&registry, &[player.clone()]);
        assert_eq!(
            events,
            vec![PresenceEvent::Enter {
                player: player.uuid,
                player_name: "alex".to_string(),
                zone_name: "spawn".to_string(),
            }]
        );
        // Same zone, no event
        assert!(tracker.poll(&registry, &[player.clone()]).is_empty());

        player.x = -100.0;
        let events = tracker.poll(&registry, &[player.clone()]);
        assert_eq!(
            events,
            vec![PresenceEvent::Leave {
                player: player.uuid,
                player_name: "alex".to_string(),
            }]
        );
        assert_eq!(tracker.zone_of(&player.uuid), None);
    }

    #[test]
    fn test_overlapping_zone_transition_is_silent() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        let mut player = OnlinePlayer::new("steve", OVERWORLD, 0.0, 0.0);
        assert_eq!(tracker.poll(&registry, &[player.clone()]).len(), 1);

        // Only "annex" contains x = 30.
        player.x = 30.0;
        assert!(tracker.poll(&registry, &[player.clone()]).is_empty());
        let annex = registry.zone_by_name(OVERWORLD, "annex").unwrap().id;
        assert_eq!(tracker.zone_of(&player.uuid), Some(annex));
    }

    #[test]
    fn test_other_dimension_is_outside() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        let player = OnlinePlayer::new("alex", "minecraft:the_nether", 0.0, 0.0);
        assert!(tracker.poll(&registry, &[player]).is_empty());
    }

    #[test]
    fn test_forget_resets_state() {
        let registry = registry();
        let mut tracker = PresenceTracker::new();
        let player = OnlinePlayer::new("alex", OVERWORLD, 0.0, 0.0);
        tracker.poll(&registry, &[player.clone()]);

        tracker.forget(&player.uuid);
        assert_eq!(tracker.poll(&registry, &[player]).len(), 1);
    }

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl PresenceListener for Recorder {
        fn on_enter_zone(&mut self, _player: Uuid, player_name: &str, zone_name: &str) {
            self.0.push(format!("enter {player_name} {zone_name}"));
        }

        fn on_leave_zone(&mut self, _player: Uuid, player_name: &str) {
            self.0.push(format!("leave {player_name}"));
        }
    }

    #[test]
    fn test_dispatch_to_listener() {
        let mut recorder = Recorder::default();
        let player = Uuid::new_v4();
        recorder.dispatch(&PresenceEvent::Enter {
            player,
            player_name: "alex".to_string(),
            zone_name: "spawn".to_string(),
        });
        recorder.dispatch(&PresenceEvent::Leave {
            player,
            player_name: "alex".to_string(),
        });
        assert_eq!(recorder.0, vec!["enter alex spawn", "leave alex"]);
    }
}
