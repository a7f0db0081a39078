//! Player records
//!
//! Two records back the registry: the current-player slot and the master
//! player list. Updates to a player write both in one batch.

use serde::{Deserialize, Serialize};

use crate::neighborhoods::NeighborhoodAggregator;
use crate::persistence::{
    ALL_PLAYERS_KEY, PLAYER_KEY, Store, StoreError, encode_record, load_record,
};

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub neighborhood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    /// Best session score; never decreases
    pub high_score: u64,
    /// Completed sessions
    pub attempts: u32,
}

impl Player {
    pub fn new(name: &str, neighborhood: &str, whatsapp: Option<&str>) -> Self {
        Self {
            id: new_player_id(),
            name: name.to_string(),
            neighborhood: neighborhood.to_string(),
            whatsapp: whatsapp.map(str::to_string),
            high_score: 0,
            attempts: 0,
        }
    }

    /// Count one finished session, raising the high score if beaten
    pub fn record_session(&mut self, score: u64) {
        self.attempts += 1;
        if score > self.high_score {
            self.high_score = score;
        }
    }
}

/// `player_<millis>_<random>`: unique even for same-millisecond registrations
fn new_player_id() -> String {
    format!("player_{}_{:08x}", crate::now_millis(), rand::random::<u32>())
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("player not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Player record operations over a borrowed store
pub struct PlayerRegistry<'s, S: Store + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: Store + ?Sized> PlayerRegistry<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Register a new player: becomes the current player, joins the master
    /// list, and counts toward its neighborhood.
    pub fn create_player(
        &mut self,
        name: &str,
        neighborhood: &str,
        whatsapp: Option<&str>,
    ) -> Result<Player, StoreError> {
        let player = Player::new(name, neighborhood, whatsapp);

        let mut all = self.all_players()?;
        all.push(player.clone());
        self.store.set_many(&[
            (PLAYER_KEY, encode_record(PLAYER_KEY, &player)?),
            (ALL_PLAYERS_KEY, encode_record(ALL_PLAYERS_KEY, &all)?),
        ])?;

        NeighborhoodAggregator::new(&mut *self.store).register_new_player(neighborhood)?;

        log::info!(
            "Registered player {} ({}) from {}",
            player.name,
            player.id,
            player.neighborhood
        );
        Ok(player)
    }

    /// The persisted current player, if any. A corrupt slot is cleared.
    pub fn current_player(&mut self) -> Result<Option<Player>, StoreError> {
        load_record(&mut *self.store, PLAYER_KEY)
    }

    /// Every registered player in registration order
    pub fn all_players(&mut self) -> Result<Vec<Player>, StoreError> {
        Ok(load_record(&mut *self.store, ALL_PLAYERS_KEY)?.unwrap_or_default())
    }

    /// Record a finished session for `player_id`.
    ///
    /// Looks in the current-player slot first, then the master list.
    /// `attempts` always goes up by one; `high_score` only if beaten.
    pub fn update_player_stats(
        &mut self,
        player_id: &str,
        new_score: u64,
    ) -> Result<Player, RegistryError> {
        let current = self.current_player()?.filter(|p| p.id == player_id);
        let mut all = self.all_players()?;
        let index = all.iter().position(|p| p.id == player_id);

        let mut player = match (&current, index) {
            (Some(p), _) => p.clone(),
            (None, Some(i)) => all[i].clone(),
            (None, None) => {
                log::error!("Player not found for stats update: {}", player_id);
                return Err(RegistryError::NotFound(player_id.to_string()));
            }
        };
        player.record_session(new_score);

        let mut writes = Vec::with_capacity(2);
        if current.is_some() {
            writes.push((PLAYER_KEY, encode_record(PLAYER_KEY, &player)?));
        }
        match index {
            Some(i) => {
                all[i] = player.clone();
                writes.push((ALL_PLAYERS_KEY, encode_record(ALL_PLAYERS_KEY, &all)?));
            }
            None => log::warn!(
                "Updated player {} was not found in the master list; current-player slot and master list are out of sync",
                player_id
            ),
        }
        self.store.set_many(&writes)?;

        Ok(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, NEIGHBORHOODS_KEY, save_record};

    #[test]
    fn test_create_player_persists_everywhere() {
        let mut store = MemoryStore::new();
        let player = PlayerRegistry::new(&mut store)
            .create_player("Ana", "Centro", Some("5511999999999"))
            .unwrap();
        assert_eq!(player.high_score, 0);
        assert_eq!(player.attempts, 0);
        assert!(player.id.starts_with("player_"));

        let mut registry = PlayerRegistry::new(&mut store);
        assert_eq!(registry.current_player().unwrap(), Some(player.clone()));
        assert_eq!(registry.all_players().unwrap(), vec![player]);

        let hoods = NeighborhoodAggregator::new(&mut store).aggregated().unwrap();
        let centro = &hoods["Centro"];
        assert_eq!((centro.total_players, centro.total_score), (1, 0));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = MemoryStore::new();
        let mut registry = PlayerRegistry::new(&mut store);
        let a = registry.create_player("A", "X", None).unwrap();
        let b = registry.create_player("B", "X", None).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(registry.current_player().unwrap().unwrap().id, b.id);
        assert_eq!(registry.all_players().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_current_player_is_absent() {
        let mut store = MemoryStore::new();
        assert_eq!(PlayerRegistry::new(&mut store).current_player().unwrap(), None);
    }

    #[test]
    fn test_corrupt_current_player_is_cleared() {
        let mut store = MemoryStore::new();
        store.set(PLAYER_KEY, "{\"id\": ").unwrap();
        assert_eq!(PlayerRegistry::new(&mut store).current_player().unwrap(), None);
        assert_eq!(store.get(PLAYER_KEY).unwrap(), None);
    }

    #[test]
    fn test_update_never_lowers_high_score() {
        let mut store = MemoryStore::new();
        let mut registry = PlayerRegistry::new(&mut store);
        let p = registry.create_player("Ana", "Centro", None).unwrap();

        let p1 = registry.update_player_stats(&p.id, 80).unwrap();
        assert_eq!((p1.high_score, p1.attempts), (80, 1));
        let p2 = registry.update_player_stats(&p.id, 40).unwrap();
        assert_eq!((p2.high_score, p2.attempts), (80, 2));

        assert_eq!(registry.current_player().unwrap(), Some(p2.clone()));
        assert_eq!(registry.all_players().unwrap(), vec![p2]);
    }

    #[test]
    fn test_update_falls_back_to_master_list() {
        let mut store = MemoryStore::new();
        let mut registry = PlayerRegistry::new(&mut store);
        let first = registry.create_player("Ana", "Centro", None).unwrap();
        let second = registry.create_player("Bia", "Lapa", None).unwrap();

        let updated = registry.update_player_stats(&first.id, 50).unwrap();
        assert_eq!(updated.high_score, 50);
        // Current slot still holds the other player, untouched
        assert_eq!(registry.current_player().unwrap(), Some(second));
        let all = registry.all_players().unwrap();
        assert_eq!(all[0], updated);
    }

    #[test]
    fn test_update_unknown_player_is_not_found() {
        let mut store = MemoryStore::new();
        let mut registry = PlayerRegistry::new(&mut store);
        registry.create_player("Ana", "Centro", None).unwrap();
        let err = registry.update_player_stats("player_nobody", 10).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(id) if id == "player_nobody"));
    }

    #[test]
    fn test_desync_still_updates_current_slot() {
        let mut store = MemoryStore::new();
        let p = PlayerRegistry::new(&mut store)
            .create_player("Ana", "Centro", None)
            .unwrap();
        save_record(&mut store, ALL_PLAYERS_KEY, &Vec::<Player>::new()).unwrap();

        let mut registry = PlayerRegistry::new(&mut store);
        let updated = registry.update_player_stats(&p.id, 30).unwrap();
        assert_eq!((updated.high_score, updated.attempts), (30, 1));
        assert_eq!(registry.current_player().unwrap(), Some(updated));
        assert!(registry.all_players().unwrap().is_empty());
        assert!(store.get(NEIGHBORHOODS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_player_json_matches_stored_format() {
        let p = Player {
            id: "player_1".to_string(),
            name: "Ana".to_string(),
            neighborhood: "Centro".to_string(),
            whatsapp: None,
            high_score: 120,
            attempts: 3,
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"{"id":"player_1","name":"Ana","neighborhood":"Centro","highScore":120,"attempts":3}"#
        );
        let back: Player = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
