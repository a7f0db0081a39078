//! Leaderboard queries
//!
//! Players rank by high score, neighborhoods by average score, both
//! descending. Sorts are stable, so ties keep their stored order.

use crate::neighborhoods::{NeighborhoodAggregator, NeighborhoodStats, normalize_key};
use crate::persistence::{Store, StoreError};
use crate::registry::{Player, PlayerRegistry};

/// Default leaderboard length
pub const DEFAULT_LIMIT: usize = 10;

pub struct RankingEngine<'s, S: Store + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: Store + ?Sized> RankingEngine<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Best `limit` players by high score
    pub fn top_players(&mut self, limit: usize) -> Result<Vec<Player>, StoreError> {
        let mut players = PlayerRegistry::new(&mut *self.store).all_players()?;
        players.sort_by(|a, b| b.high_score.cmp(&a.high_score));
        players.truncate(limit);
        Ok(players)
    }

    /// Best `limit` neighborhoods by average score
    pub fn top_neighborhoods(&mut self, limit: usize) -> Result<Vec<NeighborhoodStats>, StoreError> {
        let mut hoods = self.ranked_neighborhoods()?;
        hoods.truncate(limit);
        Ok(hoods)
    }

    /// 1-based position of `name` (case-insensitive) among all neighborhoods
    pub fn rank_of(&mut self, name: &str) -> Result<Option<usize>, StoreError> {
        let key = normalize_key(name);
        Ok(self
            .ranked_neighborhoods()?
            .iter()
            .position(|stats| stats.key == key)
            .map(|i| i + 1))
    }

    fn ranked_neighborhoods(&mut self) -> Result<Vec<NeighborhoodStats>, StoreError> {
        let mut hoods = NeighborhoodAggregator::new(&mut *self.store).stats()?;
        hoods.sort_by(|a, b| b.average_score.cmp(&a.average_score));
        Ok(hoods)
    }
}
