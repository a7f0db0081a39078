//! Neighborhood score aggregation
//!
//! Running totals keyed by the normalized (trimmed, lower-cased) name.
//! `total_players` grows only at registration while every session adds its
//! score, so the average is lifetime score per registered player.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::persistence::{NEIGHBORHOODS_KEY, Store, StoreError, load_record, save_record};

/// Persisted running totals for one neighborhood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodTotals {
    pub total_score: u64,
    pub total_players: u32,
}

impl NeighborhoodTotals {
    /// `round(total_score / total_players)`, 0 with no players
    pub fn average_score(&self) -> u64 {
        if self.total_players == 0 {
            return 0;
        }
        let players = u64::from(self.total_players);
        (self.total_score + players / 2) / players
    }
}

/// Display view of a neighborhood, average derived on read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeighborhoodStats {
    /// Normalized storage key
    pub key: String,
    /// Title-cased display name
    pub name: String,
    pub total_score: u64,
    pub total_players: u32,
    pub average_score: u64,
}

impl NeighborhoodStats {
    fn from_totals(key: &str, totals: &NeighborhoodTotals) -> Self {
        Self {
            key: key.to_string(),
            name: title_case(key),
            total_score: totals.total_score,
            total_players: totals.total_players,
            average_score: totals.average_score(),
        }
    }
}

/// Storage key for a neighborhood name
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Capitalize the first letter of every space-separated word
pub fn title_case(s: &str) -> String {
    s.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Neighborhood aggregate operations over a borrowed store
pub struct NeighborhoodAggregator<'s, S: Store + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: Store + ?Sized> NeighborhoodAggregator<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Count a newly registered player toward `name`
    pub fn register_new_player(&mut self, name: &str) -> Result<(), StoreError> {
        self.update(name, |totals| totals.total_players += 1)
    }

    /// Add a session score to `name`. Does not touch the player count.
    pub fn record_score(&mut self, name: &str, score: u64) -> Result<(), StoreError> {
        self.update(name, |totals| totals.total_score += score)
    }

    /// Raw persisted totals keyed by normalized name
    pub fn totals(&mut self) -> Result<BTreeMap<String, NeighborhoodTotals>, StoreError> {
        Ok(load_record(&mut *self.store, NEIGHBORHOODS_KEY)?.unwrap_or_default())
    }

    /// Every neighborhood keyed by display name, averages recomputed
    pub fn aggregated(&mut self) -> Result<BTreeMap<String, NeighborhoodStats>, StoreError> {
        Ok(self
            .stats()?
            .into_iter()
            .map(|stats| (stats.name.clone(), stats))
            .collect())
    }

    /// Every neighborhood in key order
    pub fn stats(&mut self) -> Result<Vec<NeighborhoodStats>, StoreError> {
        Ok(self
            .totals()?
            .iter()
            .map(|(key, totals)| NeighborhoodStats::from_totals(key, totals))
            .collect())
    }

    /// Read-modify-write of the whole map as one record
    fn update(
        &mut self,
        name: &str,
        apply: impl FnOnce(&mut NeighborhoodTotals),
    ) -> Result<(), StoreError> {
        let key = normalize_key(name);
        let mut all = self.totals()?;
        apply(all.entry(key).or_default());
        save_record(&mut *self.store, NEIGHBORHOODS_KEY, &all)
    }
}
