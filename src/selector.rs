use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, error};

use crate::error::{Result, ShuffleError};
use crate::types::{BookmarkNode, SelectionMethod};

/// Outcome of one selection.
#[derive(Debug, PartialEq, Eq)]
pub struct Selection<'a> {
    pub entry: Option<&'a BookmarkNode>,
    /// Consumed ids to persist; `None` when the strategy keeps no state.
    pub consumed: Option<Vec<String>>,
}

impl Selection<'_> {
    fn none() -> Self {
        Selection { entry: None, consumed: None }
    }
}

pub struct Selector {
    rng: Mutex<StdRng>,
}

impl Selector {
    pub fn new() -> Self {
        Selector { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn seeded(seed: u64) -> Self {
        Selector { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    pub fn select<'a>(
        &self,
        candidates: &[&'a BookmarkNode],
        method: SelectionMethod,
        consumed: &[String],
    ) -> Result<Selection<'a>> {
        if candidates.is_empty() {
            return Ok(Selection::none());
        }
        match method {
            SelectionMethod::Random => {
                let idx = self.rng.lock().gen_range(0..candidates.len());
                Ok(Selection { entry: Some(candidates[idx]), consumed: None })
            }
            SelectionMethod::RandomConsume => self.select_consume(candidates, consumed),
            SelectionMethod::RandomWeighted => Err(ShuffleError::NotImplemented("weighted random selection")),
        }
    }

    fn select_consume<'a>(&self, candidates: &[&'a BookmarkNode], consumed: &[String]) -> Result<Selection<'a>> {
        let seen: HashSet<&str> = consumed.iter().map(String::as_str).collect();
        let mut unselected: Vec<&str> = candidates
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| !seen.contains(id))
            .collect();
        let mut consumed = consumed.to_vec();

        // every candidate has been opened once: start over
        if unselected.is_empty() {
            let last = consumed.pop();
            consumed.clear();
            unselected = candidates.iter().map(|n| n.id.as_str()).collect();
            // never open the same bookmark twice in a row across the reset
            if unselected.len() > 1 {
                if let Some(last) = last.as_deref() {
                    unselected.retain(|id| *id != last);
                }
            }
            debug!(candidates = candidates.len(), "consumed every candidate, resetting");
        }

        let id = unselected[self.rng.lock().gen_range(0..unselected.len())].to_string();
        let entry = match candidates.iter().find(|n| n.id == id) {
            Some(node) => *node,
            None => {
                error!(%id, "selected id is not among the candidates");
                return Err(ShuffleError::Consistency(id));
            }
        };
        consumed.push(id);
        Ok(Selection { entry: Some(entry), consumed: Some(consumed) })
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}
