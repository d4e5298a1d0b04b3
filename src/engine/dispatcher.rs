//! Bounded-concurrency dispatcher.
//!
//! Runs the retry coordinator over the whole address list with at most
//! `max_concurrency` lookups in flight. A new address is admitted as soon as
//! any in-flight lookup completes; results are folded into the `ResultSet`
//! in completion order.

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::retry::RetryCoordinator;
use crate::types::ResultSet;

pub struct Dispatcher {
    coordinator: RetryCoordinator,
    max_concurrency: usize,
}

impl Dispatcher {
    /// A ceiling of zero is treated as one.
    pub fn new(coordinator: RetryCoordinator, max_concurrency: usize) -> Self {
        Self {
            coordinator,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Resolve every address. Surrounding whitespace is trimmed and blank
    /// entries are skipped; duplicates collapse to a single entry.
    pub async fn run_all(&self, addresses: &[String]) -> ResultSet {
        let pending: Vec<String> = addresses
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();
        let total = pending.len();

        info!(
            addresses = total,
            max_concurrency = self.max_concurrency,
            "Dispatching balance lookups"
        );

        let coordinator = &self.coordinator;
        let results = stream::iter(pending)
            .map(|address| async move {
                let outcome = coordinator.fetch_outcome(&address).await;
                (address, outcome)
            })
            .buffer_unordered(self.max_concurrency)
            .fold(ResultSet::new(), |mut results, (address, outcome)| async move {
                debug!(address = %address, resolved = outcome.is_some(), "Lookup complete");
                results.insert(address, outcome);
                results
            })
            .await;

        info!(
            submitted = total,
            distinct = results.len(),
            unresolved = results.values().filter(|o| o.is_none()).count(),
            "All lookups complete"
        );

        results
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
