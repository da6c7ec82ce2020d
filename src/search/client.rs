use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::model::{SearchError, SearchEvent, SearchOutcome, SearchProvider};

struct SearchRequest {
    generation: u64,
    query: String,
}

/// Runs searches off the UI thread for a single search box.
///
/// Every `submit` supersedes the previous one: outcomes for older
/// generations are dropped on arrival, and queued queries that are already
/// stale are never sent to the provider.
pub struct SearchClient {
    tx: Option<Sender<SearchRequest>>,
    events_tx: Sender<SearchEvent>,
    events: Receiver<SearchEvent>,
    latest: Arc<AtomicU64>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl SearchClient {
    pub fn spawn(provider: Arc<dyn SearchProvider>) -> Self {
        let (tx, rx) = mpsc::channel::<SearchRequest>();
        let (events_tx, events) = mpsc::channel::<SearchEvent>();
        let latest = Arc::new(AtomicU64::new(0));

        let worker = spawn_search_thread(provider, rx, events_tx.clone(), latest.clone());

        Self {
            tx: Some(tx),
            events_tx,
            events,
            latest,
            join: Mutex::new(Some(worker)),
        }
    }

    /// Issue `query`, superseding any earlier one. Returns its generation.
    ///
    /// A blank query resolves immediately to an empty result without
    /// reaching the provider.
    pub fn submit(&self, query: &str) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        let query = query.trim().to_string();

        if query.is_empty() {
            let _ = self.events_tx.send(SearchEvent {
                generation,
                query,
                outcome: SearchOutcome::Found(Vec::new()),
            });
            return generation;
        }

        debug!(generation, %query, "search submitted");
        let sent = self
            .tx
            .as_ref()
            .map(|tx| tx.send(SearchRequest {
                generation,
                query: query.clone(),
            }))
            .is_some_and(|r| r.is_ok());
        if !sent {
            warn!(generation, "search worker is gone");
            let _ = self.events_tx.send(SearchEvent {
                generation,
                query,
                outcome: SearchOutcome::Failed(SearchError::Transport(
                    "search worker stopped".to_string(),
                )),
            });
        }
        generation
    }

    /// Generation of the most recently submitted query (0 before any).
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Forget the current query so any in-flight outcome is discarded.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    /// Non-blocking: the current query's outcome if it has arrived.
    /// Stale outcomes received along the way are discarded.
    pub fn poll(&self) -> Option<SearchEvent> {
        let mut current = None;
        while let Ok(event) = self.events.try_recv() {
            if let Some(event) = self.accept(event) {
                current = Some(event);
            }
        }
        current
    }

    /// Block up to `timeout` for the current query's outcome.
    #[cfg(test)]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<SearchEvent> {
        use std::sync::mpsc::RecvTimeoutError;
        use std::time::Instant;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => {
                    if let Some(event) = self.accept(event) {
                        return Some(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None;
                }
            }
        }
    }

    fn accept(&self, event: SearchEvent) -> Option<SearchEvent> {
        if event.generation == self.latest_generation() {
            Some(event)
        } else {
            debug!(
                generation = event.generation,
                latest = self.latest_generation(),
                "discarding superseded search outcome"
            );
            None
        }
    }
}

impl Drop for SearchClient {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        self.tx.take();
        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

fn spawn_search_thread(
    provider: Arc<dyn SearchProvider>,
    rx: Receiver<SearchRequest>,
    events_tx: Sender<SearchEvent>,
    latest: Arc<AtomicU64>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(mut request) = rx.recv() {
            // Only the newest queued request matters.
            while let Ok(newer) = rx.try_recv() {
                request = newer;
            }
            if request.generation != latest.load(Ordering::Acquire) {
                debug!(generation = request.generation, "skipping stale search");
                continue;
            }

            let outcome = match provider.search(&request.query) {
                Ok(candidates) => SearchOutcome::Found(candidates),
                Err(e) => {
                    warn!(query = %request.query, error = %e, "search failed");
                    SearchOutcome::Failed(e)
                }
            };

            if events_tx
                .send(SearchEvent {
                    generation: request.generation,
                    query: request.query,
                    outcome,
                })
                .is_err()
            {
                break;
            }
        }
    })
}
