//! Last-write-wins query sessions
//!
//! A UI session issues a new query every time its inputs change. Starting a
//! query supersedes the previous one: its in-flight work is abandoned at the
//! next await point and its result is never published.

use std::future::Future;

use tokio::sync::watch;
use tracing::debug;

use crate::{Result, TravelAssistantError};

/// Hands out query tokens for one UI session
#[derive(Debug)]
pub struct PlanSession {
    generation: watch::Sender<u64>,
}

impl Default for PlanSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PlanSession {
    #[must_use]
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Start a new query, cancelling whatever query was current
    pub fn begin(&self) -> QueryToken {
        let mut id = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            id = *generation;
        });
        debug!("Started query {}", id);
        QueryToken {
            id,
            current: self.generation.subscribe(),
        }
    }

    /// True while `query` is the latest query of this session
    #[must_use]
    pub fn is_current(&self, query: u64) -> bool {
        *self.generation.borrow() == query
    }

    /// Cancel the current query without starting another one
    pub fn cancel(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }
}

/// Identifies one query of a session
#[derive(Debug, Clone)]
pub struct QueryToken {
    id: u64,
    current: watch::Receiver<u64>,
}

impl QueryToken {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// False once a newer query started or the query was cancelled
    #[must_use]
    pub fn is_current(&self) -> bool {
        *self.current.borrow() == self.id
    }

    /// Resolves when this query is superseded
    pub async fn superseded(&mut self) {
        loop {
            if *self.current.borrow_and_update() != self.id {
                return;
            }
            if self.current.changed().await.is_err() {
                // session dropped, nothing can supersede us anymore
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `work` until it finishes or the query is superseded.
    ///
    /// A result that completes after the query was superseded is discarded.
    pub async fn run<F, T>(&mut self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let id = self.id;
        let output = tokio::select! {
            biased;
            () = self.superseded() => None,
            output = work => Some(output),
        };

        match output {
            Some(output) if self.is_current() => output,
            _ => {
                debug!("Discarding result of superseded query {}", id);
                Err(TravelAssistantError::Cancelled)
            }
        }
    }
}
