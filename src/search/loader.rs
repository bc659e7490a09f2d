use super::{SearchQuery, SearchResult, SearchSupplier};
use crate::error::SupplyError;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Data that may still be in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loadable<T> {
    Loading,
    Ready(T),
    Failed(String),
}

enum Command {
    Query { ticket: u64, query: SearchQuery },
    Shutdown,
}

struct Response {
    ticket: u64,
    outcome: Result<Vec<SearchResult>, String>,
}

/// Runs a [`SearchSupplier`] on a worker thread.
///
/// Every request gets a new ticket; only the response carrying the latest
/// ticket is accepted, so results of superseded queries never reach the view.
pub struct SearchLoader {
    command_tx: Sender<Command>,
    response_rx: Receiver<Response>,
    ticket: u64,
    current: Option<SearchQuery>,
    state: Loadable<Vec<SearchResult>>,
    worker: Option<JoinHandle<()>>,
}

impl SearchLoader {
    pub fn spawn<S>(supplier: S) -> Self
    where
        S: SearchSupplier + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (response_tx, response_rx) = mpsc::channel();
        let worker = thread::spawn(move || worker_loop(&supplier, command_rx, response_tx));
        SearchLoader {
            command_tx,
            response_rx,
            ticket: 0,
            current: None,
            state: Loadable::Loading,
            worker: Some(worker),
        }
    }

    /// Ask for `query`. Repeating the current query does nothing.
    pub fn request(&mut self, query: &SearchQuery) {
        if self.current.as_ref() == Some(query) {
            return;
        }
        self.ticket += 1;
        self.current = Some(query.clone());
        self.state = Loadable::Loading;
        debug!(ticket = self.ticket, ?query, "search requested");
        let command = Command::Query {
            ticket: self.ticket,
            query: query.clone(),
        };
        if self.command_tx.send(command).is_err() {
            self.state = Loadable::Failed(SupplyError::WorkerGone.to_string());
        }
    }

    /// Drain finished responses. Returns `true` when the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.response_rx.try_recv() {
                Ok(response) => changed |= self.accept(response),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    changed |= self.mark_worker_gone();
                    break;
                }
            }
        }
        changed
    }

    /// Block until the latest request settles or `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> &Loadable<Vec<SearchResult>> {
        let deadline = Instant::now() + timeout;
        while self.state == Loadable::Loading {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.response_rx.recv_timeout(remaining) {
                Ok(response) => {
                    self.accept(response);
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => {
                    self.mark_worker_gone();
                }
            }
        }
        &self.state
    }

    pub fn state(&self) -> &Loadable<Vec<SearchResult>> {
        &self.state
    }

    fn accept(&mut self, response: Response) -> bool {
        if response.ticket != self.ticket {
            trace!(stale = response.ticket, latest = self.ticket, "dropping stale search response");
            return false;
        }
        self.state = match response.outcome {
            Ok(results) => Loadable::Ready(results),
            Err(message) => {
                warn!(%message, "search failed");
                Loadable::Failed(message)
            }
        };
        true
    }

    fn mark_worker_gone(&mut self) -> bool {
        if self.state != Loadable::Loading {
            return false;
        }
        self.state = Loadable::Failed(SupplyError::WorkerGone.to_string());
        true
    }
}

impl Drop for SearchLoader {
    fn drop(&mut self) {
        let _ = self.command_tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop<S: SearchSupplier>(
    supplier: &S,
    command_rx: Receiver<Command>,
    response_tx: Sender<Response>,
) {
    while let Ok(command) = command_rx.recv() {
        let Command::Query {
            mut ticket,
            mut query,
        } = command
        else {
            break;
        };
        // Skip straight to the newest queued query.
        loop {
            match command_rx.try_recv() {
                Ok(Command::Query {
                    ticket: newer,
                    query: newer_query,
                }) => {
                    ticket = newer;
                    query = newer_query;
                }
                Ok(Command::Shutdown) => return,
                Err(_) => break,
            }
        }
        let outcome = supplier
            .search(&query.to_wire())
            .map_err(|err| err.to_string());
        if response_tx.send(Response { ticket, outcome }).is_err() {
            break;
        }
    }
}
