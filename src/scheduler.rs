//! Background refresh.
//!
//! Keeps an idle session's distances from going stale: a worker thread
//! wakes every `check_interval` and asks the orchestrator to recompute if
//! the TTL has run out. Stopping (or dropping) the scheduler cancels the
//! worker; there is no free-running timer left behind.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::orchestrator::ProximityOrchestrator;
use crate::traits::{Clock, KeyValueStore, RoutedDistanceProvider};

#[derive(Debug)]
pub struct RefreshScheduler {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    pub fn start<P, S, C>(
        orchestrator: Arc<ProximityOrchestrator<P, S, C>>,
        check_interval: Duration,
    ) -> io::Result<Self>
    where
        P: RoutedDistanceProvider + 'static,
        S: KeyValueStore + 'static,
        C: Clock + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("proximity-refresh".to_string())
            .spawn(move || {
                loop {
                    match cancelled.recv_timeout(check_interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if orchestrator.is_closed() {
                                break;
                            }
                            orchestrator.refresh_if_due();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("refresh scheduler stopped");
            })?;

        Ok(Self {
            cancel: Some(cancel),
            worker: Some(worker),
        })
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|worker| !worker.is_finished())
    }

    /// Cancel the worker and wait for it. A tick already in progress
    /// finishes first.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("refresh worker panicked; background refresh had stopped");
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// An orchestrator bound to its background scheduler for the lifetime of a
/// host scope. Closing (or dropping) the session tears both down.
pub struct ProximitySession<P, S, C>
where
    P: RoutedDistanceProvider + 'static,
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    orchestrator: Arc<ProximityOrchestrator<P, S, C>>,
    scheduler: RefreshScheduler,
}

impl<P, S, C> ProximitySession<P, S, C>
where
    P: RoutedDistanceProvider + 'static,
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    /// Wrap `orchestrator` and start refreshing it at its configured
    /// check interval.
    pub fn start(orchestrator: ProximityOrchestrator<P, S, C>) -> io::Result<Self> {
        let check_interval = orchestrator.check_interval();
        let orchestrator = Arc::new(orchestrator);
        let scheduler = RefreshScheduler::start(Arc::clone(&orchestrator), check_interval)?;
        Ok(Self {
            orchestrator,
            scheduler,
        })
    }

    pub fn orchestrator(&self) -> &ProximityOrchestrator<P, S, C> {
        &self.orchestrator
    }

    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn close(&mut self) {
        self.orchestrator.close();
        self.scheduler.stop();
    }
}

impl<P, S, C> Drop for ProximitySession<P, S, C>
where
    P: RoutedDistanceProvider + 'static,
    S: KeyValueStore + 'static,
    C: Clock + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}
