//! Main-thread handoff
//!
//! Store and service calls run on the tokio worker pool. Anything that must
//! touch world state goes back to the single host thread through
//! [`HostHandle::run_on_main`], which queues a closure on the [`MainLoop`] and
//! waits for its result.

use crate::error::{ModReqError, Result};
use std::future::Future;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle for scheduling work on the main loop
#[derive(Debug, Clone)]
pub struct HostHandle {
    sender: mpsc::UnboundedSender<Job>,
}

impl HostHandle {
    /// Run `f` on the main thread and wait for its result
    ///
    /// Fails with [`ModReqError::HostUnavailable`] once the main loop has
    /// stopped.
    pub async fn run_on_main<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let job: Job = Box::new(move || {
            // The waiter may have been cancelled; nothing to do then
            let _ = reply.send(f());
        });

        self.sender
            .send(job)
            .map_err(|_| ModReqError::HostUnavailable)?;
        result.await.map_err(|_| ModReqError::HostUnavailable)
    }
}

/// Work queue drained on the thread that owns world state
#[derive(Debug)]
pub struct MainLoop {
    receiver: mpsc::UnboundedReceiver<Job>,
    handle: HostHandle,
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl MainLoop {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            receiver,
            handle: HostHandle { sender },
        }
    }

    #[must_use]
    pub fn handle(&self) -> HostHandle {
        self.handle.clone()
    }

    /// Run `future` on the worker pool while executing handed-back jobs on
    /// the calling thread, until `future` finishes
    ///
    /// Jobs still queued when the future completes are dropped and their
    /// callers see [`ModReqError::HostUnavailable`].
    pub fn run_until<F>(mut self, runtime: &Runtime, future: F) -> Result<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = runtime.spawn(future);
        debug!("Main loop started");

        let output = runtime.block_on(async {
            tokio::pin!(task);
            let mut jobs = 0_usize;
            loop {
                tokio::select! {
                    biased;
                    Some(job) = self.receiver.recv() => {
                        job();
                        jobs += 1;
                        trace!(jobs, "Ran main thread job");
                    },
                    result = &mut task => break result,
                }
            }
        });

        debug!("Main loop stopped");
        Ok(output?)
    }
}
