//! Scatter N independent checks onto worker tasks, gather their outcomes with
//! first-failure-wins reduction.
//!
//! ## Protocol
//!
//! 1. Every registered check is spawned as its own tokio task.
//! 2. Each task emits exactly one [`ValidationOutcome`] onto a bounded mpsc
//!    queue whose capacity equals the number of checks, so an emit never waits
//!    on the consumer.
//! 3. A coordinator task owns the join handles and one sender. Once every check
//!    task has finished it drops that sender, closing the queue. A check task
//!    that panicked (and therefore never emitted) is reported by the coordinator
//!    as an aborted failure in the slot the task left free.
//! 4. The caller consumes outcomes in arrival order and stops at the first
//!    invalid one. Checks still in flight are not cancelled; their outcomes are
//!    dropped.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type BoxedCheck<E> = Pin<Box<dyn Future<Output = ValidationOutcome<E>> + Send + 'static>>;

/// Result of one existence check. A failure always carries its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome<E> {
    reason: Option<E>,
}

impl<E> ValidationOutcome<E> {
    pub fn pass() -> Self {
        Self { reason: None }
    }

    pub fn fail(reason: E) -> Self {
        Self {
            reason: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.reason.is_none()
    }
}

/// Aggregate decision over all checks.
///
/// Only constructible through [`Verdict::valid`] and [`Verdict::invalid`], so
/// an invalid verdict always names its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict<E> {
    reason: Option<E>,
}

impl<E> Verdict<E> {
    pub fn valid() -> Self {
        Self { reason: None }
    }

    pub fn invalid(reason: E) -> Self {
        Self {
            reason: Some(reason),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.reason.is_none()
    }

    pub fn reason(&self) -> Option<&E> {
        self.reason.as_ref()
    }

    pub fn into_result(self) -> Result<(), E> {
        match self.reason {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}

/// A check task ended without emitting an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckAborted {
    pub label: &'static str,
    pub reason: String,
}

/// Builder for a set of independent checks.
///
/// The reason type `E` must be able to describe a check that never reported,
/// hence the `From<CheckAborted>` bound.
pub struct ScatterGather<E> {
    checks: Vec<(&'static str, BoxedCheck<E>)>,
}

impl<E> Default for ScatterGather<E> {
    fn default() -> Self {
        Self { checks: Vec::new() }
    }
}

impl<E> ScatterGather<E>
where
    E: From<CheckAborted> + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `label` (used in logs and abort reasons).
    pub fn check<F>(mut self, label: &'static str, check: F) -> Self
    where
        F: Future<Output = ValidationOutcome<E>> + Send + 'static,
    {
        self.checks.push((label, Box::pin(check)));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check concurrently and reduce the outcomes.
    ///
    /// Must be called from within a tokio runtime. With no checks registered the
    /// verdict is valid.
    pub async fn gather(self) -> Verdict<E> {
        let (tx, mut rx) = mpsc::channel::<ValidationOutcome<E>>(self.checks.len().max(1));

        let mut handles: Vec<(&'static str, JoinHandle<()>)> = Vec::with_capacity(self.checks.len());
        for (label, check) in self.checks {
            let tx = tx.clone();
            let handle = tokio::spawn(async move {
                let outcome = check.await;
                debug!(check = label, valid = outcome.is_valid(), "check finished");
                // Err only means the consumer already decided and hung up.
                let _ = tx.send(outcome).await;
            });
            handles.push((label, handle));
        }

        tokio::spawn(coordinate(handles, tx));

        while let Some(outcome) = rx.recv().await {
            if let Some(reason) = outcome.reason {
                return Verdict::invalid(reason);
            }
        }
        Verdict::valid()
    }
}

/// Wait for every check task, report the ones that died, then close the queue
/// by dropping the last sender.
async fn coordinate<E>(handles: Vec<(&'static str, JoinHandle<()>)>, tx: mpsc::Sender<ValidationOutcome<E>>)
where
    E: From<CheckAborted> + Send + 'static,
{
    for (label, handle) in handles {
        if let Err(join_err) = handle.await {
            warn!(check = label, error = %join_err, "check task aborted before reporting");
            let aborted = CheckAborted {
                label,
                reason: join_err.to_string(),
            };
            let _ = tx.send(ValidationOutcome::fail(E::from(aborted))).await;
        }
    }
    drop(tx);
}
