//! Request lifecycle for the results page.
//!
//! The controller owns a single cancellation slot. Starting a request
//! cancels whatever token is in the slot and stores a fresh one; a request
//! only applies its outcome while its token is still uncancelled, checked
//! under the same lock that guards the slot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{Mode, QueryParams},
    protocol::ValidateRequest,
};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{error::ClientError, report::Report, ValidationApi};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    /// The page was opened without an idea; nothing is requested.
    MissingIdea,
    #[default]
    Loading,
    Success(Report),
    Error(String),
}

/// State together with the parameters that produced it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchSnapshot {
    pub params: QueryParams,
    pub state: FetchState,
}

/// What a single trigger ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    MissingIdea,
    /// The request finished and its state was published.
    Applied(FetchState),
    /// The request was cancelled, by a newer one or by the consumer leaving;
    /// nothing was published.
    Superseded,
}

#[derive(Default)]
struct InflightSlot {
    token: Option<CancellationToken>,
    last_params: Option<QueryParams>,
}

enum Started {
    MissingIdea,
    Pending(PendingFetch),
}

struct PendingFetch {
    params: QueryParams,
    token: CancellationToken,
}

struct FetchCore {
    api: Arc<dyn ValidationApi>,
    state: watch::Sender<FetchSnapshot>,
    inflight: Mutex<InflightSlot>,
}

/// Handle owned by the page. Spawned requests only hold the shared state, so
/// dropping the handle abandons whatever is still in flight.
pub struct ReportFetchController {
    core: Arc<FetchCore>,
}

impl ReportFetchController {
    pub fn new(api: Arc<dyn ValidationApi>) -> Self {
        let (state, _) = watch::channel(FetchSnapshot::default());
        Self {
            core: Arc::new(FetchCore {
                api,
                state,
                inflight: Mutex::new(InflightSlot::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchSnapshot> {
        self.core.state.subscribe()
    }

    pub fn snapshot(&self) -> FetchSnapshot {
        self.core.state.borrow().clone()
    }

    pub fn last_params(&self) -> Option<QueryParams> {
        self.core.slot().last_params.clone()
    }

    /// Cancels any outstanding request, then validates `params` and publishes
    /// the outcome unless a newer trigger or [`cancel`](Self::cancel)
    /// supersedes it first.
    pub async fn fetch(&self, params: QueryParams) -> FetchOutcome {
        match self.core.start(params) {
            Started::MissingIdea => FetchOutcome::MissingIdea,
            Started::Pending(pending) => self.core.finish(pending).await,
        }
    }

    /// Like [`fetch`](Self::fetch), but the cancel-and-restart step happens
    /// before this returns, so triggers take effect in call order.
    pub fn spawn_fetch(&self, params: QueryParams) -> JoinHandle<FetchOutcome> {
        let started = self.core.start(params);
        let core = Arc::clone(&self.core);
        tokio::spawn(async move {
            match started {
                Started::MissingIdea => FetchOutcome::MissingIdea,
                Started::Pending(pending) => core.finish(pending).await,
            }
        })
    }

    /// Repeats the last trigger from scratch.
    pub async fn retry(&self) -> FetchOutcome {
        let params = self.last_params().unwrap_or_default();
        self.fetch(params).await
    }

    /// Repeats the last trigger with another analysis mode.
    pub async fn rerun(&self, mode: Mode) -> FetchOutcome {
        let params = QueryParams {
            mode,
            ..self.last_params().unwrap_or_default()
        };
        self.fetch(params).await
    }

    /// Abandons the in-flight request, if any. The published state is left
    /// untouched.
    pub fn cancel(&self) {
        self.core.cancel();
    }
}

impl Drop for ReportFetchController {
    fn drop(&mut self) {
        self.core.cancel();
    }
}

impl FetchCore {
    fn cancel(&self) {
        if let Some(token) = self.slot().token.take() {
            debug!("abandoning in-flight validation request");
            token.cancel();
        }
    }

    fn start(&self, params: QueryParams) -> Started {
        let mut slot = self.slot();
        if let Some(previous) = slot.token.take() {
            debug!("cancelling superseded validation request");
            previous.cancel();
        }
        slot.last_params = Some(params.clone());

        if !params.has_idea() {
            self.publish(params, FetchState::MissingIdea);
            return Started::MissingIdea;
        }

        let token = CancellationToken::new();
        slot.token = Some(token.clone());
        self.publish(params.clone(), FetchState::Loading);
        Started::Pending(PendingFetch { params, token })
    }

    async fn finish(&self, pending: PendingFetch) -> FetchOutcome {
        let PendingFetch { params, token } = pending;
        let request = ValidateRequest::new(params.trimmed_idea(), params.mode);
        info!(mode = %params.mode, "validating idea");

        // Dropping the request future on cancellation aborts the HTTP call.
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::Cancelled),
            result = self.api.validate(&request) => result,
        };

        let mut slot = self.slot();
        if token.is_cancelled() {
            debug!(mode = %params.mode, "discarding outcome of cancelled request");
            return FetchOutcome::Superseded;
        }
        slot.token = None;

        let state = match result {
            Ok(report) => {
                info!(mode = %params.mode, "validation succeeded");
                FetchState::Success(report)
            }
            Err(err) if err.is_cancelled() => return FetchOutcome::Superseded,
            Err(err) => {
                warn!(mode = %params.mode, error = %err, "validation failed");
                FetchState::Error(err.user_message())
            }
        };
        self.publish(params, state.clone());
        FetchOutcome::Applied(state)
    }

    fn publish(&self, params: QueryParams, state: FetchState) {
        self.state.send_replace(FetchSnapshot { params, state });
    }

    fn slot(&self) -> MutexGuard<'_, InflightSlot> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
