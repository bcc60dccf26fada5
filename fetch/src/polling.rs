//! Repeat a request at a fixed interval until a predicate says it is done.
//!
//! Attempts of one session never overlap: the next attempt is scheduled
//! only after the previous one settled, success or error. Errors do not end
//! a session by themselves; only the predicate or [`PollingController::stop`]
//! does. There is no attempt cap and no backoff.

use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::request::{Operation, RequestCore, boxed_operation};
use crate::{
    ErrorBar, ErrorInfo, FetchOptions, FetchReturn, FetchState, RequestToken,
    Settlement, Status,
};

type ShouldContinue<T> = Rc<dyn Fn(Option<&T>, Option<&ErrorInfo>) -> bool>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStatus {
    pub active: bool,
    /// Requests issued so far in the current session.
    pub attempt_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollingReturn<T> {
    pub data: FetchState<T>,
    pub is_loading: bool,
    pub error: Option<ErrorInfo>,
    pub is_polling: bool,
    pub attempt_count: u32,
}

impl<T> PollingReturn<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

/// Drives polling sessions for one consumer. At most one session runs at a
/// time; dropping the controller ends it.
pub struct PollingController<T: Clone + 'static> {
    core: Rc<RequestCore<T>>,
    session: Rc<watch::Sender<SessionStatus>>,
    cancel: Option<CancellationToken>,
}

impl<T: Clone + 'static> PollingController<T> {
    pub fn new(options: FetchOptions, error_bar: ErrorBar) -> Self {
        let (session, _) = watch::channel(SessionStatus::default());
        Self {
            core: Rc::new(RequestCore::new(options, error_bar)),
            session: Rc::new(session),
            cancel: None,
        }
    }

    /// Start a new session, stopping the running one first.
    ///
    /// The first attempt is issued immediately. After every settlement
    /// `should_continue(data, error)` is evaluated against the current state
    /// and, while it returns true, the next attempt follows `interval` later.
    pub fn start_polling<F, Fut, E, P>(
        &mut self,
        operation: F,
        should_continue: P,
        interval: Duration,
    ) where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Into<ErrorInfo>,
        P: Fn(Option<&T>, Option<&ErrorInfo>) -> bool + 'static,
    {
        self.stop();

        self.core.set_operation(boxed_operation(operation));
        let Some(first) = self.core.begin() else {
            return;
        };

        tracing::debug!(?interval, "polling started");
        let cancel = CancellationToken::new();
        self.session.send_replace(SessionStatus {
            active: true,
            attempt_count: 1,
        });
        tokio::task::spawn_local(run_session(
            self.core.clone(),
            self.session.clone(),
            Rc::new(should_continue),
            interval,
            cancel.clone(),
            first,
        ));
        self.cancel = Some(cancel);
    }

    /// End the session, cancelling the pending attempt. Calling it again, or
    /// after the predicate already ended the session, changes nothing.
    pub fn stop(&mut self) {
        let Some(cancel) = self.cancel.take() else {
            return;
        };
        cancel.cancel();
        self.core.tokens.invalidate();

        let was_active = self.session.send_if_modified(|session| {
            let was_active = session.active;
            session.active = false;
            was_active
        });
        if was_active {
            tracing::debug!("polling stopped");
            // the cancelled attempt will never settle
            self.core.state.send_if_modified(|state| {
                if state.status != Status::Loading {
                    return false;
                }
                state.is_loading = false;
                state.status = match (&state.error, &state.data) {
                    (Some(_), _) => Status::Error,
                    (None, FetchState::Fetched(_)) => Status::Success,
                    (None, FetchState::NotFetched) => Status::Idle,
                };
                true
            });
        }
    }

    pub fn is_polling(&self) -> bool {
        self.session.borrow().active
    }

    pub fn attempt_count(&self) -> u32 {
        self.session.borrow().attempt_count
    }

    pub fn snapshot(&self) -> PollingReturn<T> {
        let FetchReturn {
            data,
            is_loading,
            error,
            ..
        } = self.core.snapshot();
        let session = *self.session.borrow();
        PollingReturn {
            data,
            is_loading,
            error,
            is_polling: session.active,
            attempt_count: session.attempt_count,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchReturn<T>> {
        self.core.state.subscribe()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionStatus> {
        self.session.subscribe()
    }
}

impl<T: Clone + 'static> Drop for PollingController<T> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.core.tokens.dispose();
    }
}

async fn run_session<T: Clone + 'static>(
    core: Rc<RequestCore<T>>,
    session: Rc<watch::Sender<SessionStatus>>,
    should_continue: ShouldContinue<T>,
    interval: Duration,
    cancel: CancellationToken,
    first: (RequestToken, Operation<T>),
) {
    let (mut token, mut operation) = first;
    loop {
        let settlement = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            settlement = core.attempt(token, operation) => settlement,
        };
        if settlement == Settlement::Stale {
            return;
        }

        let (data, error) = {
            let state = core.state.borrow();
            (state.data.clone(), state.error.clone())
        };
        if !should_continue(data.as_ref(), error.as_ref()) {
            session.send_modify(|session| session.active = false);
            tracing::debug!(
                attempts = session.borrow().attempt_count,
                "polling finished"
            );
            return;
        }

        tracing::trace!(%token, ?interval, "scheduling next attempt");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }

        let Some(next) = core.begin() else {
            return;
        };
        (token, operation) = next;
        session.send_modify(|session| session.attempt_count += 1);
    }
}
