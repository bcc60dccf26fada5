//! Single-shot fetching: one request per dependency key, with refetch.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tokio::sync::watch;

use crate::{
    ErrorBar, ErrorInfo, ErrorStrategy, FetchState, RequestToken, TokenSource,
};

pub(crate) type Operation<T> =
    Rc<dyn Fn() -> LocalBoxFuture<'static, Result<T, ErrorInfo>>>;

pub(crate) fn boxed_operation<T, F, Fut, E>(operation: F) -> Operation<T>
where
    T: 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
    E: Into<ErrorInfo>,
{
    Rc::new(move || operation().map(|r| r.map_err(Into::into)).boxed_local())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// What happens to already fetched data while a new request is loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StaleData {
    /// Keep showing the previous data until the new request settles.
    #[default]
    Keep,
    /// Drop the previous data as soon as a new request starts.
    Clear,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub error_strategy: ErrorStrategy,
    pub stale_data: StaleData,
}

impl FetchOptions {
    /// Errors are only exposed to the caller, never on the error bar.
    pub fn custom_errors() -> Self {
        Self {
            error_strategy: ErrorStrategy::Custom,
            ..Self::default()
        }
    }

    pub fn stale_data(mut self, stale_data: StaleData) -> Self {
        self.stale_data = stale_data;
        self
    }
}

/// Outcome of one settled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The result was written to the state.
    Applied(Status),
    /// The request was superseded or its owner went away; the result was
    /// dropped without touching the state.
    Stale,
}

/// Read model handed to views.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReturn<T> {
    pub data: FetchState<T>,
    pub is_loading: bool,
    pub error: Option<ErrorInfo>,
    pub status: Status,
}

impl<T> Default for FetchReturn<T> {
    fn default() -> Self {
        Self {
            data: FetchState::NotFetched,
            is_loading: false,
            error: None,
            status: Status::Idle,
        }
    }
}

impl<T> FetchReturn<T> {
    /// Returns true if this is the initial load (data not yet fetched,
    /// currently loading, and no error).
    pub fn is_initial_loading(&self) -> bool {
        self.is_loading && !self.data.is_fetched() && self.error.is_none()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }
}

/// State shared between an owner and the tasks it spawned.
pub(crate) struct RequestCore<T> {
    pub(crate) state: watch::Sender<FetchReturn<T>>,
    pub(crate) tokens: TokenSource,
    pub(crate) operation: RefCell<Option<Operation<T>>>,
    options: FetchOptions,
    error_bar: ErrorBar,
}

impl<T: Clone + 'static> RequestCore<T> {
    pub(crate) fn new(options: FetchOptions, error_bar: ErrorBar) -> Self {
        let (state, _) = watch::channel(FetchReturn::default());
        Self {
            state,
            tokens: TokenSource::new(),
            operation: RefCell::new(None),
            options,
            error_bar,
        }
    }

    pub(crate) fn set_operation(&self, operation: Operation<T>) {
        *self.operation.borrow_mut() = Some(operation);
    }

    /// Mint a token and move to loading. Returns `None` once disposed or
    /// when no operation was provided yet.
    pub(crate) fn begin(&self) -> Option<(RequestToken, Operation<T>)> {
        if self.tokens.is_disposed() {
            return None;
        }
        let operation = self.operation.borrow().clone()?;
        let token = self.tokens.mint();
        tracing::debug!(%token, "request started");

        let stale_data = self.options.stale_data;
        self.state.send_modify(|state| {
            state.status = Status::Loading;
            state.is_loading = true;
            state.error = None;
            if stale_data == StaleData::Clear {
                state.data = FetchState::NotFetched;
            }
        });
        Some((token, operation))
    }

    pub(crate) async fn attempt(
        &self,
        token: RequestToken,
        operation: Operation<T>,
    ) -> Settlement {
        let result = operation().await;
        self.settle(token, result)
    }

    /// Apply a result, but only if `token` is still the current one.
    pub(crate) fn settle(
        &self,
        token: RequestToken,
        result: Result<T, ErrorInfo>,
    ) -> Settlement {
        if !self.tokens.is_current(token) {
            tracing::debug!(%token, "dropping stale result");
            return Settlement::Stale;
        }

        match result {
            Ok(data) => {
                tracing::trace!(%token, "request succeeded");
                self.state.send_modify(|state| {
                    state.data = FetchState::Fetched(data);
                    state.error = None;
                    state.status = Status::Success;
                    state.is_loading = false;
                });
                Settlement::Applied(Status::Success)
            }
            Err(error) => {
                self.error_bar.report(&error, self.options.error_strategy);
                // previously fetched data stays visible next to the error
                self.state.send_modify(|state| {
                    state.error = Some(error);
                    state.status = Status::Error;
                    state.is_loading = false;
                });
                Settlement::Applied(Status::Error)
            }
        }
    }

    /// Start a request in the background.
    pub(crate) fn spawn(self: &Rc<Self>) {
        if let Some((token, operation)) = self.begin() {
            let core = self.clone();
            tokio::task::spawn_local(async move {
                core.attempt(token, operation).await;
            });
        }
    }

    pub(crate) fn snapshot(&self) -> FetchReturn<T> {
        self.state.borrow().clone()
    }
}

trait Refetchable {
    fn refetch(self: Rc<Self>);
}

impl<T: Clone + 'static> Refetchable for RequestCore<T> {
    fn refetch(self: Rc<Self>) {
        self.spawn();
    }
}

/// Cloneable handle that re-issues a fetcher's request, e.g. from a
/// settings form after it saved.
///
/// Does nothing once the fetcher is gone or disposed.
#[derive(Clone)]
pub struct Refetch {
    core: Weak<dyn Refetchable>,
}

impl Refetch {
    pub fn emit(&self) {
        if let Some(core) = self.core.upgrade() {
            core.refetch();
        }
    }
}

/// Owns the request state of one piece of remote data.
///
/// [`execute`](Self::execute) issues the request the first time it sees a
/// key and again whenever the key changes; results of superseded requests
/// are discarded. Dropping the fetcher disposes it.
pub struct Fetcher<T: Clone + 'static, K: PartialEq = ()> {
    core: Rc<RequestCore<T>>,
    key: Option<K>,
}

impl<T: Clone + 'static, K: PartialEq> Fetcher<T, K> {
    pub fn new(options: FetchOptions, error_bar: ErrorBar) -> Self {
        Self {
            core: Rc::new(RequestCore::new(options, error_bar)),
            key: None,
        }
    }

    /// Associate the fetcher with `key`, issuing `operation` if the key is
    /// new. With an unchanged key only the stored operation is replaced, so
    /// later refetches use the latest closure.
    pub fn execute<F, Fut, E>(&mut self, key: K, operation: F) -> FetchReturn<T>
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
        E: Into<ErrorInfo>,
    {
        self.core.set_operation(boxed_operation(operation));
        if self.key.as_ref() != Some(&key) {
            self.key = Some(key);
            self.core.spawn();
        }
        self.snapshot()
    }

    /// Re-issue the current operation with a fresh token, key or not.
    pub fn refetch(&self) {
        self.core.spawn();
    }

    pub fn refetch_handle(&self) -> Refetch {
        let core: Rc<dyn Refetchable> = self.core.clone();
        Refetch {
            core: Rc::downgrade(&core),
        }
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn snapshot(&self) -> FetchReturn<T> {
        self.core.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchReturn<T>> {
        self.core.state.subscribe()
    }

    /// Invalidate the in-flight request, if any, and refuse new ones. The
    /// state is left as it was.
    pub fn dispose(&mut self) {
        if !self.core.tokens.is_disposed() {
            tracing::debug!("fetcher disposed");
        }
        self.core.tokens.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.core.tokens.is_disposed()
    }
}

impl<T: Clone + 'static, K: PartialEq> Drop for Fetcher<T, K> {
    fn drop(&mut self) {
        self.dispose();
    }
}
