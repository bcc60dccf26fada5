//! Request lifecycle shared by every dashboard page.
//!
//! A page owns one [`Fetcher`] per piece of remote data it shows, or a
//! [`PollingController`] when it has to wait for a backend job. Both publish
//! the same read model (data, loading flag, error) and guarantee that a
//! response can only change state while the request that produced it is
//! still the latest one issued by its owner.
//!
//! Everything here is single threaded: tasks are started with
//! [`tokio::task::spawn_local`], so owners must live inside a
//! [`tokio::task::LocalSet`].

pub mod error;
pub mod error_bar;
pub mod polling;
pub mod request;
pub mod token;

pub use error::{ErrorInfo, ErrorStrategy};
pub use error_bar::{ErrorBar, ErrorBarEntry};
pub use polling::{PollingController, PollingReturn, SessionStatus};
pub use request::{
    FetchOptions, FetchReturn, Fetcher, Refetch, Settlement, StaleData, Status,
};
pub use token::{RequestToken, TokenSource};

/// Distinguishes "never fetched" from "fetched", independent of whether the
/// fetched value is itself empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FetchState<T> {
    #[default]
    NotFetched,
    Fetched(T),
}

impl<T> FetchState<T> {
    pub fn is_fetched(&self) -> bool {
        matches!(self, FetchState::Fetched(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            FetchState::NotFetched => None,
            FetchState::Fetched(data) => Some(data),
        }
    }
}
