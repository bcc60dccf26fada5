//! Request tokens used to tell the latest request apart from superseded
//! ones.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Identifies one issued request. Tokens minted by the same
/// [`TokenSource`] are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints tokens for one owner and remembers which one is current.
///
/// Clones share state, so a spawned task can hold a clone and check its
/// token after the owner has moved on.
#[derive(Debug, Clone, Default)]
pub struct TokenSource {
    inner: Rc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    issued: Cell<u64>,
    // 0 when no token is current
    current: Cell<u64>,
    disposed: Cell<bool>,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new token, superseding every token minted before it.
    pub fn mint(&self) -> RequestToken {
        let next = self.inner.issued.get() + 1;
        self.inner.issued.set(next);
        if !self.inner.disposed.get() {
            self.inner.current.set(next);
        }
        RequestToken(next)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        !self.inner.disposed.get() && self.inner.current.get() == token.0
    }

    /// Make every outstanding token stale. The next [`mint`](Self::mint)
    /// produces a current token again.
    pub fn invalidate(&self) {
        self.inner.current.set(0);
    }

    /// Invalidate permanently; no token is ever current afterwards.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.invalidate();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}
