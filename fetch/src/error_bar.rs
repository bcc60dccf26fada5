//! The shared, page-level error surface.

use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use crate::{ErrorInfo, ErrorStrategy};

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBarEntry {
    pub id: Uuid,
    pub error: ErrorInfo,
}

impl ErrorBarEntry {
    pub fn new(error: ErrorInfo) -> Self {
        Self {
            id: Uuid::new_v4(),
            error,
        }
    }
}

/// How long an entry stays on the bar unless dismissed earlier.
pub const DEFAULT_ENTRY_DURATION: Duration = Duration::from_secs(5);

type Entries = watch::Sender<Vec<ErrorBarEntry>>;

/// Handle to the errors currently shown at the top of the page.
///
/// Cloning yields another handle to the same list. Views subscribe to
/// re-render when it changes. An error equal to one already shown replaces
/// it instead of stacking, so a request failing over and over occupies a
/// single entry.
///
/// Entries dismiss themselves after the configured duration. The timer is
/// a local task, so pushing then requires a [`tokio::task::LocalSet`].
#[derive(Clone)]
pub struct ErrorBar {
    entries: Rc<Entries>,
    duration: Option<Duration>,
}

impl Default for ErrorBar {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorBar {
    pub fn new() -> Self {
        Self::with_duration(Some(DEFAULT_ENTRY_DURATION))
    }

    /// `None` keeps entries until they are dismissed or cleared.
    pub fn with_duration(duration: Option<Duration>) -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self {
            entries: Rc::new(entries),
            duration,
        }
    }

    pub fn push(&self, error: ErrorInfo) -> Uuid {
        let entry = ErrorBarEntry::new(error);
        let id = entry.id;
        self.entries.send_modify(|entries| {
            // the previous entry's timer finds nothing to dismiss
            match entries.iter_mut().find(|e| e.error == entry.error) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        });

        if let Some(duration) = self.duration {
            let entries = Rc::downgrade(&self.entries);
            tokio::task::spawn_local(expire(entries, id, duration));
        }
        id
    }

    pub fn dismiss(&self, id: Uuid) {
        dismiss(&self.entries, id);
    }

    pub fn clear(&self) {
        self.entries.send_if_modified(|entries| {
            let had_entries = !entries.is_empty();
            entries.clear();
            had_entries
        });
    }

    pub fn entries(&self) -> Vec<ErrorBarEntry> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ErrorBarEntry>> {
        self.entries.subscribe()
    }

    /// Report a failed request according to the caller's strategy.
    pub(crate) fn report(&self, error: &ErrorInfo, strategy: ErrorStrategy) {
        match strategy {
            ErrorStrategy::Default => {
                tracing::error!(
                    status_code = error.status_code(),
                    code = error.code(),
                    "request failed: {error}"
                );
                self.push(error.clone());
            }
            ErrorStrategy::Custom => {
                tracing::debug!(
                    status_code = error.status_code(),
                    code = error.code(),
                    "request failed, handled by caller: {error}"
                );
            }
        }
    }
}

fn dismiss(entries: &Entries, id: Uuid) {
    entries.send_if_modified(|entries| {
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    });
}

async fn expire(entries: Weak<Entries>, id: Uuid, duration: Duration) {
    tokio::time::sleep(duration).await;
    if let Some(entries) = entries.upgrade() {
        dismiss(&entries, id);
    }
}
