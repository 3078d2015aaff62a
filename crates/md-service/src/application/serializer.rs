//! CommandSerializer: at most one device command in flight at a time.
//!
//! The recorder is a stateful device that executes exactly one operation
//! at a time; sending a second command while one is outstanding corrupts
//! the first. Every stateful facade method acquires a [`CommandPermit`]
//! before touching the device, regardless of how many UI tasks call in
//! concurrently.
//!
//! The permit is backed by a fair `tokio::sync::Mutex`, so acquisition
//! order is FIFO across callers. Release happens on drop, which covers
//! every exit path: normal return, early return, and error propagation —
//! a failed command never leaves the device permanently locked.

use tokio::sync::{Mutex, MutexGuard};

/// Serializes stateful device operations issued against one device handle.
#[derive(Debug, Default)]
pub struct CommandSerializer {
    lock: Mutex<()>,
}

/// The exclusive right to issue one device operation.
///
/// Held for the duration of the command and released unconditionally when
/// dropped.
#[derive(Debug)]
pub struct CommandPermit<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl CommandSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive command access. FIFO across concurrent callers.
    pub async fn acquire(&self) -> CommandPermit<'_> {
        CommandPermit {
            _guard: self.lock.lock().await,
        }
    }
}
