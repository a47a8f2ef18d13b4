use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use rep_schema::{CellAddress, Grid, RangeSpec};
use tracing::warn;

use crate::table::{TableClient, TableError};

/// Bounds every backend call by a wall-clock limit.
///
/// The call runs on a helper thread. A read that passes the limit fails with
/// [`TableError::Timeout`] and the helper is abandoned. A write that passes
/// the limit cannot be abandoned the same way since it may still land, so it
/// fails with [`TableError::WriteUnconfirmed`] carrying a [`PendingWrite`]
/// the caller can wait on.
pub struct TimeoutTable<T: ?Sized> {
    inner: Arc<T>,
    limit: Duration,
}

impl<T: ?Sized> TimeoutTable<T> {
    pub fn new(inner: Arc<T>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl<T: TableClient + ?Sized + 'static> TimeoutTable<T> {
    fn spawn<R, F>(&self, call: F) -> Receiver<Result<R, TableError>>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> Result<R, TableError> + Send + 'static,
    {
        let (sender, receiver) = bounded(1);
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let _ = sender.send(call(&inner));
        });
        receiver
    }

    fn log_timeout(&self, operation: &'static str) {
        warn!(
            target: "reputation::table",
            operation,
            limit_ms = self.limit.as_millis() as u64,
            "table.call_timed_out"
        );
    }
}

impl<T: TableClient + ?Sized + 'static> TableClient for TimeoutTable<T> {
    fn read(&self, range: &RangeSpec) -> Result<Grid, TableError> {
        let range = range.clone();
        let receiver = self.spawn(move |table| table.read(&range));
        match receiver.recv_timeout(self.limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.log_timeout("read");
                Err(TableError::Timeout {
                    operation: "read",
                    after: self.limit,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(TableError::Disconnected),
        }
    }

    fn write(&self, cell: &CellAddress, value: i64) -> Result<(), TableError> {
        let cell = cell.clone();
        let receiver = self.spawn(move |table| table.write(&cell, value));
        match receiver.recv_timeout(self.limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                self.log_timeout("write");
                Err(TableError::WriteUnconfirmed {
                    after: self.limit,
                    pending: PendingWrite { receiver },
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(TableError::Disconnected),
        }
    }
}

/// A write still running on a [`TimeoutTable`] helper thread.
#[derive(Debug)]
pub struct PendingWrite {
    receiver: Receiver<Result<(), TableError>>,
}

impl PendingWrite {
    /// Block until the backend answers. A helper that dies without answering
    /// reports [`TableError::Disconnected`].
    pub fn wait(self) -> Result<(), TableError> {
        self.receiver
            .recv()
            .unwrap_or(Err(TableError::Disconnected))
    }
}
