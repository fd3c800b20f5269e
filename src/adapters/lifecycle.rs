//! Scoped acquisition of store connections
//!
//! [`Scoped`] owns an acquired connection and guarantees a single release
//! attempt. Release failures are logged and handed back as a subordinate
//! [`ExportError::ResourceRelease`]; they never propagate as a panic or an `Err`.

use crate::domain::{ExportError, ExportResult};
use async_trait::async_trait;

/// A store connection that must be released after use
#[async_trait]
pub trait Releasable: Send + Sync {
    /// Closes the underlying connection
    ///
    /// Implementations should treat a second call as a no-op.
    async fn release(&mut self) -> ExportResult<()>;
}

/// Owner of an acquired connection with an idempotent release
pub struct Scoped<C: ?Sized + Releasable> {
    resource: &'static str,
    inner: Box<C>,
    released: bool,
}

impl<C: ?Sized + Releasable> Scoped<C> {
    /// Takes ownership of a freshly acquired connection
    ///
    /// `resource` names the store in log lines and release errors.
    pub fn new(resource: &'static str, inner: Box<C>) -> Self {
        Self {
            resource,
            inner,
            released: false,
        }
    }

    /// Borrows the connection
    pub fn get(&self) -> &C {
        &self.inner
    }

    /// Whether release has already been attempted
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Releases the connection once
    ///
    /// Returns the release failure, if any. Later calls return `None` without
    /// touching the connection.
    pub async fn release(&mut self) -> Option<ExportError> {
        if self.released {
            tracing::debug!(resource = self.resource, "Connection already released");
            return None;
        }
        self.released = true;

        match self.inner.release().await {
            Ok(()) => {
                tracing::info!(resource = self.resource, "Connection closed");
                None
            }
            Err(e) => {
                tracing::error!(
                    resource = self.resource,
                    error = %e,
                    "Error occurred while closing connection"
                );
                Some(ExportError::ResourceRelease {
                    resource: self.resource,
                    message: e.to_string(),
                })
            }
        }
    }
}

impl<C: ?Sized + Releasable> Drop for Scoped<C> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!(
                resource = self.resource,
                "Connection dropped without an explicit release"
            );
        }
    }
}
