//! Resources with an acquire/release lifecycle.
//!
//! A managed resource is obtained right before a unit of work and released
//! right after it, with the outcome of the work:
//!
//! 1. `acquire(state)` obtains the resource
//! 2. the work runs with the resource
//! 3. `release(success)` finalizes it
//!
//! The mutation pipeline uses this for adapter transactions: one scope per
//! commit call, committed when the adapter wrote the record and rolled back
//! otherwise.
//!
//! # Example
//!
//! ```ignore
//! use autograph_core::{AutographError, ManagedResource};
//!
//! pub struct AuditTrail {
//!     entries: Vec<String>,
//! }
//!
//! impl<S: Send + Sync> ManagedResource<S> for AuditTrail {
//!     type Error = AutographError;
//!
//!     async fn acquire(_state: &S) -> Result<Self, Self::Error> {
//!         Ok(AuditTrail { entries: Vec::new() })
//!     }
//!
//!     async fn release(self, success: bool) -> Result<(), Self::Error> {
//!         if success {
//!             for entry in self.entries {
//!                 tracing::info!(audit = entry);
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::future::Future;

use crate::error::AutographError;

/// A resource with managed lifecycle (acquire/release).
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `ManagedResource<{S}>`",
    label = "this type cannot be used as a managed resource",
    note = "implement `ManagedResource<S>` with `acquire()` and `release()` methods for your type"
)]
pub trait ManagedResource<S>: Sized {
    /// Error type returned by acquire/release.
    type Error: Into<AutographError>;

    /// Obtain the resource. Called before the unit of work.
    fn acquire(state: &S) -> impl Future<Output = Result<Self, Self::Error>> + Send;

    /// Finalize the resource after the unit of work.
    ///
    /// - `success: true`: the work completed
    /// - `success: false`: the work failed; undo whatever can be undone
    fn release(self, success: bool) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
