//! Hook: injectable observer for cache invalidation.
//!
//! The query cache calls every registered hook once per invalidated group,
//! after the group has been marked stale.

use crate::cache::ResourceGroup;
use crate::error::Result;

/// Trait-based hook notified when a mutation invalidates cached views.
///
/// Returning `Err` aborts notification of the remaining hooks but leaves the
/// groups stale, so the next read still refetches.
pub trait InvalidationHook {
    /// Called after `group` was marked stale.
    fn on_invalidated(&mut self, _group: ResourceGroup) -> Result<()> {
        Ok(())
    }

    /// Called after a stale group was fetched again.
    fn on_refetched(&mut self, _group: ResourceGroup) -> Result<()> {
        Ok(())
    }
}

/// No-op hook: default when nothing subscribes.
#[derive(Debug, Clone, Default)]
pub struct NoOpHook;

impl InvalidationHook for NoOpHook {}

/// Hook that logs every event through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingHook;

impl InvalidationHook for TracingHook {
    fn on_invalidated(&mut self, group: ResourceGroup) -> Result<()> {
        tracing::debug!(%group, "cache group invalidated");
        Ok(())
    }

    fn on_refetched(&mut self, group: ResourceGroup) -> Result<()> {
        tracing::debug!(%group, "cache group refetched");
        Ok(())
    }
}
