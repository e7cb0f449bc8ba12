//! Query cache for read views and the mutation → invalidation graph.
//!
//! A successful mutation calls [`QueryCache::invalidate`] with the groups it
//! names in [`Mutation::invalidates`]. Invalidated groups are marked stale,
//! subscribed hooks are notified, and the next read refetches.

use crate::api::{ApiClient, Transport};
use crate::error::Result;
use crate::state::{
    Agency, CustomerDashboard, DashboardStats, InvalidationHook, SystemStorage, TopUpRecord,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Named groups of cached read data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceGroup {
    Agencies,
    DashboardStats,
    TopUpHistory,
    SystemStorage,
    Websites,
}

impl fmt::Display for ResourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceGroup::Agencies => "agencies",
            ResourceGroup::DashboardStats => "dashboard_stats",
            ResourceGroup::TopUpHistory => "top_up_history",
            ResourceGroup::SystemStorage => "system_storage",
            ResourceGroup::Websites => "websites",
        })
    }
}

/// Every server-side change the console can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateAgency,
    TopUp,
    AgencyLifecycle,
    WebsiteLifecycle,
}

impl Mutation {
    /// Read views that can no longer be trusted after this mutation succeeds.
    pub fn invalidates(&self) -> &'static [ResourceGroup] {
        match self {
            Mutation::CreateAgency => &[
                ResourceGroup::Agencies,
                ResourceGroup::DashboardStats,
                ResourceGroup::SystemStorage,
            ],
            Mutation::TopUp => &[
                ResourceGroup::Agencies,
                ResourceGroup::DashboardStats,
                ResourceGroup::TopUpHistory,
                ResourceGroup::SystemStorage,
            ],
            Mutation::AgencyLifecycle => &[
                ResourceGroup::Agencies,
                ResourceGroup::DashboardStats,
                ResourceGroup::Websites,
            ],
            Mutation::WebsiteLifecycle => &[
                ResourceGroup::Websites,
                ResourceGroup::Agencies,
                ResourceGroup::DashboardStats,
            ],
        }
    }
}

#[derive(Debug)]
struct Cached<T> {
    value: Option<T>,
    stale: bool,
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Cached {
            value: None,
            stale: false,
        }
    }
}

impl<T> Cached<T> {
    fn needs_fetch(&self) -> bool {
        self.stale || self.value.is_none()
    }
}

#[derive(Default)]
pub struct QueryCache {
    agencies: Cached<Vec<Agency>>,
    history: Cached<Vec<TopUpRecord>>,
    system: Cached<SystemStorage>,
    websites: Cached<(u64, CustomerDashboard)>,
    stats_stale: bool,
    hooks: Vec<Box<dyn InvalidationHook>>,
    fetches: usize,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, hook: Box<dyn InvalidationHook>) {
        self.hooks.push(hook);
    }

    /// Number of network fetches the cache has issued.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    pub fn is_stale(&self, group: ResourceGroup) -> bool {
        match group {
            ResourceGroup::Agencies => self.agencies.stale,
            ResourceGroup::DashboardStats => self.stats_stale,
            ResourceGroup::TopUpHistory => self.history.stale,
            ResourceGroup::SystemStorage => self.system.stale,
            ResourceGroup::Websites => self.websites.stale,
        }
    }

    /// Mark groups stale and notify subscribers.
    pub fn invalidate(&mut self, groups: &[ResourceGroup]) -> Result<()> {
        let unique: BTreeSet<ResourceGroup> = groups.iter().copied().collect();
        for group in &unique {
            match group {
                ResourceGroup::Agencies => self.agencies.stale = true,
                ResourceGroup::DashboardStats => self.stats_stale = true,
                ResourceGroup::TopUpHistory => self.history.stale = true,
                ResourceGroup::SystemStorage => self.system.stale = true,
                ResourceGroup::Websites => self.websites.stale = true,
            }
        }
        for group in unique {
            for hook in self.hooks.iter_mut() {
                hook.on_invalidated(group)?;
            }
        }
        Ok(())
    }

    /// `invalidate(mutation.invalidates())` after a mutation succeeded.
    ///
    /// The mutation has already happened server-side, so a failing hook is
    /// logged and never turns it into a failure. The groups are stale either
    /// way.
    pub fn record(&mut self, mutation: Mutation) {
        tracing::debug!(?mutation, "mutation succeeded");
        if let Err(e) = self.invalidate(mutation.invalidates()) {
            tracing::warn!(error = %e, ?mutation, "invalidation hook failed");
        }
    }

    fn refetched(&mut self, group: ResourceGroup) -> Result<()> {
        self.fetches += 1;
        for hook in self.hooks.iter_mut() {
            hook.on_refetched(group)?;
        }
        Ok(())
    }

    pub fn agencies<T: Transport>(&mut self, api: &mut ApiClient<T>) -> Result<&[Agency]> {
        if self.agencies.needs_fetch() {
            let fresh = api.list_agencies()?;
            self.agencies = Cached {
                value: Some(fresh),
                stale: false,
            };
            self.refetched(ResourceGroup::Agencies)?;
        }
        Ok(self.agencies.value.as_deref().unwrap_or(&[]))
    }

    /// Stats are derived from the agency list, so refreshing them refreshes
    /// the list when it is stale too.
    pub fn dashboard_stats<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
    ) -> Result<DashboardStats> {
        if self.stats_stale {
            self.agencies.stale = true;
        }
        let stats = DashboardStats::from_agencies(self.agencies(api)?);
        if self.stats_stale {
            self.stats_stale = false;
            self.refetched(ResourceGroup::DashboardStats)?;
        }
        Ok(stats)
    }

    pub fn history<T: Transport>(&mut self, api: &mut ApiClient<T>) -> Result<&[TopUpRecord]> {
        if self.history.needs_fetch() {
            let fresh = api.top_up_history()?;
            self.history = Cached {
                value: Some(fresh),
                stale: false,
            };
            self.refetched(ResourceGroup::TopUpHistory)?;
        }
        Ok(self.history.value.as_deref().unwrap_or(&[]))
    }

    pub fn system_storage<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
    ) -> Result<SystemStorage> {
        if self.system.needs_fetch() {
            let fresh = api.system_storage()?;
            self.system = Cached {
                value: Some(fresh),
                stale: false,
            };
            self.refetched(ResourceGroup::SystemStorage)?;
        }
        Ok(self.system.value.unwrap_or_default())
    }

    /// Sites for one tenant. Asking for another tenant replaces the entry.
    pub fn websites<T: Transport>(
        &mut self,
        api: &mut ApiClient<T>,
        agency_id: u64,
    ) -> Result<&CustomerDashboard> {
        let other_tenant = matches!(&self.websites.value, Some((id, _)) if *id != agency_id);
        if self.websites.needs_fetch() || other_tenant {
            let fresh = api.customer_dashboard(agency_id)?;
            self.websites = Cached {
                value: Some((agency_id, fresh)),
                stale: false,
            };
            self.refetched(ResourceGroup::Websites)?;
        }
        match &self.websites.value {
            Some((_, dashboard)) => Ok(dashboard),
            None => Err(crate::error::Error::Workflow(
                "website cache unexpectedly empty".to_string(),
            )),
        }
    }
}
