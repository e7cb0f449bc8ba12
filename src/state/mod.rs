pub mod agency;
pub mod currency;
pub mod history;
pub mod hook;
pub mod system;
pub mod usage;
pub mod website;

pub use agency::{sort_newest_first, Agency, CreateAgencyPayload, TopUpPayload, User};
pub use currency::Currency;
pub use history::{TopUpRecord, TopUpStatus};
pub use hook::{InvalidationHook, NoOpHook, TracingHook};
pub use system::{DashboardStats, SystemStorage};
pub use usage::{ResourceKind, ResourcePair, ResourceUsage, UsageLevel};
pub use website::{Customer, CustomerDashboard, CustomerSites, Site, TenantQuota};

use serde::{de, Deserialize, Deserializer};

/// Identifiers arrive as numbers from most endpoints and as numeric strings
/// from the login endpoint; accept both.
pub(crate) fn de_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Num(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| de::Error::custom(format!("invalid id '{}'", s))),
    }
}
