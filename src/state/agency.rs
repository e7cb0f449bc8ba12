use super::currency::Currency;
use super::usage::{ResourceKind, ResourcePair, ResourceUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Agency aggregate: a tenant account with four metered resources.
///
/// Wire fields follow the backend naming, where the bare resource field is the
/// *remaining* amount and the `total_` field is the allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agency {
    #[serde(deserialize_with = "super::de_id")]
    pub id: u64,

    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub is_active: bool,

    /// ISO-8601 creation timestamp; kept as text because the directory only
    /// sorts on it.
    #[serde(default)]
    pub created_at: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_user_id: Option<u64>,

    /// Remaining storage in MB
    #[serde(default)]
    pub storage: i64,
    #[serde(default)]
    pub total_storage: i64,

    #[serde(default)]
    pub token_count: i64,
    #[serde(default)]
    pub total_token_count: i64,

    #[serde(default)]
    pub website_count: i64,
    #[serde(default)]
    pub total_website_count: i64,

    #[serde(default)]
    pub image_count: i64,
    #[serde(default)]
    pub total_image_count: i64,
}

impl Agency {
    /// `(remaining, total)` pair for one resource.
    pub fn pair(&self, kind: ResourceKind) -> ResourcePair {
        match kind {
            ResourceKind::Storage => ResourcePair::new(self.storage, self.total_storage),
            ResourceKind::Tokens => ResourcePair::new(self.token_count, self.total_token_count),
            ResourceKind::Websites => {
                ResourcePair::new(self.website_count, self.total_website_count)
            }
            ResourceKind::Images => ResourcePair::new(self.image_count, self.total_image_count),
        }
    }

    pub fn usage(&self, kind: ResourceKind) -> ResourceUsage {
        ResourceUsage::from_pair(kind, self.pair(kind))
    }

    /// Usage for all four resources in display order.
    pub fn usage_report(&self) -> Vec<ResourceUsage> {
        ResourceKind::ALL.iter().map(|k| self.usage(*k)).collect()
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "active"
        } else {
            "suspended"
        }
    }
}

/// Sort newest first by the parsed RFC 3339 instant; unparseable values sort
/// last.
pub fn sort_newest_first(agencies: &mut [Agency]) {
    agencies.sort_by_cached_key(|a| {
        Reverse(
            DateTime::parse_from_rfc3339(a.created_at.trim())
                .ok()
                .map(|t| t.with_timezone(&Utc)),
        )
    });
}

/// Signed-in operator (or tenant, on the customer dashboard).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(deserialize_with = "super::de_id")]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /user/register`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateAgencyPayload {
    pub email: String,
    pub user_role: &'static str,
    pub name: String,
    pub phone: String,
    pub storage: u64,
    pub token_count: u64,
    pub website_count: u64,
    pub image_count: u64,
    pub amount: f64,
    pub currency: Currency,
    pub parent_user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `PUT /user/topup`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopUpPayload {
    pub id: u64,
    pub top_up: bool,
    pub storage: u64,
    pub token_count: u64,
    pub website_count: u64,
    pub image_count: u64,
    pub amount: f64,
    pub currency: Currency,
}
