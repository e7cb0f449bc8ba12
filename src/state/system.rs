use super::agency::Agency;
use super::usage::ResourceKind;
use serde::{Deserialize, Serialize};

/// Platform storage figures from `GET /user/systemStorage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStorage {
    #[serde(rename = "workerNodeStorageGB")]
    pub worker_node_storage_gb: f64,
    #[serde(rename = "agencyAllottedGB")]
    pub agency_allotted_gb: f64,
    #[serde(default)]
    pub agency_allotted_percent: f64,
}

impl SystemStorage {
    /// Unallotted platform storage in MB, never negative.
    pub fn available_mb(&self) -> u64 {
        let mb = (self.worker_node_storage_gb - self.agency_allotted_gb) * 1000.0;
        if mb.is_finite() && mb > 0.0 {
            mb.round() as u64
        } else {
            0
        }
    }
}

/// Operator-level totals derived from the agency directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_agencies: usize,
    /// Website slots in use across all agencies
    pub total_websites: i64,
    /// Used storage in GB, one decimal
    #[serde(rename = "totalStorageGB")]
    pub total_storage_gb: f64,
    /// Used tokens in thousands, no decimals
    #[serde(rename = "totalTokensK")]
    pub total_tokens_k: f64,
}

impl DashboardStats {
    pub fn from_agencies(agencies: &[Agency]) -> Self {
        let sum_used = |kind: ResourceKind| -> i64 {
            agencies.iter().map(|a| a.pair(kind).used()).sum()
        };

        let storage_mb = sum_used(ResourceKind::Storage) as f64;
        let tokens = sum_used(ResourceKind::Tokens) as f64;

        DashboardStats {
            total_agencies: agencies.len(),
            total_websites: sum_used(ResourceKind::Websites),
            total_storage_gb: (storage_mb / 1000.0 * 10.0).round() / 10.0,
            total_tokens_k: (tokens / 1000.0).round(),
        }
    }
}
