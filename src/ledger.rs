//! Top-up history ledger: join, filter and summarise.
//!
//! Pure functions over already-fetched data. "Now" is passed in so the
//! relative date filter is evaluated at render time.

use crate::state::{Agency, TopUpRecord};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DateRange {
    #[default]
    All,
    Last7Days,
    Last30Days,
    Last90Days,
}

impl DateRange {
    pub fn window(&self) -> Option<Duration> {
        match self {
            DateRange::All => None,
            DateRange::Last7Days => Some(Duration::days(7)),
            DateRange::Last30Days => Some(Duration::days(30)),
            DateRange::Last90Days => Some(Duration::days(90)),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.window() {
            None => true,
            Some(window) => now.signed_duration_since(at) <= window,
        }
    }

    /// Undated records only pass `All`.
    pub fn admits(&self, at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match at {
            Some(at) => self.contains(at, now),
            None => self.window().is_none(),
        }
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DateRange::All),
            "7days" | "7d" => Ok(DateRange::Last7Days),
            "30days" | "30d" => Ok(DateRange::Last30Days),
            "90days" | "90d" => Ok(DateRange::Last90Days),
            other => Err(format!(
                "Unknown date range '{}' (use all, 7days, 30days or 90days)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    /// Case-insensitive substring of the agency name
    pub search: String,
    /// Exact agency id; `None` means all agencies
    pub agency_id: Option<u64>,
    pub range: DateRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerRow<'a> {
    pub agency_name: String,
    pub record: &'a TopUpRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total_top_ups: usize,
    /// Naive USD estimate of the filtered rows
    pub total_value_usd: f64,
    /// Agencies with `is_active` set in the loaded directory. Suspended
    /// agencies are not counted, so this can be below the directory size.
    pub active_agencies: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerView<'a> {
    pub rows: Vec<LedgerRow<'a>>,
    pub summary: LedgerSummary,
}

/// Name shown for an agency id missing from the loaded directory.
pub fn fallback_label(agency_id: u64) -> String {
    format!("ID: {}", agency_id)
}

pub fn build<'a>(
    records: &'a [TopUpRecord],
    agencies: &[Agency],
    filter: &LedgerFilter,
    now: DateTime<Utc>,
) -> LedgerView<'a> {
    let names: HashMap<u64, &str> = agencies.iter().map(|a| (a.id, a.name.as_str())).collect();
    let needle = filter.search.trim().to_lowercase();

    let rows: Vec<LedgerRow<'a>> = records
        .iter()
        .map(|record| LedgerRow {
            agency_name: names
                .get(&record.agency_id)
                .map(|n| n.to_string())
                .unwrap_or_else(|| fallback_label(record.agency_id)),
            record,
        })
        .filter(|row| needle.is_empty() || row.agency_name.to_lowercase().contains(&needle))
        .filter(|row| filter.agency_id.map_or(true, |id| row.record.agency_id == id))
        .filter(|row| filter.range.admits(row.record.created_at, now))
        .collect();

    let summary = LedgerSummary {
        total_top_ups: rows.len(),
        total_value_usd: rows.iter().map(|r| r.record.usd_value()).sum(),
        active_agencies: agencies.iter().filter(|a| a.is_active).count(),
    };

    LedgerView { rows, summary }
}
