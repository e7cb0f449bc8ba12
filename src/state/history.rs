use super::currency::Currency;
use super::usage::ResourceKind;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopUpStatus {
    #[default]
    Completed,
    Pending,
    Failed,
}

/// One applied top-up. Records are append-only on the backend; the console
/// never edits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopUpRecord {
    #[serde(deserialize_with = "super::de_id")]
    pub id: u64,

    #[serde(rename = "user_mst_id", alias = "agency_id", deserialize_with = "super::de_id")]
    pub agency_id: u64,

    /// `None` when the backend sent no date or one in an unknown format.
    #[serde(default, alias = "date", deserialize_with = "de_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub storage: i64,
    #[serde(default)]
    pub token_count: i64,
    #[serde(default)]
    pub website_count: i64,
    #[serde(default)]
    pub image_count: i64,

    #[serde(default)]
    pub amount: f64,

    /// Kept as text: the ledger must render codes it has no symbol for.
    #[serde(default)]
    pub currency: String,

    #[serde(default)]
    pub status: TopUpStatus,
}

/// RFC 3339, or a zone-less `YYYY-MM-DD HH:MM:SS` (optionally with `T` and a
/// fraction) read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn de_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

impl TopUpRecord {
    pub fn delta(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::Storage => self.storage,
            ResourceKind::Tokens => self.token_count,
            ResourceKind::Websites => self.website_count,
            ResourceKind::Images => self.image_count,
        }
    }

    pub fn known_currency(&self) -> Option<Currency> {
        self.currency.parse().ok()
    }

    /// Amount converted with the ledger's simplified USD rates.
    pub fn usd_value(&self) -> f64 {
        let rate = self.known_currency().map(|c| c.usd_rate()).unwrap_or(1.0);
        self.amount * rate
    }

    /// Non-zero deltas as compact labels: `+1.5GB`, `+20K tokens`,
    /// `+5 sites`, `+100 images`.
    pub fn resource_labels(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if self.storage != 0 {
            parts.push(format!("+{:.1}GB", self.storage as f64 / 1000.0));
        }
        if self.token_count != 0 {
            parts.push(format!("+{:.0}K tokens", self.token_count as f64 / 1000.0));
        }
        if self.website_count != 0 {
            parts.push(format!("+{} sites", self.website_count));
        }
        if self.image_count != 0 {
            parts.push(format!("+{} images", self.image_count));
        }
        parts
    }

    pub fn format_amount(&self) -> String {
        match self.known_currency() {
            Some(c) => c.format_amount(self.amount),
            None => format!("{:.2} {}", self.amount, self.currency),
        }
    }
}
