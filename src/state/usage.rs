use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage at or above which a resource is shown as critical.
pub const CRITICAL_PERCENT: u8 = 80;
/// Percentage at or above which a resource is shown as a warning.
pub const WARNING_PERCENT: u8 = 60;

/// The four metered resources every agency carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Storage,
    Tokens,
    Websites,
    Images,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Storage,
        ResourceKind::Tokens,
        ResourceKind::Websites,
        ResourceKind::Images,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Storage => "Storage",
            ResourceKind::Tokens => "AI Tokens",
            ResourceKind::Websites => "Websites",
            ResourceKind::Images => "Image Credits",
        }
    }

    /// Render a quantity of this resource: storage in GB (MB / 1000, one
    /// decimal), tokens in K, websites and images as plain counts.
    pub fn format_amount(&self, value: i64) -> String {
        match self {
            ResourceKind::Storage => format!("{:.1} GB", value as f64 / 1000.0),
            ResourceKind::Tokens => format!("{:.0}K tokens", value as f64 / 1000.0),
            ResourceKind::Websites => format!("{} sites", value),
            ResourceKind::Images => format!("{} credits", value),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Storage => "storage",
            ResourceKind::Tokens => "tokens",
            ResourceKind::Websites => "websites",
            ResourceKind::Images => "images",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "storage" => Ok(ResourceKind::Storage),
            "tokens" | "token" => Ok(ResourceKind::Tokens),
            "websites" | "website" | "sites" => Ok(ResourceKind::Websites),
            "images" | "image" | "credits" => Ok(ResourceKind::Images),
            other => Err(format!("Unknown resource '{}'", other)),
        }
    }
}

/// Display tier derived from a usage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Normal,
    Warning,
    Critical,
}

impl UsageLevel {
    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= CRITICAL_PERCENT {
            UsageLevel::Critical
        } else if percentage >= WARNING_PERCENT {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }
}

/// Raw `(remaining, total)` counter pair as the backend reports it.
///
/// The backend is not trusted to keep `0 <= remaining <= total`, so the
/// fields are signed and every derived figure is clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePair {
    pub remaining: i64,
    pub total: i64,
}

impl ResourcePair {
    pub fn new(remaining: i64, total: i64) -> Self {
        ResourcePair { remaining, total }
    }

    /// `total - remaining`, clamped into `[0, total]`.
    pub fn used(&self) -> i64 {
        let total = self.total.max(0);
        self.total.saturating_sub(self.remaining).clamp(0, total)
    }

    /// Rounded share of `total` that is used; 0 when `total` is 0.
    pub fn percentage(&self) -> u8 {
        if self.total <= 0 {
            return 0;
        }
        let pct = (self.used() as f64 * 100.0 / self.total as f64).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Derived view of one resource for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    pub kind: ResourceKind,
    pub used: i64,
    pub total: i64,
    pub percentage: u8,
    pub level: UsageLevel,
}

impl ResourceUsage {
    pub fn from_pair(kind: ResourceKind, pair: ResourcePair) -> Self {
        let percentage = pair.percentage();
        ResourceUsage {
            kind,
            used: pair.used(),
            total: pair.total.max(0),
            percentage,
            level: UsageLevel::from_percentage(percentage),
        }
    }

    /// Short `used / total` text, e.g. `60.0 GB / 100.0 GB`.
    pub fn display(&self) -> String {
        format!(
            "{} / {}",
            self.kind.format_amount(self.used),
            self.kind.format_amount(self.total)
        )
    }
}
