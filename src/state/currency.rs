use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Billing currencies the platform accepts for top-ups and registrations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Inr,
    Cad,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Inr,
        Currency::Cad,
        Currency::Aud,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Inr => "₹",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
        }
    }

    /// Rough USD conversion used for ledger totals. Only INR is converted;
    /// every other currency is counted at face value.
    pub fn usd_rate(&self) -> f64 {
        match self {
            Currency::Inr => 0.012,
            _ => 1.0,
        }
    }

    /// `$12.50 USD`
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2} {}", self.symbol(), amount, self.code())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Currency::ALL
            .iter()
            .copied()
            .find(|c| c.code() == upper)
            .ok_or_else(|| format!("Unsupported currency '{}'", s.trim()))
    }
}
