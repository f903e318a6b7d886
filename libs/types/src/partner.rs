//! Partner identifiers
//!
//! The set of upstream partners is closed: every counter map, statistics
//! bucket, and dispatch site iterates `PartnerId::ALL`, so adding a partner
//! means adding a variant here plus a validator/normalizer pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier for an upstream feed partner.
///
/// Serialized in the canonical wire form (`"PARTNER_A"`). The short form
/// (`"A"`) is accepted when parsing external path/query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartnerId {
    PartnerA,
    PartnerB,
}

/// Raised when an external identifier names no known partner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown partner: {0}")]
pub struct UnknownPartner(pub String);

impl PartnerId {
    /// Every partner in the closed set, in canonical order.
    pub const ALL: [PartnerId; 2] = [PartnerId::PartnerA, PartnerId::PartnerB];

    /// Canonical wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartnerId::PartnerA => "PARTNER_A",
            PartnerId::PartnerB => "PARTNER_B",
        }
    }

    /// Short form used in compact external paths.
    pub fn short(&self) -> &'static str {
        match self {
            PartnerId::PartnerA => "A",
            PartnerId::PartnerB => "B",
        }
    }
}

impl FromStr for PartnerId {
    type Err = UnknownPartner;

    /// Accepts both the canonical (`PARTNER_A`) and short (`A`) forms,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PARTNER_A" | "A" => Ok(PartnerId::PartnerA),
            "PARTNER_B" | "B" => Ok(PartnerId::PartnerB),
            _ => Err(UnknownPartner(s.to_string())),
        }
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
