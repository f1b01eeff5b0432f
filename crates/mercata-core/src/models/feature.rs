//! Feature key catalog.
//!
//! Feature keys are the closed set of capability identifiers gating access
//! to functional areas of the ERP. Both the entitlement resolver and UI
//! gating consult this set; keys are never tenant-specific free text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A capability identifier gating one functional area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKey {
    Inventory,
    Pos,
    Hr,
    Purchases,
    Customers,
    Reports,
    Expenses,
}

impl FeatureKey {
    /// All known feature keys, in display order.
    pub const ALL: &'static [FeatureKey] = &[
        FeatureKey::Inventory,
        FeatureKey::Pos,
        FeatureKey::Hr,
        FeatureKey::Purchases,
        FeatureKey::Customers,
        FeatureKey::Reports,
        FeatureKey::Expenses,
    ];

    /// Wire representation (lowercase, matches the storage contract).
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::Inventory => "inventory",
            FeatureKey::Pos => "pos",
            FeatureKey::Hr => "hr",
            FeatureKey::Purchases => "purchases",
            FeatureKey::Customers => "customers",
            FeatureKey::Reports => "reports",
            FeatureKey::Expenses => "expenses",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown feature key: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureKey {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(FeatureKey::Inventory),
            "pos" => Ok(FeatureKey::Pos),
            "hr" => Ok(FeatureKey::Hr),
            "purchases" => Ok(FeatureKey::Purchases),
            "customers" => Ok(FeatureKey::Customers),
            "reports" => Ok(FeatureKey::Reports),
            "expenses" => Ok(FeatureKey::Expenses),
            other => Err(UnknownFeature(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for key in FeatureKey::ALL {
            assert_eq!(key.as_str().parse::<FeatureKey>().unwrap(), *key);
        }
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!("billing".parse::<FeatureKey>().is_err());
        assert!("Inventory".parse::<FeatureKey>().is_err());
    }
}
