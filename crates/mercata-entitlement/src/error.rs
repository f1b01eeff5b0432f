//! Entitlement and lifecycle error types.

use mercata_core::error::MercataError;
use mercata_core::models::feature::FeatureKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("plan duration must be positive, got {days} days")]
    NonPositiveDuration { days: i64 },

    #[error("feature '{feature}' is not available on the current plan")]
    FeatureUnavailable { feature: FeatureKey },
}

impl From<EntitlementError> for MercataError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::NonPositiveDuration { .. } => MercataError::Validation {
                message: err.to_string(),
            },
            EntitlementError::FeatureUnavailable { feature } => MercataError::FeatureDenied {
                feature: feature.to_string(),
            },
        }
    }
}
