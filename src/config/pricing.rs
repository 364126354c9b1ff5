//! Tier pricing configuration

use serde::Deserialize;

use crate::domain::payment::SubscriptionTier;

use super::error::ValidationError;

/// Monthly tier prices in whole rubles.
///
/// The engine resolves prices here at payment creation time and converts
/// to kopecks for storage; gateway responses never feed back into pricing.
/// A tier priced at zero (or left at zero) is not purchasable.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Monthly price for the Pro tier, RUB
    #[serde(default)]
    pub pro_monthly_rub: i64,

    /// Monthly price for the Ultra tier, RUB
    #[serde(default)]
    pub ultra_monthly_rub: i64,
}

impl PricingConfig {
    /// Resolve the configured monthly price for a tier, in rubles.
    ///
    /// Free has no price; non-positive results mean "not purchasable"
    /// and are rejected by the engine at creation time.
    pub fn price_rub(&self, tier: SubscriptionTier) -> i64 {
        match tier {
            SubscriptionTier::Free => 0,
            SubscriptionTier::Pro => self.pro_monthly_rub,
            SubscriptionTier::Ultra => self.ultra_monthly_rub,
        }
    }

    /// Validate pricing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pro_monthly_rub < 0 || self.ultra_monthly_rub < 0 {
            return Err(ValidationError::NegativeTierPrice);
        }
        Ok(())
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            pro_monthly_rub: 0,
            ultra_monthly_rub: 0,
        }
    }
}
