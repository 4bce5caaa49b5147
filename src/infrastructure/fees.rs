use crate::domain::money::Money;
use crate::domain::ports::{FeeBreakdown, FeeCalculator};
use crate::error::EngineError;
use rust_decimal::Decimal;

/// Charges the same percentage everywhere, ignoring province and tax status.
///
/// Stands in for the real fee service in the batch tool and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FlatRateFeeCalculator {
    platform_rate: Decimal,
    processing_rate: Decimal,
}

impl FlatRateFeeCalculator {
    pub fn new(platform_rate: Decimal) -> Self {
        Self {
            platform_rate,
            processing_rate: Decimal::ZERO,
        }
    }

    /// Adds a processing component on top of the platform fee.
    pub fn with_processing_rate(mut self, processing_rate: Decimal) -> Self {
        self.processing_rate = processing_rate;
        self
    }
}

impl FeeCalculator for FlatRateFeeCalculator {
    fn calculate_talent_platform_fee(
        &self,
        gross_amount: Money,
        _province_code: &str,
        _has_tax_exemption: bool,
    ) -> Result<FeeBreakdown, EngineError> {
        let platform_fee = gross_amount.times(self.platform_rate)?.round_cents();
        let processing_fee = gross_amount.times(self.processing_rate)?.round_cents();
        Ok(FeeBreakdown {
            platform_fee,
            total_fee: platform_fee.checked_add(processing_fee)?,
        })
    }
}
