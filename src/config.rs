use std::time::Duration;

pub const DEFAULT_PROVINCE: &str = "ON";
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime knobs for the fulfillment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on a single payout transfer call. Elapsing counts as a
    /// failed transfer.
    pub transfer_timeout: Duration,
    /// Province used for fee calculation when the talent has no location.
    pub default_province: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            default_province: DEFAULT_PROVINCE.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    pub fn with_default_province(mut self, province: impl Into<String>) -> Self {
        self.default_province = province.into();
        self
    }
}
