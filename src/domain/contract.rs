use super::money::Money;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    FixedPrice,
    Hourly,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Business,
    Talent,
}

/// An authenticated caller as supplied by the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn business(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Business,
        }
    }

    pub fn talent(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Talent,
        }
    }
}

/// A signed agreement between one business and one talent.
///
/// Party identities never change once the contract exists, so they are the
/// scoping relation for every lifecycle operation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Contract {
    pub id: Uuid,
    pub business_id: Uuid,
    pub talent_id: Uuid,
    pub project_type: ProjectType,
    /// Only meaningful for hourly contracts.
    pub hourly_rate: Option<Money>,
}

impl Contract {
    /// Returns `true` when `actor` is the party of the contract matching its role.
    pub fn is_party(&self, actor: &Actor) -> bool {
        match actor.role {
            Role::Business => self.business_id == actor.user_id,
            Role::Talent => self.talent_id == actor.user_id,
        }
    }

    pub fn is_hourly(&self) -> bool {
        self.project_type == ProjectType::Hourly
    }

    pub fn rate(&self) -> Money {
        self.hourly_rate.unwrap_or(Money::ZERO)
    }
}

/// The slice of a talent's profile the settlement path needs.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
pub struct TalentProfile {
    pub user_id: Uuid,
    /// Two-letter province code of the talent's location, if any.
    pub province: Option<String>,
    #[serde(default)]
    pub tax_exempt: bool,
    pub tax_number: Option<String>,
    /// Destination account for payouts.
    pub payout_account: Option<String>,
}

impl TalentProfile {
    pub fn has_tax_exemption(&self) -> bool {
        self.tax_exempt
            || self
                .tax_number
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty())
    }

    pub fn province_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.province
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(default)
    }

    pub fn payout_destination(&self) -> Option<&str> {
        self.payout_account
            .as_deref()
            .filter(|a| !a.trim().is_empty())
    }
}
