use crate::domain::contract::{Contract, ProjectType, TalentProfile};
use crate::domain::milestone::{Milestone, MilestoneStatus};
use crate::domain::money::Money;
use crate::domain::ports::Stores;
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use tracing::info;
use uuid::Uuid;

/// Two-way mapping between human labels and entity ids.
///
/// Seeded entities get a UUID v5 derived from their label, so the same seed
/// file always produces the same ids. Entities created while replaying
/// commands are bound to whatever id the engine assigned.
#[derive(Debug, Default, Clone)]
pub struct Labels {
    ids: HashMap<String, Uuid>,
    names: HashMap<Uuid, String>,
}

impl Labels {
    pub fn derive_id(label: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, label.as_bytes())
    }

    pub fn bind(&mut self, label: &str, id: Uuid) {
        self.ids.insert(label.to_string(), id);
        self.names.insert(id, label.to_string());
    }

    /// Registers `label` under its derived id and returns that id.
    pub fn register(&mut self, label: &str) -> Uuid {
        let id = Self::derive_id(label);
        self.bind(label, id);
        id
    }

    /// Unknown labels still resolve to their derived id, which the engine
    /// then reports as not found.
    pub fn resolve(&self, label: &str) -> Uuid {
        self.ids
            .get(label)
            .copied()
            .unwrap_or_else(|| Self::derive_id(label))
    }

    pub fn name_of(&self, id: Uuid) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct TalentSeed {
    #[serde(rename = "ref")]
    pub label: String,
    pub province: Option<String>,
    pub payout_account: Option<String>,
    #[serde(default)]
    pub tax_exempt: bool,
    pub tax_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContractSeed {
    #[serde(rename = "ref")]
    pub label: String,
    pub business: String,
    pub talent: String,
    pub project_type: ProjectType,
    pub hourly_rate: Option<Money>,
}

#[derive(Debug, Deserialize)]
pub struct MilestoneSeed {
    #[serde(rename = "ref")]
    pub label: String,
    pub contract: String,
    pub title: String,
    pub amount: Money,
    pub order: u32,
    pub status: Option<MilestoneStatus>,
}

/// Initial contracts, talent profiles and milestones for a batch run.
#[derive(Debug, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub talents: Vec<TalentSeed>,
    pub contracts: Vec<ContractSeed>,
    #[serde(default)]
    pub milestones: Vec<MilestoneSeed>,
}

impl Seed {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        serde_json::from_reader(source).map_err(|e| EngineError::Seed(e.to_string()))
    }

    /// Labels of the seeded contracts, in file order.
    pub fn contract_labels(&self) -> impl Iterator<Item = &str> {
        self.contracts.iter().map(|c| c.label.as_str())
    }

    /// Writes every seeded entity and returns the label map.
    ///
    /// Profiles and contracts are overwritten on every run. Milestones carry
    /// lifecycle state, so one that already exists in the store is left as is.
    pub async fn apply(&self, stores: &Stores) -> Result<Labels> {
        let mut labels = Labels::default();

        for talent in &self.talents {
            let user_id = labels.register(&talent.label);
            stores
                .contracts
                .store_profile(TalentProfile {
                    user_id,
                    province: talent.province.clone(),
                    tax_exempt: talent.tax_exempt,
                    tax_number: talent.tax_number.clone(),
                    payout_account: talent.payout_account.clone(),
                })
                .await?;
        }

        for seed in &self.contracts {
            if seed.project_type == ProjectType::Hourly && seed.hourly_rate.is_none() {
                return Err(EngineError::Seed(format!(
                    "hourly contract {} has no hourly_rate",
                    seed.label
                )));
            }
            let contract = Contract {
                id: labels.register(&seed.label),
                business_id: labels.register(&seed.business),
                talent_id: labels.register(&seed.talent),
                project_type: seed.project_type,
                hourly_rate: seed.hourly_rate,
            };
            stores.contracts.store_contract(contract).await?;
        }

        for seed in &self.milestones {
            if !self.contracts.iter().any(|c| c.label == seed.contract) {
                return Err(EngineError::Seed(format!(
                    "milestone {} references unknown contract {}",
                    seed.label, seed.contract
                )));
            }
            let milestone_id = labels.register(&seed.label);
            if stores.milestones.get(milestone_id).await?.is_some() {
                continue;
            }
            let mut milestone = Milestone::new(
                labels.resolve(&seed.contract),
                seed.title.clone(),
                Money::non_negative(seed.amount.value())?,
                seed.order,
            );
            milestone.id = milestone_id;
            if let Some(status) = seed.status {
                milestone.status = status;
            }
            stores.milestones.store(milestone).await?;
        }

        info!(
            talents = self.talents.len(),
            contracts = self.contracts.len(),
            milestones = self.milestones.len(),
            "seed applied"
        );
        Ok(labels)
    }
}
