use crate::domain::review::ReviewDecision;
use crate::error::{EngineError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One raw row of a commands file. Which columns matter depends on `op`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRecord {
    pub op: String,
    pub actor: String,
    pub target: Option<String>,
    #[serde(rename = "ref")]
    pub label: Option<String>,
    pub action: Option<String>,
    pub reason: Option<String>,
    pub hours: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub title: Option<String>,
    pub milestone: Option<String>,
    pub description: Option<String>,
}

/// A lifecycle operation addressed by labels.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateDeliverable {
        talent: String,
        milestone: String,
        label: String,
        title: String,
    },
    SubmitDeliverable {
        talent: String,
        deliverable: String,
    },
    ReviewDeliverable {
        business: String,
        deliverable: String,
        decision: ReviewDecision,
    },
    AddTimeEntry {
        talent: String,
        contract: String,
        label: String,
        date: NaiveDate,
        hours: Decimal,
        milestone: Option<String>,
        description: String,
    },
    ReviewTimeEntry {
        business: String,
        entry: String,
        decision: ReviewDecision,
    },
    SubmitMilestone {
        talent: String,
        milestone: String,
    },
    ReviewMilestone {
        business: String,
        milestone: String,
        decision: ReviewDecision,
    },
    ProcessPeriod {
        business: String,
        contract: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

fn required<T>(value: Option<T>, column: &str, op: &str) -> Result<T> {
    value.ok_or_else(|| EngineError::validation(format!("{} requires a {} column", op, column)))
}

impl TryFrom<CommandRecord> for Command {
    type Error = EngineError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        let op = record.op.to_ascii_lowercase();
        let actor = record.actor;
        let target = || required(record.target.clone(), "target", &op);
        let decision = || -> Result<ReviewDecision> {
            let action = required(record.action.clone(), "action", &op)?;
            ReviewDecision::from_action(&action, record.reason.clone()).ok_or_else(|| {
                EngineError::validation(format!("Unknown review action: {}", action))
            })
        };

        let command = match op.as_str() {
            "create_deliverable" => Command::CreateDeliverable {
                talent: actor,
                milestone: target()?,
                label: required(record.label.clone(), "ref", &op)?,
                title: record.title.clone().unwrap_or_default(),
            },
            "submit_deliverable" => Command::SubmitDeliverable {
                talent: actor,
                deliverable: target()?,
            },
            "review_deliverable" => Command::ReviewDeliverable {
                business: actor,
                deliverable: target()?,
                decision: decision()?,
            },
            "add_time_entry" => Command::AddTimeEntry {
                talent: actor,
                contract: target()?,
                label: required(record.label.clone(), "ref", &op)?,
                date: required(record.date, "date", &op)?,
                hours: required(record.hours, "hours", &op)?,
                milestone: record.milestone.clone(),
                description: record.description.clone().unwrap_or_default(),
            },
            "review_time_entry" => Command::ReviewTimeEntry {
                business: actor,
                entry: target()?,
                decision: decision()?,
            },
            "submit_milestone" => Command::SubmitMilestone {
                talent: actor,
                milestone: target()?,
            },
            "review_milestone" => Command::ReviewMilestone {
                business: actor,
                milestone: target()?,
                decision: decision()?,
            },
            "process_period" => Command::ProcessPeriod {
                business: actor,
                contract: target()?,
                start: required(record.start, "start", &op)?,
                end: required(record.end, "end", &op)?,
            },
            other => {
                return Err(EngineError::validation(format!(
                    "Unknown operation: {}",
                    other
                )));
            }
        };
        Ok(command)
    }
}

/// Reads commands from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// so trailing optional columns may be left off.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily parses each row; a bad row yields an error without ending the
    /// stream.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader.into_deserialize::<CommandRecord>().map(|result| {
            let record = result.map_err(EngineError::from)?;
            Command::try_from(record)
        })
    }
}
