use crate::domain::money::Money;
use crate::domain::payment::{Payment, PaymentStatus};
use crate::error::Result;
use crate::interfaces::seed::Labels;
use serde::Serialize;
use std::io::Write;

/// Output row for one payment, with ids replaced by their labels.
///
/// Period settlements have no milestone; their `milestone` cell holds the
/// billing window instead.
#[derive(Debug, Serialize)]
struct PaymentRow {
    contract: String,
    milestone: String,
    amount: Money,
    platform_fee: Money,
    net_amount: Money,
    status: PaymentStatus,
}

impl PaymentRow {
    fn new(payment: &Payment, labels: &Labels) -> Self {
        let milestone = match (payment.milestone_id, &payment.period) {
            (Some(id), _) => labels.name_of(id),
            (None, Some(period)) => format!("{}..{}", period.start, period.end),
            (None, None) => String::new(),
        };
        Self {
            contract: labels.name_of(payment.contract_id),
            milestone,
            amount: payment.amount,
            platform_fee: payment.platform_fee,
            net_amount: payment.net_amount,
            status: payment.status,
        }
    }
}

/// Writes payments as CSV to any `Write` sink (e.g. stdout).
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payments<'a>(
        &mut self,
        payments: impl IntoIterator<Item = &'a Payment>,
        labels: &Labels,
    ) -> Result<()> {
        for payment in payments {
            self.writer.serialize(PaymentRow::new(payment, labels))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
