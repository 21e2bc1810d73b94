use crate::domain::outcome::{OperationKind, PaymentStatus, TransactionOutcome};
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

#[derive(Serialize)]
struct OutcomeRow<'a> {
    payment: Uuid,
    transaction: Uuid,
    #[serde(rename = "type")]
    kind: OperationKind,
    amount: Option<Decimal>,
    currency: Option<&'a str>,
    status: PaymentStatus,
    response_type: Option<&'a str>,
    response_code: Option<&'a str>,
    response_description: Option<&'a str>,
    trace_number: Option<&'a str>,
    authorization_code: Option<&'a str>,
    created_at: DateTime<Utc>,
}

impl<'a> From<&'a TransactionOutcome> for OutcomeRow<'a> {
    fn from(outcome: &'a TransactionOutcome) -> Self {
        Self {
            payment: outcome.payment_id,
            transaction: outcome.transaction_id,
            kind: outcome.kind,
            amount: outcome.amount,
            currency: outcome.currency.as_ref().map(|c| c.as_str()),
            status: outcome.status,
            response_type: outcome.response_type.as_deref(),
            response_code: outcome.response_code.as_deref(),
            response_description: outcome.response_description.as_deref(),
            trace_number: outcome.trace_number.as_deref(),
            authorization_code: outcome.authorization_code.as_deref(),
            created_at: outcome.created_at,
        }
    }
}

/// Writes transaction outcomes as CSV, one row per gateway exchange.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OutcomeWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_outcome(&mut self, outcome: &TransactionOutcome) -> Result<()> {
        self.writer.serialize(OutcomeRow::from(outcome))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
