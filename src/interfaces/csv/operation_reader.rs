use crate::application::dispatcher::{CallContext, PaymentDispatcher, PaymentIds};
use crate::domain::outcome::{Currency, OperationKind, TransactionOutcome};
use crate::domain::properties::PluginProperties;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;
use uuid::Uuid;

/// Columns every operation row carries. Any other column is read as a
/// property override (`ccNumber`, `firstName`, `token`, ...).
const FIXED_COLUMNS: &[&str] = &[
    "type",
    "account",
    "payment",
    "transaction",
    "payment_method",
    "amount",
    "currency",
];

#[derive(Debug, Deserialize)]
struct OperationRow {
    #[serde(rename = "type")]
    kind: OperationKind,
    account: Uuid,
    payment: Uuid,
    transaction: Uuid,
    payment_method: Uuid,
    /// Kept as text so the scale written in the file survives.
    amount: Option<String>,
    currency: Option<Currency>,
}

/// One payment operation read from the batch file.
#[derive(Debug, Clone)]
pub struct Operation {
    pub kind: OperationKind,
    pub ids: PaymentIds,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub properties: PluginProperties,
}

impl Operation {
    /// Sends the operation through the matching dispatcher entry point.
    pub async fn execute(
        &self,
        dispatcher: &PaymentDispatcher,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        let props = &self.properties;
        let kind = self.kind;
        let priced = || -> Result<(Decimal, Currency)> {
            let amount = self.amount.ok_or_else(|| {
                PaymentError::ValidationError(format!("{} requires an amount", kind))
            })?;
            let currency = self.currency.clone().ok_or_else(|| {
                PaymentError::ValidationError(format!("{} requires a currency", kind))
            })?;
            Ok((amount, currency))
        };

        match kind {
            OperationKind::Void => dispatcher.void_payment(self.ids, props, context).await,
            OperationKind::Authorize => {
                let (amount, currency) = priced()?;
                dispatcher
                    .authorize_payment(self.ids, amount, currency, props, context)
                    .await
            }
            OperationKind::Capture => {
                let (amount, currency) = priced()?;
                dispatcher
                    .capture_payment(self.ids, amount, currency, props, context)
                    .await
            }
            OperationKind::Purchase => {
                let (amount, currency) = priced()?;
                dispatcher
                    .purchase_payment(self.ids, amount, currency, props, context)
                    .await
            }
            OperationKind::Credit => {
                let (amount, currency) = priced()?;
                dispatcher
                    .credit_payment(self.ids, amount, currency, props, context)
                    .await
            }
            OperationKind::Refund => {
                dispatcher
                    .refund_payment(self.ids, self.amount, self.currency.clone(), props, context)
                    .await
            }
        }
    }
}

/// Reads payment operations from a CSV source.
///
/// Whitespace is trimmed and rows may omit trailing override columns.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily parses one operation per row; a bad row does not stop the rest.
    pub fn operations(mut self) -> Result<impl Iterator<Item = Result<Operation>>> {
        let headers = self.reader.headers()?.clone();
        Ok(self
            .reader
            .into_records()
            .map(move |record| parse_operation(&headers, record?)))
    }
}

fn parse_operation(headers: &csv::StringRecord, mut record: csv::StringRecord) -> Result<Operation> {
    // Short rows leave their trailing columns empty.
    while record.len() < headers.len() {
        record.push_field("");
    }
    let row: OperationRow = record.deserialize(Some(headers))?;
    let amount = row
        .amount
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|e| PaymentError::ValidationError(format!("invalid amount {:?}: {}", raw, e)))
        })
        .transpose()?;

    let properties = headers
        .iter()
        .zip(record.iter())
        .filter(|(name, value)| !FIXED_COLUMNS.contains(name) && !value.is_empty())
        .collect::<PluginProperties>();

    Ok(Operation {
        kind: row.kind,
        ids: PaymentIds {
            account_id: row.account,
            payment_id: row.payment,
            transaction_id: row.transaction,
            payment_method_id: row.payment_method,
        },
        amount,
        currency: row.currency,
        properties,
    })
}
