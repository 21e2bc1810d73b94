use super::field_map::FieldMap;
use super::fields::{Field, RESPONSE_TYPE_APPROVAL, TransactionTypeCode};
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Operation requested by the billing platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Authorize,
    Capture,
    Purchase,
    Void,
    Credit,
    Refund,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Authorize => "AUTHORIZE",
            OperationKind::Capture => "CAPTURE",
            OperationKind::Purchase => "PURCHASE",
            OperationKind::Void => "VOID",
            OperationKind::Credit => "CREDIT",
            OperationKind::Refund => "REFUND",
        }
    }

    /// Whether an approved outcome of this kind can later be captured or voided.
    pub fn is_authorization(self) -> bool {
        matches!(self, OperationKind::Authorize | OperationKind::Purchase)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ISO 4217 alphabetic currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(PaymentError::ValidationError(format!(
                "Invalid currency code: {}",
                s
            )))
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Processed,
    /// Declined or rejected by the gateway; the two are not told apart.
    Error,
}

impl PaymentStatus {
    pub fn from_response_type(response_type: Option<&str>) -> Self {
        if response_type == Some(RESPONSE_TYPE_APPROVAL) {
            PaymentStatus::Processed
        } else {
            PaymentStatus::Error
        }
    }
}

/// Canonical result of one gateway exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionOutcome {
    pub payment_id: Uuid,
    pub transaction_id: Uuid,
    pub kind: OperationKind,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub status: PaymentStatus,
    pub response_type: Option<String>,
    pub response_code: Option<String>,
    pub response_description: Option<String>,
    pub trace_number: Option<String>,
    pub authorization_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub raw_response: FieldMap,
}

impl TransactionOutcome {
    pub fn is_approved(&self) -> bool {
        self.status == PaymentStatus::Processed
    }
}

impl From<&ResponseRecord> for TransactionOutcome {
    fn from(record: &ResponseRecord) -> Self {
        let response = &record.response;
        let lookup = |field: Field| response.get(field).map(str::to_string);
        Self {
            payment_id: record.payment_id,
            transaction_id: record.transaction_id,
            kind: record.kind,
            amount: record.amount,
            currency: record.currency.clone(),
            status: PaymentStatus::from_response_type(response.get(Field::ResponseType)),
            response_type: lookup(Field::ResponseType),
            response_code: lookup(Field::ResponseCode),
            response_description: lookup(Field::ResponseDescription),
            trace_number: lookup(Field::TraceNumber),
            authorization_code: lookup(Field::AuthorizationCode),
            created_at: record.created_at,
            raw_response: response.clone(),
        }
    }
}

/// One persisted gateway response. Records are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub account_id: Uuid,
    pub payment_id: Uuid,
    pub transaction_id: Uuid,
    pub kind: OperationKind,
    pub amount: Option<Decimal>,
    pub currency: Option<Currency>,
    pub response: FieldMap,
    pub created_at: DateTime<Utc>,
    pub tenant_id: Uuid,
}

impl ResponseRecord {
    pub fn is_successful_authorization(&self) -> bool {
        self.kind.is_authorization()
            && PaymentStatus::from_response_type(self.response.get(Field::ResponseType))
                == PaymentStatus::Processed
    }

    /// The reference a capture or void needs. An approval without a trace
    /// number cannot be referenced and yields `None`.
    pub fn stored_authorization(&self) -> Option<StoredAuthorization> {
        let non_empty = |field: Field| {
            self.response
                .get(field)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        Some(StoredAuthorization {
            trace_number: non_empty(Field::TraceNumber)?,
            authorization_code: non_empty(Field::AuthorizationCode),
            transaction_type: self
                .response
                .get(Field::TransactionType)
                .and_then(TransactionTypeCode::from_code),
        })
    }
}

/// What capture and void need from the prior approved authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuthorization {
    pub trace_number: String,
    pub authorization_code: Option<String>,
    pub transaction_type: Option<TransactionTypeCode>,
}
