use super::fields::{AccountType, CardType, TransactionTypeCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bill-to details shared by card and EFT transactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street_line1: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: Option<String>,
    pub card_type: Option<CardType>,
    pub exp_month: Option<String>,
    pub exp_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankAccount {
    pub account_number: String,
    pub routing_number: Option<String>,
    pub account_type: Option<AccountType>,
}

/// Money-moving transaction kinds that carry payment credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsKind {
    Sale,
    Auth,
    Credit,
}

/// Modifications of a prior authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminKind {
    Capture,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentFamily {
    Card,
    Eft,
}

impl PaymentFamily {
    pub fn of(code: TransactionTypeCode) -> Self {
        if code.is_credit_card() {
            PaymentFamily::Card
        } else {
            PaymentFamily::Eft
        }
    }
}

/// One request to the gateway, in one of its three shapes.
///
/// The transaction type code follows from the variant and its kind, so a
/// request can never be sent under a code meant for another shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionRequest {
    /// `card` is `None` when a stored token stands in for the card.
    CreditCard {
        kind: FundsKind,
        amount: Decimal,
        customer: Customer,
        card: Option<CardDetails>,
    },
    /// `account` is `None` when a stored token stands in for the account.
    Eft {
        kind: FundsKind,
        amount: Decimal,
        customer: Customer,
        account: Option<BankAccount>,
    },
    Administrative {
        kind: AdminKind,
        family: PaymentFamily,
        original_trace_number: String,
        original_authorization_code: Option<String>,
    },
}

impl TransactionRequest {
    pub fn transaction_type(&self) -> TransactionTypeCode {
        use TransactionTypeCode::*;
        match self {
            TransactionRequest::CreditCard { kind, .. } => match kind {
                FundsKind::Sale => CreditCardSale,
                FundsKind::Auth => CreditCardAuth,
                FundsKind::Credit => CreditCardCredit,
            },
            TransactionRequest::Eft { kind, .. } => match kind {
                FundsKind::Sale => EftSale,
                FundsKind::Auth => EftAuth,
                FundsKind::Credit => EftCredit,
            },
            TransactionRequest::Administrative { kind, family, .. } => match (family, kind) {
                (PaymentFamily::Card, AdminKind::Capture) => CreditCardCapture,
                (PaymentFamily::Card, AdminKind::Void) => CreditCardVoid,
                (PaymentFamily::Eft, AdminKind::Capture) => EftCapture,
                (PaymentFamily::Eft, AdminKind::Void) => EftVoid,
            },
        }
    }
}
