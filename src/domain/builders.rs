//! Pure functions turning a [`TransactionRequest`] into the outbound field map.

use super::field_map::{AdditionalData, FieldMap};
use super::fields::Field;
use super::request::{BankAccount, CardDetails, Customer, TransactionRequest};
use rust_decimal::Decimal;

/// Merchant login sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub struct MerchantCredentials {
    pub merchant_id: String,
    pub password: String,
}

impl std::fmt::Debug for MerchantCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MerchantCredentials")
            .field("merchant_id", &self.merchant_id)
            .field("password", &"***")
            .finish()
    }
}

/// Builds the complete request: credentials and transaction type first, then
/// the shape-specific fields, then `additional` on top.
pub fn build_request(
    credentials: &MerchantCredentials,
    request: &TransactionRequest,
    additional: &AdditionalData,
) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(Field::MerchantId, &credentials.merchant_id);
    fields.insert(Field::Password, &credentials.password);
    fields.insert(Field::TransactionType, request.transaction_type().code());

    match request {
        TransactionRequest::CreditCard {
            amount,
            customer,
            card,
            ..
        } => {
            if let Some(card) = card {
                put_card(&mut fields, card);
            }
            put_common(&mut fields, *amount, customer);
        }
        TransactionRequest::Eft {
            amount,
            customer,
            account,
            ..
        } => {
            if let Some(account) = account {
                put_bank_account(&mut fields, account);
            }
            put_common(&mut fields, *amount, customer);
        }
        TransactionRequest::Administrative {
            original_trace_number,
            original_authorization_code,
            ..
        } => {
            fields.insert(Field::OriginalTraceNumber, original_trace_number);
            fields.insert_opt(
                Field::OriginalAuthorizationCode,
                original_authorization_code.as_deref(),
            );
        }
    }

    fields.merge(additional);
    fields
}

fn put_card(fields: &mut FieldMap, card: &CardDetails) {
    fields.insert_opt(Field::CardName, card.holder_name.as_deref());
    fields.insert_opt(Field::CardType, card.card_type.map(|t| t.code()));
    fields.insert(Field::CardNumber, &card.number);
    fields.insert_opt(Field::CardExpMonth, card.exp_month.as_deref());
    fields.insert_opt(Field::CardExpYear, card.exp_year.as_deref());
}

fn put_bank_account(fields: &mut FieldMap, account: &BankAccount) {
    fields.insert_opt(Field::CheckTrn, account.routing_number.as_deref());
    fields.insert(Field::CheckAccount, &account.account_number);
    fields.insert_opt(Field::CheckAccountType, account.account_type.map(|t| t.code()));
}

fn put_common(fields: &mut FieldMap, amount: Decimal, customer: &Customer) {
    fields.insert(Field::TotalAmount, amount);
    fields.insert_opt(Field::BillToFirstName, customer.first_name.as_deref());
    fields.insert_opt(Field::BillToLastName, customer.last_name.as_deref());
    fields.insert_opt(Field::BillToStreetLine1, customer.street_line1.as_deref());
    fields.insert_opt(Field::BillToState, customer.state.as_deref());
    fields.insert_opt(Field::BillToPostalCode, customer.zip.as_deref());
    fields.insert_opt(Field::BillToPhone, customer.phone.as_deref());
    fields.insert_opt(Field::BillToEmail, customer.email.as_deref());
}
