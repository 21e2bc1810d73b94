use crate::domain::builders::{MerchantCredentials, build_request};
use crate::domain::field_map::{AdditionalData, FieldMap};
use crate::domain::fields::{AccountType, CardType, Field};
use crate::domain::outcome::{Currency, OperationKind, ResponseRecord, TransactionOutcome};
use crate::domain::payment_method::{AccountRecord, PaymentMethodRecord};
use crate::domain::ports::{
    AccountDirectoryBox, GatewayBox, PaymentMethodStoreBox, ResponseStoreBox,
};
use crate::domain::properties::*;
use crate::domain::request::{
    AdminKind, BankAccount, CardDetails, Customer, FundsKind, PaymentFamily, TransactionRequest,
};
use crate::error::{PaymentError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Reported as `pg_software_name`, and as `pg_entered_by` when the caller is anonymous.
pub const SOFTWARE_NAME: &str = env!("CARGO_PKG_NAME");
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platform identifiers of the transaction being dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentIds {
    pub account_id: Uuid,
    pub payment_id: Uuid,
    pub transaction_id: Uuid,
    pub payment_method_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub tenant_id: Uuid,
    pub user_name: Option<String>,
}

/// Which credentials a transaction is paid with. Only one is ever used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Token(String),
    CardNumber(String),
    AccountNumber(String),
    /// Nothing new supplied: the call modifies a prior authorization.
    None,
}

/// Picks the credential source, first match wins: token, card number, bank
/// account number. Caller properties override the stored payment method for
/// each of them.
pub fn resolve_credential_source(
    properties: &PluginProperties,
    stored: Option<&PaymentMethodRecord>,
) -> CredentialSource {
    if let Some(token) =
        properties.resolve(PROPERTY_TOKEN, stored_field(stored, |pm| pm.token.as_ref()))
    {
        CredentialSource::Token(token)
    } else if let Some(number) =
        properties.resolve(PROPERTY_CC_NUMBER, stored_field(stored, |pm| pm.cc_number.as_ref()))
    {
        CredentialSource::CardNumber(number)
    } else if let Some(number) = properties.resolve(
        PROPERTY_ACCOUNT_NUMBER,
        stored_field(stored, |pm| pm.account_number.as_ref()),
    ) {
        CredentialSource::AccountNumber(number)
    } else {
        CredentialSource::None
    }
}

fn stored_field<'a>(
    stored: Option<&'a PaymentMethodRecord>,
    pick: impl Fn(&'a PaymentMethodRecord) -> Option<&'a String>,
) -> Option<&'a str> {
    stored.and_then(pick).map(String::as_str)
}

/// Fields sent with every request so the gateway can tie the transaction
/// back to the platform.
pub fn additional_data(ids: &PaymentIds, context: &CallContext) -> AdditionalData {
    let mut data = AdditionalData::new();
    data.insert(Field::ConsumerId, ids.account_id);
    data.insert(Field::ConsumerOrderId, ids.payment_id);
    data.insert(Field::WalletId, ids.payment_method_id);
    data.insert(
        Field::EnteredBy,
        context.user_name.as_deref().unwrap_or(SOFTWARE_NAME),
    );
    data.insert(Field::SoftwareName, SOFTWARE_NAME);
    data.insert(Field::SoftwareVersion, SOFTWARE_VERSION);
    data
}

/// Turns platform payment operations into gateway transactions.
///
/// Each call resolves the credentials to use, builds exactly one request,
/// sends it and appends the response to the [`ResponseStore`] before
/// returning the outcome. There are no retries.
///
/// [`ResponseStore`]: crate::domain::ports::ResponseStore
pub struct PaymentDispatcher {
    credentials: MerchantCredentials,
    gateway: GatewayBox,
    responses: ResponseStoreBox,
    payment_methods: PaymentMethodStoreBox,
    accounts: AccountDirectoryBox,
}

impl PaymentDispatcher {
    pub fn new(
        credentials: MerchantCredentials,
        gateway: GatewayBox,
        responses: ResponseStoreBox,
        payment_methods: PaymentMethodStoreBox,
        accounts: AccountDirectoryBox,
    ) -> Self {
        Self {
            credentials,
            gateway,
            responses,
            payment_methods,
            accounts,
        }
    }

    pub async fn authorize_payment(
        &self,
        ids: PaymentIds,
        amount: Decimal,
        currency: Currency,
        properties: &PluginProperties,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        self.execute_transaction(
            OperationKind::Authorize,
            ids,
            Some(amount),
            Some(currency),
            properties,
            context,
        )
        .await
    }

    pub async fn capture_payment(
        &self,
        ids: PaymentIds,
        amount: Decimal,
        currency: Currency,
        properties: &PluginProperties,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        self.execute_transaction(
            OperationKind::Capture,
            ids,
            Some(amount),
            Some(currency),
            properties,
            context,
        )
        .await
    }

    pub async fn purchase_payment(
        &self,
        ids: PaymentIds,
        amount: Decimal,
        currency: Currency,
        properties: &PluginProperties,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        self.execute_transaction(
            OperationKind::Purchase,
            ids,
            Some(amount),
            Some(currency),
            properties,
            context,
        )
        .await
    }

    pub async fn void_payment(
        &self,
        ids: PaymentIds,
        properties: &PluginProperties,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        self.execute_transaction(OperationKind::Void, ids, None, None, properties, context)
            .await
    }

    pub async fn credit_payment(
        &self,
        ids: PaymentIds,
        amount: Decimal,
        currency: Currency,
        properties: &PluginProperties,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        self.execute_transaction(
            OperationKind::Credit,
            ids,
            Some(amount),
            Some(currency),
            properties,
            context,
        )
        .await
    }

    pub async fn refund_payment(
        &self,
        _ids: PaymentIds,
        _amount: Option<Decimal>,
        _currency: Option<Currency>,
        _properties: &PluginProperties,
        _context: &CallContext,
    ) -> Result<TransactionOutcome> {
        Err(PaymentError::UnsupportedOperation("refund".to_string()))
    }

    /// Hosted payment pages are not offered by this integration.
    pub async fn build_form_descriptor(
        &self,
        _account_id: Uuid,
        _properties: &PluginProperties,
        _context: &CallContext,
    ) -> Result<FieldMap> {
        Err(PaymentError::UnsupportedOperation(
            "hosted payment page".to_string(),
        ))
    }

    pub async fn process_notification(
        &self,
        _notification: &str,
        _properties: &PluginProperties,
        _context: &CallContext,
    ) -> Result<()> {
        Err(PaymentError::UnsupportedOperation("notification".to_string()))
    }

    /// Outcomes of every response recorded for the payment, oldest first.
    pub async fn get_payment_info(
        &self,
        payment_id: Uuid,
        context: &CallContext,
    ) -> Result<Vec<TransactionOutcome>> {
        let records = self.responses.responses(payment_id, context.tenant_id).await?;
        Ok(records.iter().map(TransactionOutcome::from).collect())
    }

    /// Stores a tokenized payment method.
    ///
    /// The gateway token must already be in `properties`. Raw card and bank
    /// account numbers are never persisted; only the last four card digits are.
    #[instrument(skip_all, fields(%account_id, %payment_method_id))]
    pub async fn add_payment_method(
        &self,
        account_id: Uuid,
        payment_method_id: Uuid,
        properties: &PluginProperties,
        is_default: bool,
        context: &CallContext,
    ) -> Result<PaymentMethodRecord> {
        let token = properties.get(PROPERTY_TOKEN).ok_or_else(|| {
            PaymentError::ValidationError(format!("{} must be specified", PROPERTY_TOKEN))
        })?;

        let owned = |key: &str| properties.get(key).map(str::to_string);
        let record = PaymentMethodRecord {
            account_id,
            payment_method_id,
            token: Some(token.to_string()),
            cc_first_name: owned(PROPERTY_CC_FIRST_NAME),
            cc_last_name: owned(PROPERTY_CC_LAST_NAME),
            cc_type: owned(PROPERTY_CC_TYPE),
            cc_exp_month: owned(PROPERTY_CC_EXPIRATION_MONTH),
            cc_exp_year: owned(PROPERTY_CC_EXPIRATION_YEAR),
            cc_number: None,
            cc_last_4: properties.get(PROPERTY_CC_NUMBER).map(last_four),
            transit_routing_number: owned(PROPERTY_TRANSIT_ROUTING_NUMBER),
            account_number: None,
            account_type: owned(PROPERTY_ACCOUNT_TYPE),
            address1: owned(PROPERTY_ADDRESS1),
            state: owned(PROPERTY_STATE),
            zip: owned(PROPERTY_ZIP),
            is_default,
            created_at: Some(Utc::now()),
            tenant_id: context.tenant_id,
        };

        self.payment_methods
            .add_payment_method(record.clone())
            .await?;
        info!("payment method stored");
        Ok(record)
    }

    /// Runs one payment operation end to end.
    ///
    /// Capture and void always modify the last approved authorization of the
    /// payment; the other kinds pay with whatever [`resolve_credential_source`]
    /// picks.
    #[instrument(
        skip_all,
        fields(kind = %kind, payment_id = %ids.payment_id, transaction_id = %ids.transaction_id)
    )]
    pub async fn execute_transaction(
        &self,
        kind: OperationKind,
        ids: PaymentIds,
        amount: Option<Decimal>,
        currency: Option<Currency>,
        properties: &PluginProperties,
        context: &CallContext,
    ) -> Result<TransactionOutcome> {
        let mut additional = additional_data(&ids, context);

        let request = match kind {
            OperationKind::Refund => {
                return Err(PaymentError::UnsupportedOperation("refund".to_string()));
            }
            OperationKind::Capture => self.modification(AdminKind::Capture, &ids, context).await?,
            OperationKind::Void => self.modification(AdminKind::Void, &ids, context).await?,
            OperationKind::Authorize | OperationKind::Purchase | OperationKind::Credit => {
                let funds = match kind {
                    OperationKind::Authorize => FundsKind::Auth,
                    OperationKind::Purchase => FundsKind::Sale,
                    _ => FundsKind::Credit,
                };
                let amount = amount.ok_or_else(|| {
                    PaymentError::ValidationError(format!("{} requires an amount", kind))
                })?;
                let account = self.accounts.get_account(ids.account_id, context.tenant_id).await?;
                let stored = self
                    .payment_methods
                    .get_payment_method(ids.payment_method_id, context.tenant_id)
                    .await?;
                funds_request(
                    funds,
                    amount,
                    account.as_ref(),
                    stored.as_ref(),
                    properties,
                    &mut additional,
                )?
            }
        };

        let fields = build_request(&self.credentials, &request, &additional);
        let response = self.gateway.exchange(fields).await?;

        let record = ResponseRecord {
            account_id: ids.account_id,
            payment_id: ids.payment_id,
            transaction_id: ids.transaction_id,
            kind,
            amount,
            currency,
            response,
            created_at: Utc::now(),
            tenant_id: context.tenant_id,
        };
        let outcome = TransactionOutcome::from(&record);

        if let Err(e) = self.responses.add_response(record).await {
            error!(
                error = %e,
                trace_number = outcome.trace_number.as_deref().unwrap_or_default(),
                "payment went through at the gateway, but the local record failed"
            );
            return Err(PaymentError::PersistenceAfterGateway {
                outcome: Box::new(outcome),
                source: Box::new(e),
            });
        }

        if outcome.is_approved() {
            info!(
                trace_number = outcome.trace_number.as_deref().unwrap_or_default(),
                "transaction approved"
            );
        } else {
            warn!(
                response_type = outcome.response_type.as_deref().unwrap_or_default(),
                response_code = outcome.response_code.as_deref().unwrap_or_default(),
                description = outcome.response_description.as_deref().unwrap_or_default(),
                "transaction not approved"
            );
        }
        Ok(outcome)
    }

    async fn modification(
        &self,
        kind: AdminKind,
        ids: &PaymentIds,
        context: &CallContext,
    ) -> Result<TransactionRequest> {
        let prior = self
            .responses
            .last_successful_authorization(ids.payment_id, context.tenant_id)
            .await?
            .ok_or(PaymentError::MissingPriorAuthorization {
                payment_id: ids.payment_id,
            })?;

        Ok(TransactionRequest::Administrative {
            kind,
            family: prior
                .transaction_type
                .map_or(PaymentFamily::Eft, PaymentFamily::of),
            original_trace_number: prior.trace_number,
            original_authorization_code: prior.authorization_code,
        })
    }
}

fn funds_request(
    kind: FundsKind,
    amount: Decimal,
    account: Option<&AccountRecord>,
    stored: Option<&PaymentMethodRecord>,
    properties: &PluginProperties,
    additional: &mut AdditionalData,
) -> Result<TransactionRequest> {
    let fallback = |pick: fn(&PaymentMethodRecord) -> Option<&String>| stored_field(stored, pick);
    let customer = Customer {
        first_name: properties.resolve(PROPERTY_FIRST_NAME, account.and_then(AccountRecord::first_name)),
        last_name: properties.resolve(PROPERTY_LAST_NAME, account.and_then(AccountRecord::last_name)),
        street_line1: properties.resolve(PROPERTY_ADDRESS1, fallback(|pm| pm.address1.as_ref())),
        state: properties.resolve(PROPERTY_STATE, fallback(|pm| pm.state.as_ref())),
        zip: properties.resolve(PROPERTY_ZIP, fallback(|pm| pm.zip.as_ref())),
        phone: properties.resolve(PROPERTY_PHONE, account.and_then(|a| a.phone.as_deref())),
        email: properties.resolve(PROPERTY_EMAIL, account.and_then(|a| a.email.as_deref())),
    };

    match resolve_credential_source(properties, stored) {
        CredentialSource::Token(token) => {
            additional.insert(Field::PaymentMethodId, token);
            let is_card = stored.is_some_and(|pm| pm.cc_type.is_some())
                || properties.get(PROPERTY_CC_TYPE).is_some();
            Ok(if is_card {
                TransactionRequest::CreditCard {
                    kind,
                    amount,
                    customer,
                    card: None,
                }
            } else {
                TransactionRequest::Eft {
                    kind,
                    amount,
                    customer,
                    account: None,
                }
            })
        }
        CredentialSource::CardNumber(number) => {
            let card_type = properties
                .resolve(PROPERTY_CC_TYPE, fallback(|pm| pm.cc_type.as_ref()))
                .map(|code| code.parse::<CardType>())
                .transpose()?;
            let first = properties.resolve(PROPERTY_CC_FIRST_NAME, fallback(|pm| pm.cc_first_name.as_ref()));
            let last = properties.resolve(PROPERTY_CC_LAST_NAME, fallback(|pm| pm.cc_last_name.as_ref()));
            let holder_name = match (first, last) {
                (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                (first, last) => first.or(last),
            };
            Ok(TransactionRequest::CreditCard {
                kind,
                amount,
                customer,
                card: Some(CardDetails {
                    number,
                    holder_name,
                    card_type,
                    exp_month: properties.resolve(
                        PROPERTY_CC_EXPIRATION_MONTH,
                        fallback(|pm| pm.cc_exp_month.as_ref()),
                    ),
                    exp_year: properties.resolve(
                        PROPERTY_CC_EXPIRATION_YEAR,
                        fallback(|pm| pm.cc_exp_year.as_ref()),
                    ),
                }),
            })
        }
        CredentialSource::AccountNumber(account_number) => {
            let account_type = properties
                .resolve(PROPERTY_ACCOUNT_TYPE, fallback(|pm| pm.account_type.as_ref()))
                .map(|code| code.parse::<AccountType>())
                .transpose()?;
            Ok(TransactionRequest::Eft {
                kind,
                amount,
                customer,
                account: Some(BankAccount {
                    account_number,
                    routing_number: properties.resolve(
                        PROPERTY_TRANSIT_ROUTING_NUMBER,
                        fallback(|pm| pm.transit_routing_number.as_ref()),
                    ),
                    account_type,
                }),
            })
        }
        CredentialSource::None => Err(PaymentError::ValidationError(
            "no token, card number or bank account number supplied".to_string(),
        )),
    }
}

fn last_four(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    digits[digits.len().saturating_sub(4)..].iter().collect()
}
