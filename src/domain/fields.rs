use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Line terminating every request and response message.
pub const END_OF_DATA: &str = "endofdata";

/// `pg_response_type` value of an approved transaction.
pub const RESPONSE_TYPE_APPROVAL: &str = "A";

pub const DEFAULT_PORT: u16 = 6050;

macro_rules! field_catalog {
    ($($variant:ident => $name:literal,)+) => {
        /// Closed vocabulary of request and response keys understood by the gateway.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Field {
            $($variant,)+
        }

        impl Field {
            pub const ALL: &'static [Field] = &[$(Field::$variant,)+];

            /// Wire name of the field.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Field::$variant => $name,)+
                }
            }

            pub fn from_name(name: &str) -> Option<Field> {
                match name {
                    $($name => Some(Field::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

field_catalog! {
    MerchantId => "pg_merchant_id",
    Password => "pg_password",
    TransactionType => "pg_transaction_type",
    MerchantData1 => "pg_merchant_data_1",
    MerchantData2 => "pg_merchant_data_2",
    MerchantData3 => "pg_merchant_data_3",
    MerchantData4 => "pg_merchant_data_4",
    MerchantData5 => "pg_merchant_data_5",
    MerchantData6 => "pg_merchant_data_6",
    MerchantData7 => "pg_merchant_data_7",
    MerchantData8 => "pg_merchant_data_8",
    MerchantData9 => "pg_merchant_data_9",
    TotalAmount => "pg_total_amount",
    SalesTaxAmount => "pg_sales_tax_amount",
    ConsumerId => "pg_consumer_id",
    ConsumerOrderId => "ecom_consumerorderid",
    WalletId => "ecom_walletid",
    CustomerToken => "pg_customer_token",
    ClientId => "pg_client_id",
    BillToCompany => "pg_billto_postal_name_company",
    BillToFirstName => "ecom_billto_postal_name_first",
    BillToLastName => "ecom_billto_postal_name_last",
    BillToStreetLine1 => "ecom_billto_postal_street_line1",
    BillToStreetLine2 => "ecom_billto_postal_street_line2",
    BillToCity => "ecom_billto_postal_city",
    BillToState => "ecom_billto_postal_stateprov",
    BillToPostalCode => "ecom_billto_postal_postalcode",
    BillToCountryCode => "ecom_billto_postal_countrycode",
    BillToPhone => "ecom_billto_telecom_phone_number",
    BillToEmail => "ecom_billto_online_email",
    BillToSsn => "pg_billto_ssn",
    BillToDlNumber => "pg_billto_dl_number",
    BillToDlState => "pg_billto_dl_state",
    BillToDateOfBirth => "pg_billto_date_of_birth",
    EnteredBy => "pg_entered_by",
    ScheduleQuantity => "pg_schedule_quantity",
    ScheduleFrequency => "pg_schedule_frequency",
    ScheduleRecurringAmount => "pg_schedule_recurring_amount",
    ScheduleStartDate => "pg_schedule_start_date",
    CustomerIpAddress => "pg_customer_ip_address",
    MerchantRecurring => "pg_merchant_recurring",
    SoftwareName => "pg_software_name",
    SoftwareVersion => "pg_software_version",
    AvsMethod => "pg_avs_method",
    CardType => "ecom_payment_card_type",
    CardName => "ecom_payment_card_name",
    CardNumber => "ecom_payment_card_number",
    CardExpMonth => "ecom_payment_card_expdate_month",
    CardExpYear => "ecom_payment_card_expdate_year",
    CardVerification => "ecom_payment_card_verification",
    ProcurementCard => "pg_procurement_card",
    CustomerAcctCode => "pg_customer_acct_code",
    CcSwipeData => "pg_cc_swipe_data",
    CcEncSwipeData => "pg_cc_enc_swipe_data",
    CcEncDecryptor => "pg_cc_enc_decryptor",
    SecureData3d => "ecom_3d_secure_data",
    SecureAuthenticated3d => "ecom_3d_secure_authenticated",
    PartialAuthAllowed => "pg_partial_auth_allowed_flag",
    MailOrPhoneOrder => "pg_mail_or_phone_order",
    PaymentToken => "pg_payment_token",
    PaymentMethodId => "pg_payment_method_id",
    OnetimeToken => "pg_onetime_token",
    CheckTrn => "ecom_payment_check_trn",
    CheckAccount => "ecom_payment_check_account",
    CheckAccountType => "ecom_payment_check_account_type",
    CheckNumber => "ecom_payment_check_checkno",
    EntryClassCode => "pg_entry_class_code",
    TraceNumber => "pg_trace_number",
    AuthorizationCode => "pg_authorization_code",
    OriginalTraceNumber => "pg_original_trace_number",
    OriginalAuthorizationCode => "pg_original_authorization_code",
    ResponseType => "pg_response_type",
    ResponseDescription => "pg_response_description",
    ResponseCode => "pg_response_code",
    AvsResult => "pg_avs_result",
    PreauthResult => "pg_preauth_result",
    PreauthDescription => "pg_preauth_description",
    PreauthNegReport => "pg_preauth_neg_report",
    Cvv2Result => "pg_cvv2_result",
    SecureResult3d => "pg_3d_secure_result",
    AvailableCardBalance => "pg_available_card_balance",
    RequestedAmount => "pg_requested_amount",
    ConvenienceFee => "pg_convenience_fee",
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of `pg_transaction_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionTypeCode {
    CreditCardSale,
    CreditCardAuth,
    CreditCardCapture,
    CreditCardCredit,
    CreditCardVoid,
    EftSale,
    EftAuth,
    EftCapture,
    EftCredit,
    EftVoid,
}

impl TransactionTypeCode {
    pub const fn code(self) -> &'static str {
        match self {
            TransactionTypeCode::CreditCardSale => "10",
            TransactionTypeCode::CreditCardAuth => "11",
            TransactionTypeCode::CreditCardCapture => "12",
            TransactionTypeCode::CreditCardCredit => "13",
            TransactionTypeCode::CreditCardVoid => "14",
            TransactionTypeCode::EftSale => "20",
            TransactionTypeCode::EftAuth => "21",
            TransactionTypeCode::EftCapture => "22",
            TransactionTypeCode::EftCredit => "23",
            TransactionTypeCode::EftVoid => "24",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "10" => Some(TransactionTypeCode::CreditCardSale),
            "11" => Some(TransactionTypeCode::CreditCardAuth),
            "12" => Some(TransactionTypeCode::CreditCardCapture),
            "13" => Some(TransactionTypeCode::CreditCardCredit),
            "14" => Some(TransactionTypeCode::CreditCardVoid),
            "20" => Some(TransactionTypeCode::EftSale),
            "21" => Some(TransactionTypeCode::EftAuth),
            "22" => Some(TransactionTypeCode::EftCapture),
            "23" => Some(TransactionTypeCode::EftCredit),
            "24" => Some(TransactionTypeCode::EftVoid),
            _ => None,
        }
    }

    pub fn is_credit_card(self) -> bool {
        self.code().starts_with('1')
    }
}

/// Card network, sent as `ecom_payment_card_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Visa,
    MasterCard,
    Amex,
    Discover,
    Diners,
    Jcb,
}

impl CardType {
    pub const fn code(self) -> &'static str {
        match self {
            CardType::Visa => "VISA",
            CardType::MasterCard => "MAST",
            CardType::Amex => "AMER",
            CardType::Discover => "DISC",
            CardType::Diners => "DINE",
            CardType::Jcb => "JCB",
        }
    }
}

impl FromStr for CardType {
    type Err = PaymentError;

    /// Accepts the gateway code or the usual network name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "");
        match normalized.as_str() {
            "visa" => Ok(CardType::Visa),
            "mast" | "master" | "mastercard" => Ok(CardType::MasterCard),
            "amer" | "amex" | "americanexpress" => Ok(CardType::Amex),
            "disc" | "discover" => Ok(CardType::Discover),
            "dine" | "diners" | "dinersclub" => Ok(CardType::Diners),
            "jcb" => Ok(CardType::Jcb),
            _ => Err(PaymentError::ValidationError(format!(
                "Unknown card type: {}",
                s
            ))),
        }
    }
}

/// Bank account kind, sent as `ecom_payment_check_account_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    pub const fn code(self) -> &'static str {
        match self {
            AccountType::Checking => "C",
            AccountType::Savings => "S",
        }
    }
}

impl FromStr for AccountType {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "checking" => Ok(AccountType::Checking),
            "s" | "savings" => Ok(AccountType::Savings),
            _ => Err(PaymentError::ValidationError(format!(
                "Unknown account type: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_unique_and_reversible() {
        let mut seen = std::collections::HashSet::new();
        for field in Field::ALL {
            assert!(seen.insert(field.as_str()), "duplicate key {}", field);
            assert_eq!(Field::from_name(field.as_str()), Some(*field));
        }
        assert_eq!(Field::from_name("pg_unknown"), None);
    }

    #[test]
    fn test_transaction_type_codes() {
        assert_eq!(TransactionTypeCode::CreditCardAuth.code(), "11");
        assert_eq!(TransactionTypeCode::EftVoid.code(), "24");
        assert_eq!(
            TransactionTypeCode::from_code("12"),
            Some(TransactionTypeCode::CreditCardCapture)
        );
        assert!(TransactionTypeCode::CreditCardCredit.is_credit_card());
        assert!(!TransactionTypeCode::EftSale.is_credit_card());
        assert_eq!(TransactionTypeCode::from_code("99"), None);
    }

    #[test]
    fn test_card_type_parsing() {
        assert_eq!("Visa".parse::<CardType>().unwrap(), CardType::Visa);
        assert_eq!("MAST".parse::<CardType>().unwrap(), CardType::MasterCard);
        assert_eq!(
            "american_express".parse::<CardType>().unwrap(),
            CardType::Amex
        );
        assert_eq!("Diners Club".parse::<CardType>().unwrap(), CardType::Diners);
        assert!(matches!(
            "maestro".parse::<CardType>(),
            Err(PaymentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!("S".parse::<AccountType>().unwrap(), AccountType::Savings);
        assert_eq!(
            "checking".parse::<AccountType>().unwrap(),
            AccountType::Checking
        );
        assert!("x".parse::<AccountType>().is_err());
    }
}
