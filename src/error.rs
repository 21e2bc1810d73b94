use crate::domain::outcome::TransactionOutcome;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while dispatching a payment transaction to the gateway.
///
/// A declined transaction is not an error: it comes back as a
/// [`TransactionOutcome`] whose status is not processed.
#[derive(Error, Diagnostic, Debug)]
pub enum PaymentError {
    /// A required request field is missing or malformed. Raised before any
    /// connection is opened.
    #[error("Validation error: {0}")]
    #[diagnostic(code(forte_agi::validation))]
    ValidationError(String),

    /// Connection, TLS handshake, timeout or stream failure.
    #[error("Transport error: {0}")]
    #[diagnostic(code(forte_agi::transport))]
    TransportError(#[from] std::io::Error),

    /// The gateway answered with something that is not `name=value` lines.
    #[error("Protocol framing error: {0}")]
    #[diagnostic(code(forte_agi::framing))]
    FramingError(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(forte_agi::config))]
    ConfigError(String),

    /// Capture or void requested without a recorded successful authorization.
    #[error("No successful authorization recorded for payment {payment_id}")]
    #[diagnostic(
        code(forte_agi::missing_authorization),
        help("capture and void need an approved authorize or purchase for the same payment")
    )]
    MissingPriorAuthorization { payment_id: uuid::Uuid },

    /// The gateway processed the transaction but the local record could not be
    /// written. Money may have moved: reconcile from the attached outcome.
    #[error(
        "Payment went through at the gateway, but the local record failed. Payment details: {:?}",
        .outcome.raw_response
    )]
    #[diagnostic(
        code(forte_agi::persistence_after_gateway),
        severity(Error),
        help("the transaction was accepted by the gateway; record it manually")
    )]
    PersistenceAfterGateway {
        outcome: Box<TransactionOutcome>,
        #[source]
        source: Box<PaymentError>,
    },

    #[error("{0}: unsupported operation")]
    #[diagnostic(code(forte_agi::unsupported))]
    UnsupportedOperation(String),

    #[error("Storage error: {0}")]
    #[diagnostic(code(forte_agi::storage))]
    StorageError(String),

    #[error("CSV error: {0}")]
    #[diagnostic(code(forte_agi::csv))]
    CsvError(#[from] csv::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(forte_agi::internal))]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        PaymentError::StorageError(err.into_string())
    }
}

impl PaymentError {
    /// True when the gateway accepted the request even though the call failed.
    pub fn reached_gateway(&self) -> bool {
        matches!(self, PaymentError::PersistenceAfterGateway { .. })
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
