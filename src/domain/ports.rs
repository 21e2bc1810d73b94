use super::field_map::FieldMap;
use super::outcome::{ResponseRecord, StoredAuthorization};
use super::payment_method::{AccountRecord, PaymentMethodRecord};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Durable log of gateway responses.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn add_response(&self, record: ResponseRecord) -> Result<()>;

    /// Most recent approved authorize or purchase recorded for the payment.
    async fn last_successful_authorization(
        &self,
        payment_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<StoredAuthorization>>;

    /// All responses recorded for the payment, oldest first.
    async fn responses(&self, payment_id: Uuid, tenant_id: Uuid) -> Result<Vec<ResponseRecord>>;
}

#[async_trait]
pub trait PaymentMethodStore: Send + Sync {
    async fn get_payment_method(
        &self,
        payment_method_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<PaymentMethodRecord>>;

    async fn add_payment_method(&self, record: PaymentMethodRecord) -> Result<()>;
}

/// Read-only view of the platform's accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn get_account(&self, account_id: Uuid, tenant_id: Uuid) -> Result<Option<AccountRecord>>;
}

/// Performs exactly one request/response round trip with the payment gateway.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn exchange(&self, request: FieldMap) -> Result<FieldMap>;
}

pub type ResponseStoreBox = Box<dyn ResponseStore>;
pub type PaymentMethodStoreBox = Box<dyn PaymentMethodStore>;
pub type AccountDirectoryBox = Box<dyn AccountDirectory>;
pub type GatewayBox = Box<dyn Gateway>;
