use crate::domain::outcome::{ResponseRecord, StoredAuthorization};
use crate::domain::payment_method::{AccountRecord, PaymentMethodRecord};
use crate::domain::ports::{AccountDirectory, PaymentMethodStore, ResponseStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe, append-only in-memory log of gateway responses.
///
/// Uses `Arc<RwLock<Vec<ResponseRecord>>>` so clones share the same log.
/// Ideal for testing or short-lived batch runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryResponseStore {
    records: Arc<RwLock<Vec<ResponseRecord>>>,
}

impl InMemoryResponseStore {
    /// Creates a new, empty in-memory response store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResponseStore for InMemoryResponseStore {
    async fn add_response(&self, record: ResponseRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn last_successful_authorization(
        &self,
        payment_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<StoredAuthorization>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.payment_id == payment_id && r.tenant_id == tenant_id)
            .find(|r| r.is_successful_authorization())
            .and_then(ResponseRecord::stored_authorization))
    }

    async fn responses(&self, payment_id: Uuid, tenant_id: Uuid) -> Result<Vec<ResponseRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.payment_id == payment_id && r.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

/// A thread-safe in-memory store for payment methods, keyed by tenant and id.
#[derive(Default, Clone)]
pub struct InMemoryPaymentMethodStore {
    methods: Arc<RwLock<HashMap<(Uuid, Uuid), PaymentMethodRecord>>>,
}

impl InMemoryPaymentMethodStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentMethodStore for InMemoryPaymentMethodStore {
    async fn get_payment_method(
        &self,
        payment_method_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<PaymentMethodRecord>> {
        let methods = self.methods.read().await;
        Ok(methods.get(&(tenant_id, payment_method_id)).cloned())
    }

    async fn add_payment_method(&self, record: PaymentMethodRecord) -> Result<()> {
        let mut methods = self.methods.write().await;
        methods.insert((record.tenant_id, record.payment_method_id), record);
        Ok(())
    }
}

/// Fixed set of accounts, for tests and batch runs.
#[derive(Default, Clone)]
pub struct InMemoryAccountDirectory {
    accounts: Arc<RwLock<HashMap<Uuid, AccountRecord>>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, account: AccountRecord) {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.account_id, account);
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn get_account(&self, account_id: Uuid, _tenant_id: Uuid) -> Result<Option<AccountRecord>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&account_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field_map::FieldMap;
    use crate::domain::outcome::OperationKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record(payment_id: Uuid, kind: OperationKind, response_type: &str, trace: &str) -> ResponseRecord {
        ResponseRecord {
            account_id: Uuid::new_v4(),
            payment_id,
            transaction_id: Uuid::new_v4(),
            kind,
            amount: Some(dec!(10)),
            currency: None,
            response: [
                ("pg_response_type", response_type),
                ("pg_trace_number", trace),
                ("pg_authorization_code", "AUTH"),
            ]
            .into_iter()
            .collect::<FieldMap>(),
            created_at: Utc::now(),
            tenant_id: Uuid::nil(),
        }
    }

    #[tokio::test]
    async fn test_last_successful_authorization_picks_latest_approval() {
        let store = InMemoryResponseStore::new();
        let payment = Uuid::new_v4();

        store
            .add_response(record(payment, OperationKind::Authorize, "A", "T-1"))
            .await
            .unwrap();
        store
            .add_response(record(payment, OperationKind::Authorize, "A", "T-2"))
            .await
            .unwrap();
        store
            .add_response(record(payment, OperationKind::Authorize, "D", "T-3"))
            .await
            .unwrap();
        store
            .add_response(record(payment, OperationKind::Capture, "A", "T-4"))
            .await
            .unwrap();

        let stored = store
            .last_successful_authorization(payment, Uuid::nil())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.trace_number, "T-2");
    }

    #[tokio::test]
    async fn test_lookup_is_idempotent_and_tenant_scoped() {
        let store = InMemoryResponseStore::new();
        let payment = Uuid::new_v4();
        store
            .add_response(record(payment, OperationKind::Purchase, "A", "T-1"))
            .await
            .unwrap();

        let first = store.last_successful_authorization(payment, Uuid::nil()).await.unwrap();
        let second = store.last_successful_authorization(payment, Uuid::nil()).await.unwrap();
        assert_eq!(first, second);

        let other_tenant = store
            .last_successful_authorization(payment, Uuid::new_v4())
            .await
            .unwrap();
        assert!(other_tenant.is_none());
    }

    #[tokio::test]
    async fn test_responses_in_append_order() {
        let store = InMemoryResponseStore::new();
        let payment = Uuid::new_v4();
        store
            .add_response(record(payment, OperationKind::Authorize, "A", "T-1"))
            .await
            .unwrap();
        store
            .add_response(record(Uuid::new_v4(), OperationKind::Authorize, "A", "X"))
            .await
            .unwrap();
        store
            .add_response(record(payment, OperationKind::Capture, "A", "T-2"))
            .await
            .unwrap();

        let responses = store.responses(payment, Uuid::nil()).await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].kind, OperationKind::Authorize);
        assert_eq!(responses[1].kind, OperationKind::Capture);
    }

    #[tokio::test]
    async fn test_in_memory_payment_method_store() {
        let store = InMemoryPaymentMethodStore::new();
        let method = PaymentMethodRecord {
            payment_method_id: Uuid::new_v4(),
            token: Some("tok_1".to_string()),
            ..Default::default()
        };

        store.add_payment_method(method.clone()).await.unwrap();
        let retrieved = store
            .get_payment_method(method.payment_method_id, Uuid::nil())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, method);

        assert!(store
            .get_payment_method(method.payment_method_id, Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
