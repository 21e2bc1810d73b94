use crate::domain::outcome::{ResponseRecord, StoredAuthorization};
use crate::domain::payment_method::PaymentMethodRecord;
use crate::domain::ports::{PaymentMethodStore, ResponseStore};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Column Family for the append-only gateway response log.
pub const CF_RESPONSES: &str = "responses";
/// Column Family for stored payment methods.
pub const CF_PAYMENT_METHODS: &str = "payment_methods";

/// A persistent store implementation using RocksDB.
///
/// Responses are keyed `tenant ++ payment ++ created_at ++ transaction`, so the
/// responses of one payment sit next to each other in append order and a
/// prefix scan lists them. Payment methods are keyed `tenant ++ id`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("responses" and "payment_methods") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_responses = ColumnFamilyDescriptor::new(CF_RESPONSES, Options::default());
        let cf_payment_methods =
            ColumnFamilyDescriptor::new(CF_PAYMENT_METHODS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_responses, cf_payment_methods])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::StorageError(format!("{} column family not found", name)))
    }

    fn scan_responses(&self, payment_id: Uuid, tenant_id: Uuid) -> Result<Vec<ResponseRecord>> {
        let cf = self.cf(CF_RESPONSES)?;
        let prefix = payment_prefix(tenant_id, payment_id);

        let mut records = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            records.push(decode(&value)?);
        }
        Ok(records)
    }
}

fn payment_prefix(tenant_id: Uuid, payment_id: Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(56);
    key.extend_from_slice(tenant_id.as_bytes());
    key.extend_from_slice(payment_id.as_bytes());
    key
}

fn response_key(record: &ResponseRecord) -> Vec<u8> {
    let mut key = payment_prefix(record.tenant_id, record.payment_id);
    // Offset so pre-epoch timestamps still sort before later ones.
    let micros = (record.created_at.timestamp_micros() as u64) ^ (1 << 63);
    key.extend_from_slice(&micros.to_be_bytes());
    key.extend_from_slice(record.transaction_id.as_bytes());
    key
}

fn payment_method_key(tenant_id: Uuid, payment_method_id: Uuid) -> Vec<u8> {
    payment_prefix(tenant_id, payment_method_id)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| PaymentError::StorageError(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::StorageError(format!("Deserialization error: {}", e)))
}

#[async_trait]
impl ResponseStore for RocksDBStore {
    async fn add_response(&self, record: ResponseRecord) -> Result<()> {
        let cf = self.cf(CF_RESPONSES)?;
        self.db.put_cf(cf, response_key(&record), encode(&record)?)?;
        Ok(())
    }

    async fn last_successful_authorization(
        &self,
        payment_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<StoredAuthorization>> {
        Ok(self
            .scan_responses(payment_id, tenant_id)?
            .iter()
            .rev()
            .find(|r| r.is_successful_authorization())
            .and_then(ResponseRecord::stored_authorization))
    }

    async fn responses(&self, payment_id: Uuid, tenant_id: Uuid) -> Result<Vec<ResponseRecord>> {
        self.scan_responses(payment_id, tenant_id)
    }
}

#[async_trait]
impl PaymentMethodStore for RocksDBStore {
    async fn get_payment_method(
        &self,
        payment_method_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<PaymentMethodRecord>> {
        let cf = self.cf(CF_PAYMENT_METHODS)?;
        match self
            .db
            .get_cf(cf, payment_method_key(tenant_id, payment_method_id))?
        {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn add_payment_method(&self, record: PaymentMethodRecord) -> Result<()> {
        let cf = self.cf(CF_PAYMENT_METHODS)?;
        let key = payment_method_key(record.tenant_id, record.payment_method_id);
        self.db.put_cf(cf, key, encode(&record)?)?;
        Ok(())
    }
}
