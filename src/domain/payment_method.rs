use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored payment method. Holds a gateway token and masked attributes,
/// never a full card or bank account number when created by this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethodRecord {
    pub account_id: Uuid,
    pub payment_method_id: Uuid,
    pub token: Option<String>,
    pub cc_first_name: Option<String>,
    pub cc_last_name: Option<String>,
    pub cc_type: Option<String>,
    pub cc_exp_month: Option<String>,
    pub cc_exp_year: Option<String>,
    pub cc_number: Option<String>,
    pub cc_last_4: Option<String>,
    pub transit_routing_number: Option<String>,
    pub account_number: Option<String>,
    pub account_type: Option<String>,
    pub address1: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub is_default: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub tenant_id: Uuid,
}

/// Platform account, as far as the gateway integration needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: Uuid,
    /// Full name; the first `first_name_length` characters are the first name.
    pub name: String,
    pub first_name_length: Option<usize>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl AccountRecord {
    pub fn first_name(&self) -> Option<&str> {
        let len = self.first_name_length?;
        let split = char_boundary(&self.name, len);
        Some(self.name[..split].trim()).filter(|s| !s.is_empty())
    }

    /// Remainder after the first name, or the whole name when no split is known.
    pub fn last_name(&self) -> Option<&str> {
        let split = self
            .first_name_length
            .map_or(0, |len| char_boundary(&self.name, len));
        Some(self.name[split..].trim()).filter(|s| !s.is_empty())
    }
}

fn char_boundary(name: &str, chars: usize) -> usize {
    name.char_indices()
        .nth(chars)
        .map_or(name.len(), |(idx, _)| idx)
}
