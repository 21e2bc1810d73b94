//! Gateway vocabulary, request shapes and the ports the dispatcher consumes.

pub mod builders;
pub mod field_map;
pub mod fields;
pub mod outcome;
pub mod payment_method;
pub mod ports;
pub mod properties;
pub mod request;
