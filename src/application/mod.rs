//! Application layer orchestrating payment operations.
//!
//! This module defines the `PaymentDispatcher`, the single entry point that
//! turns platform payment operations into gateway transactions and records
//! their responses.

pub mod dispatcher;
