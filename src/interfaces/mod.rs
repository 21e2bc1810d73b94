//! Batch surface: operations in, outcomes out, both as CSV.

pub mod csv {
    pub mod operation_reader;
    pub mod outcome_writer;
}
