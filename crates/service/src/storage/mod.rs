//! Storage for the service layer
//!
//! The store is persisted as one JSON document that is rewritten in full
//! after every mutation.

pub mod json_file;
