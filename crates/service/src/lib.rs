//! Record store for the names service.
//! - `records`: the record model, the ordered in-memory store and the
//!   mutex-guarded service that persists it.
//! - `storage`: whole-file JSON persistence of the store.

pub mod errors;
pub mod records;
pub mod storage;
