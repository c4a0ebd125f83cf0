pub mod model;
pub mod repository;
pub mod service;
pub mod store;

pub use model::{Patch, Record, NAME_KEY};
pub use repository::RecordRepository;
pub use service::{RecordService, ServiceOptions};
pub use store::RecordStore;
