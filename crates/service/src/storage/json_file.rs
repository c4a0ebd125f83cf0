use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tokio::fs;

use crate::errors::ServiceError;
use crate::records::Record;

/// Backing file holding a JSON array of records.
///
/// No locking happens here; callers serialize access to the file.
#[derive(Clone, Debug)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file.
    pub async fn load(&self) -> Result<Vec<Record>, ServiceError> {
        let bytes = fs::read(&self.path).await.map_err(ServiceError::storage)?;
        serde_json::from_slice(&bytes).map_err(ServiceError::storage)
    }

    /// Overwrite the file with `records`, indented by four spaces.
    pub async fn save(&self, records: &[Record]) -> Result<(), ServiceError> {
        let data = encode_pretty(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }
        fs::write(&self.path, data).await.map_err(ServiceError::storage)?;
        Ok(())
    }
}

fn encode_pretty(records: &[Record]) -> Result<Vec<u8>, ServiceError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser).map_err(ServiceError::storage)?;
    Ok(buf)
}
