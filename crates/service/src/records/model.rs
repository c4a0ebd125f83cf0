use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Key holding a record's identity.
pub const NAME_KEY: &str = "name";

/// A bag of string fields with a mandatory, non-empty `name`.
///
/// Keys keep the order they were first written in, both on the wire and in
/// the backing file; `name` sits wherever the client put it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "IndexMap<String, String>")]
pub struct Record {
    fields: IndexMap<String, String>,
}

impl Record {
    pub fn name(&self) -> &str {
        self.fields.get(NAME_KEY).map(String::as_str).unwrap_or_default()
    }

    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    /// Validate a request body for insertion.
    ///
    /// Checks run in the order clients observe them: object shape, presence
    /// of `name`, string-only values, then non-empty `name`.
    pub fn from_json(value: Value) -> Result<Self, ServiceError> {
        let Value::Object(object) = value else {
            return Err(ServiceError::Malformed);
        };
        if !object.contains_key(NAME_KEY) {
            return Err(ServiceError::MissingName);
        }
        let fields = string_fields(object)?;
        if fields.get(NAME_KEY).map_or(true, String::is_empty) {
            return Err(ServiceError::EmptyName);
        }
        Ok(Self { fields })
    }

    /// Merge `patch` in place. Existing keys keep their position, new keys
    /// are appended and empty values remove the key. `name` is never empty
    /// in a `Patch`, so the record keeps an identity.
    pub(crate) fn apply(&mut self, patch: &Patch) {
        for (key, value) in &patch.0 {
            if value.is_empty() {
                self.fields.shift_remove(key);
            } else {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

impl TryFrom<IndexMap<String, String>> for Record {
    type Error = ServiceError;

    fn try_from(fields: IndexMap<String, String>) -> Result<Self, Self::Error> {
        match fields.get(NAME_KEY) {
            None => Err(ServiceError::MissingName),
            Some(name) if name.is_empty() => Err(ServiceError::EmptyName),
            Some(_) => Ok(Self { fields }),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Partial update: keys overwrite, empty values delete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch(IndexMap<String, String>);

impl Patch {
    pub fn new(entries: IndexMap<String, String>) -> Result<Self, ServiceError> {
        if entries.get(NAME_KEY).is_some_and(|name| name.is_empty()) {
            return Err(ServiceError::EmptyNamePatch);
        }
        Ok(Self(entries))
    }

    pub fn from_json(value: Value) -> Result<Self, ServiceError> {
        let Value::Object(object) = value else {
            return Err(ServiceError::Malformed);
        };
        Self::new(string_fields(object)?)
    }

    /// New identity requested by this patch, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.get(NAME_KEY).map(String::as_str)
    }
}

fn string_fields(object: Map<String, Value>) -> Result<IndexMap<String, String>, ServiceError> {
    object
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            _ => Err(ServiceError::Malformed),
        })
        .collect()
}

#[cfg(test)]
impl Record {
    pub(crate) fn new(name: &str) -> Self {
        Self { fields: IndexMap::from([(NAME_KEY.to_string(), name.to_string())]) }
    }

    pub(crate) fn with_field(mut self, key: &str, value: &str) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub(crate) fn keys(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
pub(crate) fn patch(entries: &[(&str, &str)]) -> Patch {
    let entries = entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    Patch::new(entries).unwrap()
}
