use std::collections::HashMap;

use crate::errors::ServiceError;

use super::model::{Patch, Record};

/// Ordered collection of uniquely named records.
///
/// Records keep insertion order; `index` maps each name to its position so
/// lookups skip the linear scan. Both are updated together by every mutation.
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordStore {
    pub fn new() -> Self { Self::default() }

    /// Build a store from a persisted snapshot, rejecting snapshots that
    /// break the identity rules (empty or repeated names).
    pub fn from_records(records: Vec<Record>) -> Result<Self, ServiceError> {
        let mut store = Self::new();
        for record in records {
            if record.name().is_empty() {
                return Err(ServiceError::storage("record with empty name"));
            }
            let name = record.name().to_string();
            if !store.add_record(record) {
                return Err(ServiceError::storage(format!("duplicate record name {name:?}")));
            }
        }
        Ok(store)
    }

    pub(crate) fn len(&self) -> usize { self.records.len() }

    pub fn records(&self) -> &[Record] { &self.records }

    /// Names of all records, in insertion order.
    pub fn list_names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name().to_string()).collect()
    }

    /// Append `record` unless its name is taken; returns whether it was inserted.
    pub fn add_record(&mut self, record: Record) -> bool {
        if self.index.contains_key(record.name()) {
            return false;
        }
        self.index.insert(record.name().to_string(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get_record(&self, name: &str) -> Option<&Record> {
        self.index.get(name).map(|&pos| &self.records[pos])
    }

    /// Merge `patch` into the record called `name`.
    ///
    /// `Ok(false)` when no such record exists. A rename onto a name held by
    /// another record is refused with `AlreadyExists` and changes nothing.
    pub fn update_record(&mut self, name: &str, patch: &Patch) -> Result<bool, ServiceError> {
        let Some(&pos) = self.index.get(name) else {
            return Ok(false);
        };
        if let Some(new_name) = patch.name() {
            if new_name != name && self.index.contains_key(new_name) {
                return Err(ServiceError::AlreadyExists);
            }
        }

        let record = &mut self.records[pos];
        record.apply(patch);
        if record.name() != name {
            let renamed = record.name().to_string();
            self.index.remove(name);
            self.index.insert(renamed, pos);
        }
        Ok(true)
    }

    /// Remove the record called `name`; returns whether one was removed.
    pub fn delete_record(&mut self, name: &str) -> bool {
        let Some(pos) = self.index.remove(name) else {
            return false;
        };
        self.records.remove(pos);
        for record in &self.records[pos..] {
            if let Some(slot) = self.index.get_mut(record.name()) {
                *slot -= 1;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::model::patch;

    fn store_with(names: &[&str]) -> RecordStore {
        let mut store = RecordStore::new();
        for n in names {
            assert!(store.add_record(Record::new(n)));
        }
        store
    }

    #[test]
    fn duplicate_add_is_refused_and_store_unchanged() {
        let mut store = store_with(&["alice"]);
        let dup = Record::new("alice").with_field("age", "99");
        assert!(!store.add_record(dup));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_record("alice").unwrap().get("age"), None);
    }

    #[test]
    fn list_names_keeps_insertion_order_across_updates() {
        let mut store = store_with(&["carol", "alice", "bob"]);
        let patch = patch(&[("phone", "555")]);
        assert!(store.update_record("alice", &patch).unwrap());
        assert_eq!(store.list_names(), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn update_merges_and_deletes_empty_keys() {
        let mut store = RecordStore::new();
        store.add_record(Record::new("alice").with_field("email", "a@x").with_field("age", "30"));

        let drop_email = patch(&[("email", "")]);
        assert!(store.update_record("alice", &drop_email).unwrap());
        let add_phone = patch(&[("phone", "555")]);
        assert!(store.update_record("alice", &add_phone).unwrap());

        let rec = store.get_record("alice").unwrap();
        assert_eq!(rec.get("email"), None);
        assert_eq!(rec.get("phone"), Some("555"));
        assert_eq!(rec.get("age"), Some("30"));
    }

    #[test]
    fn update_missing_record_is_noop() {
        let mut store = store_with(&["alice"]);
        let patch = patch(&[("phone", "555")]);
        assert_eq!(store.update_record("bob", &patch), Ok(false));
        assert!(store.get_record("bob").is_none());
    }

    #[test]
    fn rename_moves_index_and_keeps_position() {
        let mut store = store_with(&["alice", "bob"]);
        let patch = patch(&[("name", "alicia")]);
        assert!(store.update_record("alice", &patch).unwrap());
        assert!(store.get_record("alice").is_none());
        assert_eq!(store.get_record("alicia").unwrap().name(), "alicia");
        assert_eq!(store.list_names(), vec!["alicia", "bob"]);
        assert!(store.add_record(Record::new("alice")));
    }

    #[test]
    fn rename_onto_existing_name_is_refused() {
        let mut store = store_with(&["alice", "bob"]);
        let patch = patch(&[("name", "bob"), ("age", "40")]);
        assert_eq!(store.update_record("alice", &patch), Err(ServiceError::AlreadyExists));
        assert_eq!(store.get_record("alice").unwrap().get("age"), None);
        assert_eq!(store.list_names(), vec!["alice", "bob"]);
    }

    #[test]
    fn rename_to_own_name_is_allowed() {
        let mut store = store_with(&["alice"]);
        let patch = patch(&[("name", "alice"), ("age", "31")]);
        assert!(store.update_record("alice", &patch).unwrap());
        assert_eq!(store.get_record("alice").unwrap().get("age"), Some("31"));
    }

    #[test]
    fn delete_reindexes_following_records() {
        let mut store = store_with(&["a", "b", "c", "d"]);
        assert!(store.delete_record("b"));
        assert_eq!(store.list_names(), vec!["a", "c", "d"]);
        assert_eq!(store.get_record("d").unwrap().name(), "d");
        assert_eq!(store.get_record("c").unwrap().name(), "c");
        assert!(store.delete_record("d"));
        assert_eq!(store.list_names(), vec!["a", "c"]);
    }

    #[test]
    fn delete_miss_leaves_length() {
        let mut store = store_with(&["alice"]);
        assert!(!store.delete_record("bob"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn from_records_rejects_duplicates_and_empty_names() {
        let dup = vec![Record::new("a"), Record::new("a")];
        assert!(matches!(RecordStore::from_records(dup), Err(ServiceError::Storage(_))));
        let empty = vec![Record::new("")];
        assert!(matches!(RecordStore::from_records(empty), Err(ServiceError::Storage(_))));
        let ok = RecordStore::from_records(vec![Record::new("x"), Record::new("y")]).unwrap();
        assert_eq!(ok.list_names(), vec!["x", "y"]);
    }
}
