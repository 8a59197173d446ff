//! Custom preset store
//!
//! Holds the user's named volume mixes in storage order and writes the
//! whole set through to storage on every save or delete.

use super::storage::PresetStorage;
use crate::error::PersistenceError;
use ambimix_common::time::now_millis;
use ambimix_common::Preset;
use indexmap::IndexMap;
use tracing::{error, info, warn};

/// Prefix of generated preset ids
const ID_PREFIX: &str = "custom_";

pub struct PresetStore {
    storage: Box<dyn PresetStorage>,
    presets: IndexMap<String, Preset>,
    /// Millisecond stamp of the last generated id
    last_stamp: i64,
}

impl PresetStore {
    /// Load presets from `storage`
    ///
    /// Unreadable or corrupt storage degrades to an empty preset set.
    pub fn open(storage: Box<dyn PresetStorage>) -> Self {
        let presets = match storage.read_all() {
            Ok(Some(bytes)) => decode(&bytes).unwrap_or_else(|e| {
                warn!("Ignoring stored presets: {}", e);
                IndexMap::new()
            }),
            Ok(None) => IndexMap::new(),
            Err(e) => {
                warn!("Preset storage unavailable, starting empty: {}", e);
                IndexMap::new()
            }
        };

        info!("Loaded {} custom presets", presets.len());
        Self {
            storage,
            presets,
            last_stamp: 0,
        }
    }

    /// Presets in storage order
    pub fn list(&self) -> impl Iterator<Item = (&str, &Preset)> {
        self.presets.iter().map(|(id, preset)| (id.as_str(), preset))
    }

    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.get(id)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Case-insensitive name lookup; an empty name never exists
    pub fn name_exists(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let wanted = name.to_lowercase();
        self.presets
            .values()
            .any(|preset| preset.name.to_lowercase() == wanted)
    }

    /// Store a new preset and return its id
    ///
    /// Entries with volume 0 are dropped. The caller checks `name_exists`
    /// first. If the write fails nothing changes.
    pub fn save<'a, I>(&mut self, name: &str, volumes: I) -> Result<String, PersistenceError>
    where
        I: IntoIterator<Item = (&'a str, u8)>,
    {
        let id = self.next_id();
        let preset = Preset::sparse(name, volumes);
        self.presets.insert(id.clone(), preset);

        if let Err(e) = self.persist() {
            self.presets.shift_remove(&id);
            return Err(e);
        }

        info!("Saved preset '{}' as {}", name, id);
        Ok(id)
    }

    /// Remove a preset; `Ok(false)` if `id` is unknown
    ///
    /// If the write fails the preset is restored in place.
    pub fn delete(&mut self, id: &str) -> Result<bool, PersistenceError> {
        let Some((index, key, preset)) = self.presets.shift_remove_full(id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist() {
            self.presets.shift_insert(index, key, preset);
            return Err(e);
        }

        info!("Deleted preset {}", id);
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec(&self.presets)?;
        self.storage.write_all(&bytes).map_err(|e| {
            error!("Failed to persist presets: {}", e);
            e
        })
    }

    /// Time-based id, strictly increasing within the session
    fn next_id(&mut self) -> String {
        let mut stamp = now_millis().max(self.last_stamp + 1);
        while self.presets.contains_key(&format!("{}{}", ID_PREFIX, stamp)) {
            stamp += 1;
        }
        self.last_stamp = stamp;
        format!("{}{}", ID_PREFIX, stamp)
    }
}

fn decode(bytes: &[u8]) -> Result<IndexMap<String, Preset>, PersistenceError> {
    let mut presets: IndexMap<String, Preset> =
        serde_json::from_slice(bytes).map_err(|e| PersistenceError::Corrupt(e.to_string()))?;

    for preset in presets.values_mut() {
        preset.sounds.retain(|_, volume| *volume > 0);
    }
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::storage::MemoryStorage;

    fn store_with(storage: &MemoryStorage) -> PresetStore {
        PresetStore::open(Box::new(storage.clone()))
    }

    #[test]
    fn test_save_drops_zero_volumes_and_persists() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);

        let id = store
            .save("Evening", [("rain", 60), ("wind", 0), ("cafe", 20)])
            .unwrap();

        assert!(id.starts_with("custom_"));
        let preset = store.get(&id).unwrap();
        assert_eq!(preset.name, "Evening");
        assert_eq!(preset.sounds.len(), 2);
        assert!(!preset.sounds.contains_key("wind"));

        let stored: serde_json::Value =
            serde_json::from_slice(&storage.bytes().unwrap()).unwrap();
        assert_eq!(stored[&id]["name"], "Evening");
        assert_eq!(stored[&id]["sounds"]["rain"], 60);
        assert!(stored[&id]["sounds"].get("wind").is_none());
    }

    #[test]
    fn test_name_exists_is_case_insensitive() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        store.save("Rain", [("rain", 50)]).unwrap();

        assert!(store.name_exists("rain"));
        assert!(store.name_exists("RAIN"));
        assert!(!store.name_exists("Rainy"));
        assert!(!store.name_exists(""));
    }

    #[test]
    fn test_ids_are_unique_within_a_session() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);

        let ids: Vec<String> = (0..5)
            .map(|i| store.save(&format!("Mix {}", i), [("rain", 10)]).unwrap())
            .collect();

        for pair in ids.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_list_preserves_stored_order() {
        let storage = MemoryStorage::with_bytes(
            r#"{
                "custom_3": {"name": "Third", "sounds": {"rain": 10}},
                "custom_1": {"name": "First", "sounds": {"wind": 20}},
                "custom_2": {"name": "Second", "sounds": {"cafe": 30}}
            }"#,
        );
        let store = store_with(&storage);

        let names: Vec<&str> = store.list().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, vec!["Third", "First", "Second"]);
    }

    #[test]
    fn test_delete() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        let id = store.save("Gone", [("rain", 50)]).unwrap();

        assert!(store.delete(&id).unwrap());
        assert!(store.get(&id).is_none());
        assert!(!store.delete(&id).unwrap());
        assert!(!store.delete("custom_unknown").unwrap());

        let reloaded = store_with(&storage);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_corrupt_storage_degrades_to_empty() {
        let storage = MemoryStorage::with_bytes("{not json");
        let store = store_with(&storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unreadable_storage_degrades_to_empty() {
        let storage = MemoryStorage::with_bytes(r#"{"custom_1":{"name":"A","sounds":{}}}"#);
        storage.set_fail_reads(true);
        let store = store_with(&storage);
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_save_leaves_state_unchanged() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        store.save("Kept", [("rain", 40)]).unwrap();
        let before = storage.bytes();

        storage.set_fail_writes(true);
        assert!(store.save("Lost", [("wind", 40)]).is_err());

        assert_eq!(store.len(), 1);
        assert!(!store.name_exists("Lost"));
        assert_eq!(storage.bytes(), before);
    }

    #[test]
    fn test_failed_delete_restores_position() {
        let storage = MemoryStorage::new();
        let mut store = store_with(&storage);
        let a = store.save("A", [("rain", 10)]).unwrap();
        let b = store.save("B", [("rain", 20)]).unwrap();
        let c = store.save("C", [("rain", 30)]).unwrap();

        storage.set_fail_writes(true);
        assert!(store.delete(&b).is_err());

        let ids: Vec<&str> = store.list().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);
    }
}
