//! Persistence seam for tranche structures.
//!
//! The hosting application owns real storage; the engine only needs the
//! operations below. `InMemoryStructureStore` backs tests, the CLI and any
//! embedding that keeps structures in process.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::WaterfallError;
use crate::structuring::tranche::{TrancheDefinition, TrancheStructure};
use crate::types::StructureId;
use crate::WaterfallResult;

/// Storage operations for tranche structures.
pub trait StructureStore {
    /// Insert or overwrite a structure, returning its id.
    fn save(&mut self, structure: &TrancheStructure) -> WaterfallResult<StructureId>;

    fn get(&self, id: &StructureId) -> Option<TrancheStructure>;

    /// Structures attached to one dataset, ordered by id.
    fn list_for_dataset(&self, dataset_name: &str) -> Vec<TrancheStructure>;

    /// Replace the full tranche list of a stored structure. The new list must
    /// pass the same rules as `save`.
    fn replace_tranches(
        &mut self,
        id: &StructureId,
        tranches: Vec<TrancheDefinition>,
    ) -> WaterfallResult<()>;

    fn delete(&mut self, id: &StructureId) -> WaterfallResult<TrancheStructure>;

    /// Delete every structure attached to a dataset. Returns how many went.
    fn delete_dataset(&mut self, dataset_name: &str) -> usize;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStructureStore {
    structures: BTreeMap<StructureId, TrancheStructure>,
}

impl InMemoryStructureStore {
    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

impl StructureStore for InMemoryStructureStore {
    fn save(&mut self, structure: &TrancheStructure) -> WaterfallResult<StructureId> {
        let id = structure.id.clone();
        self.structures.insert(id.clone(), structure.clone());
        Ok(id)
    }

    fn get(&self, id: &StructureId) -> Option<TrancheStructure> {
        self.structures.get(id).cloned()
    }

    fn list_for_dataset(&self, dataset_name: &str) -> Vec<TrancheStructure> {
        self.structures
            .values()
            .filter(|s| s.dataset_name == dataset_name)
            .cloned()
            .collect()
    }

    fn replace_tranches(
        &mut self,
        id: &StructureId,
        tranches: Vec<TrancheDefinition>,
    ) -> WaterfallResult<()> {
        let stored = self
            .structures
            .get(id)
            .ok_or_else(|| WaterfallError::NotFound(format!("structure {id}")))?;
        let mut candidate = stored.clone();
        candidate.replace_tranches(tranches);
        candidate.validate()?;
        self.structures.insert(id.clone(), candidate);
        debug!(structure = %id, "tranche list replaced");
        Ok(())
    }

    fn delete(&mut self, id: &StructureId) -> WaterfallResult<TrancheStructure> {
        self.structures
            .remove(id)
            .ok_or_else(|| WaterfallError::NotFound(format!("structure {id}")))
    }

    fn delete_dataset(&mut self, dataset_name: &str) -> usize {
        let before = self.structures.len();
        self.structures.retain(|_, s| s.dataset_name != dataset_name);
        let removed = before - self.structures.len();
        debug!(dataset = dataset_name, removed, "dataset structures deleted");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid(name: &str, dataset: &str) -> TrancheStructure {
        TrancheStructure::with_tranches(
            name,
            dataset,
            vec![
                TrancheDefinition::new("Senior", dec!(70), dec!(150)),
                TrancheDefinition::new("Mezz", dec!(20), dec!(250)),
                TrancheDefinition::new("Sub", dec!(10), dec!(450)),
            ],
        )
    }

    #[test]
    fn test_save_and_get() {
        let mut store = InMemoryStructureStore::default();
        let s = valid("A", "ds1");
        let id = store.save(&s).unwrap();
        assert_eq!(store.get(&id), Some(s));
    }

    #[test]
    fn test_list_for_dataset() {
        let mut store = InMemoryStructureStore::default();
        store.save(&valid("A", "ds1")).unwrap();
        store.save(&valid("B", "ds1")).unwrap();
        store.save(&valid("C", "ds2")).unwrap();
        assert_eq!(store.list_for_dataset("ds1").len(), 2);
        assert_eq!(store.list_for_dataset("ds2").len(), 1);
        assert!(store.list_for_dataset("ds3").is_empty());
    }

    #[test]
    fn test_replace_tranches_validates() {
        let mut store = InMemoryStructureStore::default();
        let id = store.save(&valid("A", "ds1")).unwrap();

        let bad = vec![
            TrancheDefinition::new("X", dec!(50), dec!(1)),
            TrancheDefinition::new("Y", dec!(50), dec!(1)),
        ];
        assert!(store.replace_tranches(&id, bad).is_err());
        assert_eq!(store.get(&id).unwrap().tranches.len(), 3);

        let good = vec![
            TrancheDefinition::new("X", dec!(40), dec!(1)),
            TrancheDefinition::new("Y", dec!(35), dec!(1)),
            TrancheDefinition::new("Z", dec!(15), dec!(1)),
            TrancheDefinition::new("W", dec!(10), dec!(1)),
        ];
        store.replace_tranches(&id, good).unwrap();
        assert_eq!(store.get(&id).unwrap().tranches.len(), 4);
    }

    #[test]
    fn test_replace_unknown_structure() {
        let mut store = InMemoryStructureStore::default();
        let res = store.replace_tranches(&StructureId::from("missing"), vec![]);
        assert!(matches!(res, Err(WaterfallError::NotFound(_))));
    }

    #[test]
    fn test_delete_single_structure() {
        let mut store = InMemoryStructureStore::default();
        let id = store.save(&valid("A", "ds1")).unwrap();
        store.save(&valid("B", "ds1")).unwrap();
        store.delete(&id).unwrap();
        assert_eq!(store.list_for_dataset("ds1").len(), 1);
        assert!(store.delete(&id).is_err());
    }

    #[test]
    fn test_delete_dataset_cascades() {
        let mut store = InMemoryStructureStore::default();
        store.save(&valid("A", "ds1")).unwrap();
        store.save(&valid("B", "ds1")).unwrap();
        store.save(&valid("C", "ds2")).unwrap();
        assert_eq!(store.delete_dataset("ds1"), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.delete_dataset("ds1"), 0);
    }
}
