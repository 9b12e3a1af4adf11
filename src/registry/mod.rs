//! Catalogue registry: cached, injected lookup of zoning systems,
//! segmentation levels, and zone translations by name.

mod csv;
mod memory;

use std::sync::{Arc, Mutex};

use ahash::AHashMap;

use crate::error::{CatalogueKind, DemandError, Result};
use crate::segments::SegmentationLevel;
use crate::zoning::{TranslationTable, ZoningSystem};

pub use csv::CsvLookupSource;
pub use memory::InMemorySource;

/// Where catalogue definitions come from.
///
/// `Ok(None)` means the name is unknown to this source; loader errors
/// (unreadable files, malformed tables) propagate as-is.
pub trait LookupSource: Send + Sync {
    fn load_zoning(&self, name: &str) -> Result<Option<ZoningSystem>>;

    fn load_segmentation(&self, name: &str) -> Result<Option<SegmentationLevel>>;

    /// Translations are looked up against already-resolved catalogues so the
    /// source can validate zone ids while building the table.
    fn load_translation(
        &self,
        from: &ZoningSystem,
        to: &ZoningSystem,
    ) -> Result<Option<TranslationTable>>;
}

/// Process-wide cache of catalogues, injected into callers.
///
/// Each cache's mutex is held across the source load, so first-use
/// population is single-flight: concurrent callers for the same name block
/// on one construction and share the resulting `Arc`.
pub struct Registry {
    source: Box<dyn LookupSource>,
    zonings: Mutex<AHashMap<String, Arc<ZoningSystem>>>,
    segmentations: Mutex<AHashMap<String, Arc<SegmentationLevel>>>,
    translations: Mutex<AHashMap<(String, String), Arc<TranslationTable>>>,
}

impl Registry {
    pub fn new(source: impl LookupSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            zonings: Mutex::new(AHashMap::new()),
            segmentations: Mutex::new(AHashMap::new()),
            translations: Mutex::new(AHashMap::new()),
        }
    }

    /// The cached zoning system for `name`, constructing it on first call.
    pub fn zoning(&self, name: &str) -> Result<Arc<ZoningSystem>> {
        let mut cache = self.zonings.lock().unwrap();
        if let Some(zoning) = cache.get(name) {
            return Ok(zoning.clone());
        }
        let zoning = self
            .source
            .load_zoning(name)?
            .ok_or_else(|| DemandError::NotFound {
                kind: CatalogueKind::Zoning,
                name: name.to_string(),
            })?;
        tracing::info!(name, zones = zoning.len(), "loaded zoning system");
        let zoning = Arc::new(zoning);
        cache.insert(name.to_string(), zoning.clone());
        Ok(zoning)
    }

    /// The cached segmentation level for `name`, constructing it on first
    /// call.
    pub fn segmentation(&self, name: &str) -> Result<Arc<SegmentationLevel>> {
        let mut cache = self.segmentations.lock().unwrap();
        if let Some(level) = cache.get(name) {
            return Ok(level.clone());
        }
        let level = self
            .source
            .load_segmentation(name)?
            .ok_or_else(|| DemandError::NotFound {
                kind: CatalogueKind::Segmentation,
                name: name.to_string(),
            })?;
        tracing::info!(name, segments = level.len(), "loaded segmentation level");
        let level = Arc::new(level);
        cache.insert(name.to_string(), level.clone());
        Ok(level)
    }

    /// The cached translation table for the ordered pair `(from, to)`.
    ///
    /// Availability is directional and partial: a registered `(a, b)` pair
    /// says nothing about `(b, a)`.
    pub fn translation(&self, from: &str, to: &str) -> Result<Arc<TranslationTable>> {
        // Resolve catalogues before taking the translations lock.
        let from_zoning = self.zoning(from)?;
        let to_zoning = self.zoning(to)?;

        let mut cache = self.translations.lock().unwrap();
        let key = (from.to_string(), to.to_string());
        if let Some(table) = cache.get(&key) {
            return Ok(table.clone());
        }
        let table = self
            .source
            .load_translation(&from_zoning, &to_zoning)?
            .ok_or_else(|| DemandError::TranslationNotFound {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        tracing::info!(from, to, entries = table.entry_count(), "loaded zone translation");
        let table = Arc::new(table);
        cache.insert(key, table.clone());
        Ok(table)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("zonings", &self.zonings.lock().unwrap().len())
            .field("segmentations", &self.segmentations.lock().unwrap().len())
            .field("translations", &self.translations.lock().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::types::Segment;

    use super::*;

    fn make_registry() -> Registry {
        let mut source = InMemorySource::new();
        source.add_zoning(ZoningSystem::new("lad", ["E1", "E2"]).unwrap());
        source.add_zoning(ZoningSystem::new("msoa", ["E1a", "E1b", "E2a"]).unwrap());
        source.add_segmentation(
            SegmentationLevel::new("p", &["p"], vec![Segment::from([1])]).unwrap(),
        );
        source.add_translation("lad", "msoa", vec![
            ("E1".into(), "E1a".into(), 0.3),
            ("E1".into(), "E1b".into(), 0.7),
            ("E2".into(), "E2a".into(), 1.0),
        ]);
        Registry::new(source)
    }

    #[test]
    fn repeated_gets_share_one_instance() {
        let registry = make_registry();
        let a = registry.zoning("lad").unwrap();
        let b = registry.zoning("lad").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let s1 = registry.segmentation("p").unwrap();
        let s2 = registry.segmentation("p").unwrap();
        assert!(Arc::ptr_eq(&s1, &s2));
    }

    #[test]
    fn unknown_names_are_not_found() {
        let registry = make_registry();
        assert!(matches!(
            registry.zoning("bogus").unwrap_err(),
            DemandError::NotFound { kind: CatalogueKind::Zoning, .. }
        ));
        assert!(matches!(
            registry.segmentation("bogus").unwrap_err(),
            DemandError::NotFound { kind: CatalogueKind::Segmentation, .. }
        ));
    }

    #[test]
    fn translation_availability_is_directional() {
        let registry = make_registry();
        assert!(registry.translation("lad", "msoa").is_ok());
        assert!(matches!(
            registry.translation("msoa", "lad").unwrap_err(),
            DemandError::TranslationNotFound { .. }
        ));
    }

    #[test]
    fn translations_are_cached_by_pair() {
        let registry = make_registry();
        let a = registry.translation("lad", "msoa").unwrap();
        let b = registry.translation("lad", "msoa").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn concurrent_first_use_yields_one_instance() {
        let registry = std::sync::Arc::new(make_registry());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.zoning("msoa").unwrap())
            })
            .collect();

        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in instances.windows(2) {
            assert!(Arc::ptr_eq(&pair[0], &pair[1]));
        }
    }
}
