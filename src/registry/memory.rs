use ahash::AHashMap;

use crate::error::Result;
use crate::segments::SegmentationLevel;
use crate::zoning::{TranslationTable, ZoningSystem};

use super::LookupSource;

/// An in-memory lookup source for tests and embedders that assemble their
/// catalogues programmatically.
#[derive(Debug, Default)]
pub struct InMemorySource {
    zonings: AHashMap<String, ZoningSystem>,
    segmentations: AHashMap<String, SegmentationLevel>,
    translations: AHashMap<(String, String), Vec<(String, String, f64)>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_zoning(&mut self, zoning: ZoningSystem) {
        self.zonings.insert(zoning.name().to_string(), zoning);
    }

    pub fn add_segmentation(&mut self, level: SegmentationLevel) {
        self.segmentations.insert(level.name().to_string(), level);
    }

    /// Register raw translation rows for an ordered zoning pair. The table
    /// itself is built (and its zone ids validated) on first lookup.
    pub fn add_translation(
        &mut self,
        from: &str,
        to: &str,
        rows: Vec<(String, String, f64)>,
    ) {
        self.translations.insert((from.to_string(), to.to_string()), rows);
    }
}

impl LookupSource for InMemorySource {
    fn load_zoning(&self, name: &str) -> Result<Option<ZoningSystem>> {
        Ok(self.zonings.get(name).cloned())
    }

    fn load_segmentation(&self, name: &str) -> Result<Option<SegmentationLevel>> {
        Ok(self.segmentations.get(name).cloned())
    }

    fn load_translation(
        &self,
        from: &ZoningSystem,
        to: &ZoningSystem,
    ) -> Result<Option<TranslationTable>> {
        let key = (from.name().to_string(), to.name().to_string());
        match self.translations.get(&key) {
            Some(rows) => Ok(Some(TranslationTable::from_rows(from, to, rows)?)),
            None => Ok(None),
        }
    }
}
