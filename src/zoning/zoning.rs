use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{DemandError, Result};

/// An immutable catalogue of zone identifiers for one geography.
///
/// Zone order is stable and defines the positional index used by demand
/// vectors; identifiers keep their original text (with leading zeros) but
/// avoid repeated owned Strings.
#[derive(Debug, Clone)]
pub struct ZoningSystem {
    name: Arc<str>,
    zone_ids: Vec<Arc<str>>,
    index: AHashMap<Arc<str>, u32>, // Map between zone ids and contiguous indices.
}

impl ZoningSystem {
    /// Build a zoning system from an ordered sequence of unique zone ids.
    pub fn new<I, S>(name: &str, zone_ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let zone_ids: Vec<Arc<str>> = zone_ids
            .into_iter()
            .map(|id| Arc::from(id.as_ref()))
            .collect();

        let mut index = AHashMap::with_capacity(zone_ids.len());
        for (i, id) in zone_ids.iter().enumerate() {
            if index.insert(id.clone(), i as u32).is_some() {
                return Err(DemandError::Format(format!(
                    "duplicate zone id '{id}' in zoning system '{name}'"
                )));
            }
        }

        Ok(Self { name: Arc::from(name), zone_ids, index })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered zone identifiers; position equals the demand vector row index.
    #[inline]
    pub fn zone_ids(&self) -> &[Arc<str>] {
        &self.zone_ids
    }

    /// Number of zones in the catalogue.
    #[inline]
    pub fn len(&self) -> usize {
        self.zone_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zone_ids.is_empty()
    }

    /// Positional index of a zone id, if it belongs to this catalogue.
    #[inline]
    pub fn index_of(&self, zone_id: &str) -> Option<u32> {
        self.index.get(zone_id).copied()
    }

    #[inline]
    pub fn contains(&self, zone_id: &str) -> bool {
        self.index.contains_key(zone_id)
    }
}

/// Name equality governs whether two demand vectors can be combined without
/// translation.
impl PartialEq for ZoningSystem {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ZoningSystem {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_order_defines_positional_index() {
        let zoning = ZoningSystem::new("lad", ["E1", "E2", "E3"]).unwrap();

        assert_eq!(zoning.len(), 3);
        assert_eq!(zoning.index_of("E1"), Some(0));
        assert_eq!(zoning.index_of("E3"), Some(2));
        assert_eq!(zoning.index_of("E4"), None);
        assert_eq!(zoning.zone_ids()[1].as_ref(), "E2");
    }

    #[test]
    fn equality_is_by_name_only() {
        let a = ZoningSystem::new("lad", ["E1"]).unwrap();
        let b = ZoningSystem::new("lad", ["E1", "E2"]).unwrap();
        let c = ZoningSystem::new("msoa", ["E1"]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn duplicate_zone_ids_are_rejected() {
        let err = ZoningSystem::new("lad", ["E1", "E2", "E1"]).unwrap_err();
        assert!(matches!(err, DemandError::Format(_)));
    }
}
