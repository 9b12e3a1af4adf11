use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{DemandError, Result};
use crate::types::Segment;

/// An immutable catalogue of valid segment value-tuples for one segmentation
/// scheme, e.g. purpose × mode × time period.
///
/// Not every cartesian combination of dimension values is valid; the
/// enumerated set is authoritative, and its order defines the positional
/// index used by demand vectors.
#[derive(Debug, Clone)]
pub struct SegmentationLevel {
    name: Arc<str>,
    columns: Vec<Arc<str>>, // Ordered defining dimensions, e.g. ["p", "m"].
    segments: Vec<Segment>,
    index: AHashMap<Segment, u32>,
}

impl SegmentationLevel {
    /// Build a segmentation level from its defining columns and the
    /// enumerated valid set.
    pub fn new<C: AsRef<str>>(name: &str, columns: &[C], segments: Vec<Segment>) -> Result<Self> {
        let columns: Vec<Arc<str>> = columns.iter().map(|c| Arc::from(c.as_ref())).collect();

        let mut index = AHashMap::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            if segment.len() != columns.len() {
                return Err(DemandError::Format(format!(
                    "segment '{segment}' has {} value(s), segmentation '{name}' has {} column(s)",
                    segment.len(),
                    columns.len()
                )));
            }
            if index.insert(segment.clone(), i as u32).is_some() {
                return Err(DemandError::Format(format!(
                    "duplicate segment '{segment}' in segmentation '{name}'"
                )));
            }
        }

        Ok(Self { name: Arc::from(name), columns, segments, index })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered defining column names.
    #[inline]
    pub fn columns(&self) -> &[Arc<str>] {
        &self.columns
    }

    /// Ordered valid segments; position equals the demand vector column index.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of valid segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Positional index of a segment, if it belongs to the valid set.
    #[inline]
    pub fn index_of(&self, segment: &Segment) -> Option<u32> {
        self.index.get(segment).copied()
    }

    #[inline]
    pub fn contains(&self, segment: &Segment) -> bool {
        self.index.contains_key(segment)
    }

    /// For each of `other`'s columns, its position among this level's
    /// columns. `None` if any column of `other` is missing here.
    fn column_positions(&self, other: &SegmentationLevel) -> Option<Vec<usize>> {
        other
            .columns
            .iter()
            .map(|col| self.columns.iter().position(|c| c == col))
            .collect()
    }

    /// Map a full segment at this level onto `other`'s defining columns.
    ///
    /// Returns `None` when `other` has a column this level lacks. The
    /// projected tuple is not checked against `other`'s valid set.
    pub fn project(&self, segment: &Segment, other: &SegmentationLevel) -> Option<Segment> {
        let positions = self.column_positions(other)?;
        Some(positions.iter().map(|&p| segment.values()[p]).collect())
    }

    /// For each segment of this level, the index of its projection in
    /// `other`. `None` when columns are missing or any projection falls
    /// outside `other`'s valid set (aggregation would drop demand).
    pub(crate) fn projection_map(&self, other: &SegmentationLevel) -> Option<Vec<u32>> {
        let positions = self.column_positions(other)?;
        self.segments
            .iter()
            .map(|segment| {
                let projected: Segment =
                    positions.iter().map(|&p| segment.values()[p]).collect();
                other.index_of(&projected)
            })
            .collect()
    }

    /// True iff `other`'s columns are a (non-strict) subset of this level's
    /// and every segment here projects onto a member of `other`'s valid set.
    pub fn can_aggregate_to(&self, other: &SegmentationLevel) -> bool {
        self.projection_map(other).is_some()
    }
}

/// Name equality, matching [`crate::ZoningSystem`]'s convention.
impl PartialEq for SegmentationLevel {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SegmentationLevel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn p_m() -> SegmentationLevel {
        SegmentationLevel::new(
            "p_m",
            &["p", "m"],
            vec![
                Segment::from([1, 1]),
                Segment::from([1, 2]),
                Segment::from([2, 1]),
            ],
        )
        .unwrap()
    }

    fn p_only() -> SegmentationLevel {
        SegmentationLevel::new("p", &["p"], vec![Segment::from([1]), Segment::from([2])])
            .unwrap()
    }

    #[test]
    fn segment_order_defines_positional_index() {
        let seg = p_m();
        assert_eq!(seg.len(), 3);
        assert_eq!(seg.index_of(&Segment::from([1, 2])), Some(1));
        assert_eq!(seg.index_of(&Segment::from([2, 2])), None);
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let err =
            SegmentationLevel::new("p_m", &["p", "m"], vec![Segment::from([1])]).unwrap_err();
        assert!(matches!(err, DemandError::Format(_)));
    }

    #[test]
    fn duplicate_segments_are_rejected() {
        let err = SegmentationLevel::new(
            "p",
            &["p"],
            vec![Segment::from([1]), Segment::from([1])],
        )
        .unwrap_err();
        assert!(matches!(err, DemandError::Format(_)));
    }

    #[test]
    fn projection_reorders_onto_other_columns() {
        let fine = SegmentationLevel::new(
            "p_m_tp",
            &["p", "m", "tp"],
            vec![Segment::from([1, 2, 3])],
        )
        .unwrap();
        let coarse = SegmentationLevel::new(
            "tp_p",
            &["tp", "p"],
            vec![Segment::from([3, 1])],
        )
        .unwrap();

        let projected = fine.project(&Segment::from([1, 2, 3]), &coarse).unwrap();
        assert_eq!(projected, Segment::from([3, 1]));
        assert!(fine.can_aggregate_to(&coarse));
    }

    #[test]
    fn aggregation_requires_column_subset() {
        let fine = p_m();
        let coarse = p_only();

        assert!(fine.can_aggregate_to(&coarse));
        assert!(!coarse.can_aggregate_to(&fine)); // 'm' column missing

        // Identity direction is always allowed.
        assert!(fine.can_aggregate_to(&fine));
    }

    #[test]
    fn aggregation_requires_projection_totality() {
        let fine = p_m();
        // Valid set lacks p=2, so segment (2,1) has nowhere to go.
        let partial =
            SegmentationLevel::new("p_partial", &["p"], vec![Segment::from([1])]).unwrap();

        assert!(!fine.can_aggregate_to(&partial));
    }

    #[test]
    fn projection_map_covers_every_source_segment() {
        let fine = p_m();
        let coarse = p_only();

        let map = fine.projection_map(&coarse).unwrap();
        assert_eq!(map, vec![0, 0, 1]); // (1,1)->p1, (1,2)->p1, (2,1)->p2
    }
}
