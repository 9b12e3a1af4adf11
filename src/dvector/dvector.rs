use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};

use crate::error::{DemandError, Result};
use crate::registry::Registry;
use crate::segments::SegmentationLevel;
use crate::zoning::{TranslationTable, TranslationWeighting, ZoningSystem};

use super::ArithmeticOp;

/// A demand vector: values indexed jointly by a zoning system and a
/// segmentation level.
///
/// The value store is a dense `zones × segments` array whose axes always
/// exactly match the referenced catalogues' orders. The catalogues are
/// shared read-only; the store is owned exclusively.
#[derive(Debug, Clone)]
pub struct DVector {
    zoning: Arc<ZoningSystem>,
    segmentation: Arc<SegmentationLevel>,
    data: Array2<f64>, // (zone_count, segment_count)
}

impl DVector {
    /// An all-zero vector over the given index space.
    pub fn zeros(zoning: Arc<ZoningSystem>, segmentation: Arc<SegmentationLevel>) -> Self {
        let data = Array2::zeros((zoning.len(), segmentation.len()));
        Self { zoning, segmentation, data }
    }

    /// Wrap an existing dense array, checking its shape against the
    /// catalogues.
    pub fn from_dense(
        zoning: Arc<ZoningSystem>,
        segmentation: Arc<SegmentationLevel>,
        data: Array2<f64>,
    ) -> Result<Self> {
        let expected = (zoning.len(), segmentation.len());
        if data.dim() != expected {
            return Err(DemandError::Format(format!(
                "value store shape {:?} does not match ({} zones, {} segments)",
                data.dim(),
                expected.0,
                expected.1
            )));
        }
        Ok(Self { zoning, segmentation, data })
    }

    #[inline]
    pub fn zoning(&self) -> &Arc<ZoningSystem> {
        &self.zoning
    }

    #[inline]
    pub fn segmentation(&self) -> &Arc<SegmentationLevel> {
        &self.segmentation
    }

    /// The dense value store, rows in zone order, columns in segment order.
    #[inline]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Value of one (zone, segment) cell by positional index.
    #[inline]
    pub fn value(&self, zone: usize, segment: usize) -> f64 {
        self.data[[zone, segment]]
    }

    /// Total demand across all zones and segments.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// Per-zone totals across segments.
    pub fn zone_totals(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(1))
    }

    /// Per-segment totals across zones.
    pub fn segment_totals(&self) -> Array1<f64> {
        self.data.sum_axis(Axis(0))
    }

    /// Cellwise absolute value.
    pub fn abs(&self) -> DVector {
        DVector {
            zoning: self.zoning.clone(),
            segmentation: self.segmentation.clone(),
            data: self.data.mapv(f64::abs),
        }
    }

    /// Multiply every cell by a scalar.
    pub fn scale(&self, factor: f64) -> DVector {
        DVector {
            zoning: self.zoning.clone(),
            segmentation: self.segmentation.clone(),
            data: &self.data * factor,
        }
    }

    /// Divide every cell by a scalar, under the same zero-divisor policy as
    /// vector division: a zero divisor yields zero everywhere.
    pub fn scalar_divide(&self, divisor: f64) -> DVector {
        DVector {
            zoning: self.zoning.clone(),
            segmentation: self.segmentation.clone(),
            data: self.data.mapv(|v| ArithmeticOp::Div.apply(v, divisor)),
        }
    }

    /// Collapse this vector's segmentation to a coarser one, summing all
    /// segments that share a projection. The total is conserved.
    pub fn aggregate(&self, target: &Arc<SegmentationLevel>) -> Result<DVector> {
        let map = self
            .segmentation
            .projection_map(target)
            .ok_or_else(|| DemandError::IncompatibleSegmentation {
                left: self.segmentation.name().to_string(),
                right: target.name().to_string(),
            })?;

        let mut data = Array2::zeros((self.zoning.len(), target.len()));
        for (s, &t) in map.iter().enumerate() {
            data.column_mut(t as usize).scaled_add(1.0, &self.data.column(s));
        }

        tracing::debug!(
            from = self.segmentation.name(),
            to = target.name(),
            "aggregated demand vector"
        );

        Ok(DVector { zoning: self.zoning.clone(), segmentation: target.clone(), data })
    }

    /// Redistribute this vector onto a different zoning system, resolving
    /// the translation table through the registry.
    pub fn translate_zoning(
        &self,
        registry: &Registry,
        target: &str,
        weighting: TranslationWeighting,
    ) -> Result<DVector> {
        let target = registry.zoning(target)?;
        let table = registry.translation(self.zoning.name(), target.name())?;
        self.translate_with(&target, &table, weighting)
    }

    /// Redistribute this vector using an already-resolved translation table.
    pub fn translate_with(
        &self,
        target: &Arc<ZoningSystem>,
        table: &TranslationTable,
        weighting: TranslationWeighting,
    ) -> Result<DVector> {
        if table.from_name() != self.zoning.name() || table.to_name() != target.name() {
            return Err(DemandError::Format(format!(
                "translation table maps '{}' -> '{}', vector is '{}' -> '{}'",
                table.from_name(),
                table.to_name(),
                self.zoning.name(),
                target.name()
            )));
        }
        if table.source_count() != self.zoning.len() || table.target_count() != target.len() {
            return Err(DemandError::Format(format!(
                "translation table shape ({} -> {}) does not match catalogues ({} -> {})",
                table.source_count(),
                table.target_count(),
                self.zoning.len(),
                target.len()
            )));
        }

        let mut data = Array2::zeros((target.len(), self.segmentation.len()));
        for s in 0..self.zoning.len() {
            for (t, w) in table.row(s) {
                let factor = match weighting {
                    TranslationWeighting::Weighted => w,
                    TranslationWeighting::NoWeight => 1.0,
                };
                data.row_mut(t).scaled_add(factor, &self.data.row(s));
            }
        }

        tracing::debug!(
            from = self.zoning.name(),
            to = target.name(),
            entries = table.entry_count(),
            ?weighting,
            "translated demand vector"
        );

        Ok(DVector { zoning: target.clone(), segmentation: self.segmentation.clone(), data })
    }
}

/// Exact equality: same catalogues (by name) and bit-identical values.
impl PartialEq for DVector {
    fn eq(&self, other: &Self) -> bool {
        self.zoning == other.zoning
            && self.segmentation == other.segmentation
            && self.data == other.data
    }
}

/// Multiply two vectors and immediately collapse the product to `target`,
/// without keeping the full-resolution product alive.
pub fn multiply_and_aggregate(
    lhs: &DVector,
    rhs: &DVector,
    target: &Arc<SegmentationLevel>,
) -> Result<DVector> {
    lhs.combine(ArithmeticOp::Mul, rhs)?.aggregate(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;

    fn lad() -> Arc<ZoningSystem> {
        Arc::new(ZoningSystem::new("lad", ["E1", "E2"]).unwrap())
    }

    fn msoa() -> Arc<ZoningSystem> {
        Arc::new(ZoningSystem::new("msoa", ["E1a", "E1b", "E2a"]).unwrap())
    }

    fn p_m() -> Arc<SegmentationLevel> {
        Arc::new(
            SegmentationLevel::new(
                "p_m",
                &["p", "m"],
                vec![Segment::from([1, 1]), Segment::from([1, 2]), Segment::from([2, 1])],
            )
            .unwrap(),
        )
    }

    fn p_only() -> Arc<SegmentationLevel> {
        Arc::new(
            SegmentationLevel::new("p", &["p"], vec![Segment::from([1]), Segment::from([2])])
                .unwrap(),
        )
    }

    fn make_vector() -> DVector {
        let mut data = Array2::zeros((2, 3));
        data[[0, 0]] = 10.0; // E1, p1_m1
        data[[0, 1]] = 20.0; // E1, p1_m2
        data[[1, 2]] = 5.0; // E2, p2_m1
        DVector::from_dense(lad(), p_m(), data).unwrap()
    }

    #[test]
    fn from_dense_rejects_shape_mismatch() {
        let err = DVector::from_dense(lad(), p_m(), Array2::zeros((3, 3))).unwrap_err();
        assert!(matches!(err, DemandError::Format(_)));
    }

    #[test]
    fn reductions_sum_the_right_axes() {
        let v = make_vector();
        assert_eq!(v.sum(), 35.0);
        assert_eq!(v.zone_totals().to_vec(), vec![30.0, 5.0]);
        assert_eq!(v.segment_totals().to_vec(), vec![10.0, 20.0, 5.0]);
    }

    #[test]
    fn aggregation_sums_segments_sharing_a_projection() {
        let v = make_vector();
        let coarse = v.aggregate(&p_only()).unwrap();

        // {p1,m1}:10 + {p1,m2}:20 -> {p1}:30 per zone.
        assert_eq!(coarse.value(0, 0), 30.0);
        assert_eq!(coarse.value(0, 1), 0.0);
        assert_eq!(coarse.value(1, 1), 5.0);
        assert_eq!(coarse.sum(), v.sum());
        assert_eq!(coarse.segmentation().name(), "p");
    }

    #[test]
    fn aggregation_to_incompatible_level_fails() {
        let v = make_vector();
        let coarse = v.aggregate(&p_only()).unwrap();
        let err = coarse.aggregate(&p_m()).unwrap_err();
        assert!(matches!(err, DemandError::IncompatibleSegmentation { .. }));
    }

    #[test]
    fn weighted_translation_splits_by_weight() {
        let lad = lad();
        let msoa = msoa();
        let seg = p_only();

        let mut data = Array2::zeros((2, 2));
        data[[0, 0]] = 100.0; // E1, p1
        let v = DVector::from_dense(lad.clone(), seg, data).unwrap();

        let table = TranslationTable::from_rows(
            &lad,
            &msoa,
            &[("E1", "E1a", 0.3), ("E1", "E1b", 0.7), ("E2", "E2a", 1.0)],
        )
        .unwrap();

        let out = v
            .translate_with(&msoa, &table, TranslationWeighting::Weighted)
            .unwrap();
        assert_eq!(out.value(0, 0), 30.0); // E1a
        assert_eq!(out.value(1, 0), 70.0); // E1b
        assert_eq!(out.value(2, 0), 0.0); // E2a
        assert!((out.sum() - v.sum()).abs() < 1e-9);
        assert_eq!(out.segmentation().name(), "p");
    }

    #[test]
    fn no_weight_translation_copies_full_values() {
        let lad = lad();
        let msoa = msoa();
        let seg = p_only();

        let mut data = Array2::zeros((2, 2));
        data[[0, 0]] = 1.5; // a factor vector, not additive demand
        let v = DVector::from_dense(lad.clone(), seg, data).unwrap();

        let table = TranslationTable::from_rows(
            &lad,
            &msoa,
            &[("E1", "E1a", 0.3), ("E1", "E1b", 0.7)],
        )
        .unwrap();

        let out = v
            .translate_with(&msoa, &table, TranslationWeighting::NoWeight)
            .unwrap();
        assert_eq!(out.value(0, 0), 1.5);
        assert_eq!(out.value(1, 0), 1.5);
    }

    #[test]
    fn translation_with_mismatched_table_fails() {
        let v = make_vector();
        let msoa = msoa();
        let backwards = TranslationTable::from_rows(&msoa, &v.zoning().clone(), &[
            ("E1a", "E1", 1.0),
        ])
        .unwrap();

        let err = v
            .translate_with(&msoa, &backwards, TranslationWeighting::Weighted)
            .unwrap_err();
        assert!(matches!(err, DemandError::Format(_)));
    }

    #[test]
    fn scalar_ops_apply_uniformly() {
        let v = make_vector();
        assert_eq!(v.scale(2.0).sum(), 70.0);
        assert_eq!(v.scalar_divide(2.0).value(0, 1), 10.0);
        assert_eq!(v.scalar_divide(0.0).sum(), 0.0); // zero divisor saturates

        let negated = v.scale(-1.0);
        assert_eq!(negated.abs().sum(), v.sum());
    }

    #[test]
    fn multiply_and_aggregate_matches_the_two_step_form() {
        let v = make_vector();
        let w = make_vector();
        let fused = multiply_and_aggregate(&v, &w, &p_only()).unwrap();
        let two_step = v.combine(ArithmeticOp::Mul, &w).unwrap().aggregate(&p_only()).unwrap();
        assert_eq!(fused, two_step);
    }
}
