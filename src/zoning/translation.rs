use std::sync::Arc;

use crate::error::{DemandError, Result, ValidationReport};
use crate::zoning::ZoningSystem;

/// How source zone values are spread across overlapping target zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationWeighting {
    /// Split each source value across targets in proportion to the overlap
    /// weight. Conserves the grand total when per-source weights sum to 1.
    Weighted,
    /// Copy each source value in full to every overlapping target, ignoring
    /// the weight. For ratio/factor vectors where splitting would be wrong.
    NoWeight,
}

/// A sparse zone correspondence between two zoning systems, stored in
/// compressed sparse row format keyed by source zone index.
#[derive(Debug, Clone)]
pub struct TranslationTable {
    from: Arc<str>,
    to: Arc<str>,
    target_count: usize,
    offsets: Vec<u32>, // len = source_count + 1
    targets: Vec<u32>,
    weights: Vec<f64>,
}

impl TranslationTable {
    /// Build a table from raw `(from_zone, to_zone, weight)` rows.
    ///
    /// Zone ids on either side that are missing from their catalogue fail
    /// with a validation report listing every offender.
    pub fn from_rows<S: AsRef<str>>(
        from: &ZoningSystem,
        to: &ZoningSystem,
        rows: &[(S, S, f64)],
    ) -> Result<Self> {
        let mut report = ValidationReport::default();
        let mut buckets: Vec<Vec<(u32, f64)>> = vec![Vec::new(); from.len()];

        for (src, dst, weight) in rows {
            let (src, dst) = (src.as_ref(), dst.as_ref());
            let src_idx = from.index_of(src);
            let dst_idx = to.index_of(dst);
            if src_idx.is_none() {
                report.unknown_zones.push(format!("{}:{src}", from.name()));
            }
            if dst_idx.is_none() {
                report.unknown_zones.push(format!("{}:{dst}", to.name()));
            }
            if let (Some(s), Some(d)) = (src_idx, dst_idx) {
                buckets[s as usize].push((d, *weight));
            }
        }

        if !report.is_empty() {
            report.unknown_zones.sort();
            report.unknown_zones.dedup();
            return Err(DemandError::Validation(report));
        }

        // Flatten buckets into CSR arrays, targets sorted within each row.
        let mut offsets = Vec::with_capacity(from.len() + 1);
        let mut targets = Vec::with_capacity(rows.len());
        let mut weights = Vec::with_capacity(rows.len());
        offsets.push(0);
        for mut bucket in buckets {
            bucket.sort_by_key(|&(t, _)| t);
            for (t, w) in bucket {
                targets.push(t);
                weights.push(w);
            }
            offsets.push(targets.len() as u32);
        }

        Ok(Self {
            from: Arc::from(from.name()),
            to: Arc::from(to.name()),
            target_count: to.len(),
            offsets,
            targets,
            weights,
        })
    }

    #[inline]
    pub fn from_name(&self) -> &str {
        &self.from
    }

    #[inline]
    pub fn to_name(&self) -> &str {
        &self.to
    }

    /// Number of source zones the table was built against.
    #[inline]
    pub fn source_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Number of target zones the table was built against.
    #[inline]
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Total number of nonzero (source, target) correspondences.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.targets.len()
    }

    #[inline]
    fn range(&self, source: usize) -> std::ops::Range<usize> {
        self.offsets[source] as usize..self.offsets[source + 1] as usize
    }

    /// Iterate the `(target index, weight)` pairs overlapping a source zone.
    #[inline]
    pub fn row(&self, source: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(source)
            .map(move |k| (self.targets[k] as usize, self.weights[k]))
    }

    /// Sum of weights per source zone. A fully covered additive translation
    /// has every entry equal to 1.
    pub fn row_weight_sums(&self) -> Vec<f64> {
        (0..self.source_count())
            .map(|s| self.row(s).map(|(_, w)| w).sum())
            .collect()
    }
}
