use std::collections::BTreeSet;
use std::sync::Arc;

use ndarray::Array2;
use polars::frame::DataFrame;
use polars::prelude::{DataType, NamedFrom};
use polars::series::Series;

use crate::error::{DemandError, Result, ValidationReport};
use crate::segments::SegmentationLevel;
use crate::types::Segment;
use crate::zoning::ZoningSystem;

use super::DVector;

impl DVector {
    /// Build a demand vector from a long-format table: one row per non-zero
    /// zone × segment combination, with a designated zone column and value
    /// column, and the segmentation's defining columns alongside.
    ///
    /// Every zone id and segment tuple is validated against its catalogue;
    /// all offenders are collected into one validation error and no partial
    /// vector is created. Rows repeating a (zone, segment) key are summed.
    /// Combinations absent from the table are zero.
    pub fn from_table(
        segmentation: &Arc<SegmentationLevel>,
        zoning: &Arc<ZoningSystem>,
        df: &DataFrame,
        zone_col: &str,
        val_col: &str,
    ) -> Result<DVector> {
        let zones = df.column(zone_col)?.cast(&DataType::String)?;
        let zones = zones.str()?;
        let values = df.column(val_col)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let seg_columns = segmentation
            .columns()
            .iter()
            .map(|col| Ok(df.column(col.as_ref())?.cast(&DataType::Int64)?))
            .collect::<Result<Vec<_>>>()?;
        let seg_values = seg_columns
            .iter()
            .map(|col| Ok(col.i64()?))
            .collect::<Result<Vec<_>>>()?;

        let mut unknown_zones = BTreeSet::new();
        let mut unknown_segments = BTreeSet::new();
        let mut data = Array2::zeros((zoning.len(), segmentation.len()));

        for i in 0..df.height() {
            let zone_idx = match zones.get(i) {
                Some(id) => {
                    let idx = zoning.index_of(id);
                    if idx.is_none() {
                        unknown_zones.insert(id.to_string());
                    }
                    idx
                }
                None => {
                    unknown_zones.insert("<null>".to_string());
                    None
                }
            };

            let codes: Vec<Option<i64>> = seg_values.iter().map(|col| col.get(i)).collect();
            let segment: Option<Segment> = codes
                .iter()
                .map(|code| match code {
                    Some(v) if (0..=i64::from(u16::MAX)).contains(v) => Some(*v as u16),
                    _ => None,
                })
                .collect();
            let segment_idx = segment.as_ref().and_then(|s| segmentation.index_of(s));
            if segment_idx.is_none() {
                unknown_segments.insert(describe_segment(segmentation, &codes));
            }

            if let (Some(z), Some(s)) = (zone_idx, segment_idx) {
                data[[z as usize, s as usize]] += values.get(i).unwrap_or(0.0);
            }
        }

        if !unknown_zones.is_empty() || !unknown_segments.is_empty() {
            return Err(DemandError::Validation(ValidationReport {
                unknown_zones: unknown_zones.into_iter().collect(),
                unknown_segments: unknown_segments.into_iter().collect(),
            }));
        }

        tracing::debug!(
            zoning = zoning.name(),
            segmentation = segmentation.name(),
            rows = df.height(),
            "built demand vector from table"
        );

        DVector::from_dense(zoning.clone(), segmentation.clone(), data)
    }

    /// Export as a long-format DataFrame: `zone`, the segmentation's
    /// defining columns, and `val`. Zero cells are skipped.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let n_dims = self.segmentation().columns().len();
        let mut zones: Vec<String> = Vec::new();
        let mut dims: Vec<Vec<u32>> = vec![Vec::new(); n_dims];
        let mut vals: Vec<f64> = Vec::new();

        for (z, zone_id) in self.zoning().zone_ids().iter().enumerate() {
            for (s, segment) in self.segmentation().segments().iter().enumerate() {
                let value = self.value(z, s);
                if value == 0.0 {
                    continue;
                }
                zones.push(zone_id.to_string());
                for (d, &code) in segment.values().iter().enumerate() {
                    dims[d].push(u32::from(code));
                }
                vals.push(value);
            }
        }

        let mut columns = vec![Series::new("zone".into(), zones).into()];
        for (d, col) in self.segmentation().columns().iter().enumerate() {
            columns.push(Series::new(col.as_ref().into(), std::mem::take(&mut dims[d])).into());
        }
        columns.push(Series::new("val".into(), vals).into());

        Ok(DataFrame::new(columns)?)
    }
}

/// Human-readable `p=1, m=?` description of a (possibly malformed) tuple.
fn describe_segment(segmentation: &SegmentationLevel, codes: &[Option<i64>]) -> String {
    segmentation
        .columns()
        .iter()
        .zip(codes)
        .map(|(col, code)| match code {
            Some(v) => format!("{col}={v}"),
            None => format!("{col}=?"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
