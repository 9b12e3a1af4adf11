use std::path::{Path, PathBuf};

use polars::frame::DataFrame;
use polars::prelude::DataType;

use crate::error::{DemandError, Result};
use crate::io::read_csv;
use crate::segments::SegmentationLevel;
use crate::types::Segment;
use crate::zoning::{TranslationTable, ZoningSystem};

use super::LookupSource;

/// A lookup source reading catalogue definitions from a directory of CSVs:
///
/// ```text
/// <root>/zoning/<name>.csv                 column: zone
/// <root>/segmentation/<name>.csv           header = defining columns
/// <root>/translation/<from>_to_<to>.csv    columns: from_zone, to_zone, weight
/// ```
#[derive(Debug, Clone)]
pub struct CsvLookupSource {
    root: PathBuf,
}

impl CsvLookupSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LookupSource for CsvLookupSource {
    fn load_zoning(&self, name: &str) -> Result<Option<ZoningSystem>> {
        let path = self.root.join("zoning").join(format!("{name}.csv"));
        if !path.exists() {
            return Ok(None);
        }

        let df = read_csv(&path)?;
        let ids = string_column(&df, "zone", &path)?;
        Ok(Some(ZoningSystem::new(name, ids)?))
    }

    fn load_segmentation(&self, name: &str) -> Result<Option<SegmentationLevel>> {
        let path = self.root.join("segmentation").join(format!("{name}.csv"));
        if !path.exists() {
            return Ok(None);
        }

        let df = read_csv(&path)?;
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|c| c.to_string())
            .collect();

        let mut dims = Vec::with_capacity(columns.len());
        for column in &columns {
            let cast = df.column(column.as_str())?.cast(&DataType::Int64)?;
            let values = cast.i64()?;
            if values.null_count() > 0 {
                return Err(DemandError::Format(format!(
                    "null segment value in column '{column}' of {}",
                    path.display()
                )));
            }
            let codes = values
                .into_no_null_iter()
                .map(|v| {
                    u16::try_from(v).map_err(|_| {
                        DemandError::Format(format!(
                            "segment value {v} in column '{column}' of {} is out of range",
                            path.display()
                        ))
                    })
                })
                .collect::<Result<Vec<u16>>>()?;
            dims.push(codes);
        }

        let segments = (0..df.height())
            .map(|i| dims.iter().map(|codes| codes[i]).collect::<Segment>())
            .collect();

        Ok(Some(SegmentationLevel::new(name, &columns, segments)?))
    }

    fn load_translation(
        &self,
        from: &ZoningSystem,
        to: &ZoningSystem,
    ) -> Result<Option<TranslationTable>> {
        let path = self
            .root
            .join("translation")
            .join(format!("{}_to_{}.csv", from.name(), to.name()));
        if !path.exists() {
            return Ok(None);
        }

        let df = read_csv(&path)?;
        let from_zones = string_column(&df, "from_zone", &path)?;
        let to_zones = string_column(&df, "to_zone", &path)?;
        let weights_cast = df.column("weight")?.cast(&DataType::Float64)?;
        let weights = weights_cast.f64()?;
        if weights.null_count() > 0 {
            return Err(DemandError::Format(format!(
                "null weight in {}",
                path.display()
            )));
        }

        let rows: Vec<(String, String, f64)> = from_zones
            .into_iter()
            .zip(to_zones)
            .zip(weights.into_no_null_iter())
            .map(|((f, t), w)| (f, t, w))
            .collect();

        Ok(Some(TranslationTable::from_rows(from, to, &rows)?))
    }
}

/// Read a fully-populated string column, preserving id text as-is.
fn string_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<String>> {
    let cast = df.column(name)?.cast(&DataType::String)?;
    let values = cast.str()?;
    if values.null_count() > 0 {
        return Err(DemandError::Format(format!(
            "null value in column '{name}' of {}",
            path.display()
        )));
    }
    Ok(values.into_no_null_iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::registry::Registry;

    use super::*;

    /// Lay down a miniature lookup directory and drive it end to end.
    fn write_lookups(root: &Path) {
        fs::create_dir_all(root.join("zoning")).unwrap();
        fs::create_dir_all(root.join("segmentation")).unwrap();
        fs::create_dir_all(root.join("translation")).unwrap();

        fs::write(root.join("zoning/lad.csv"), "zone\nE1\nE2\n").unwrap();
        fs::write(root.join("zoning/msoa.csv"), "zone\nE1a\nE1b\nE2a\n").unwrap();
        fs::write(root.join("segmentation/p_m.csv"), "p,m\n1,1\n1,2\n2,1\n").unwrap();
        fs::write(
            root.join("translation/lad_to_msoa.csv"),
            "from_zone,to_zone,weight\nE1,E1a,0.3\nE1,E1b,0.7\nE2,E2a,1.0\n",
        )
        .unwrap();
    }

    #[test]
    fn loads_catalogues_from_a_lookup_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_lookups(dir.path());
        let registry = Registry::new(CsvLookupSource::new(dir.path()));

        let lad = registry.zoning("lad").unwrap();
        assert_eq!(lad.len(), 2);
        assert_eq!(lad.index_of("E2"), Some(1));

        let p_m = registry.segmentation("p_m").unwrap();
        assert_eq!(p_m.columns().len(), 2);
        assert_eq!(p_m.index_of(&Segment::from([2, 1])), Some(2));

        let table = registry.translation("lad", "msoa").unwrap();
        assert_eq!(table.entry_count(), 3);
        assert_eq!(table.row_weight_sums(), vec![1.0, 1.0]);
    }

    #[test]
    fn missing_files_surface_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write_lookups(dir.path());
        let registry = Registry::new(CsvLookupSource::new(dir.path()));

        assert!(registry.zoning("ward").is_err());
        assert!(registry.segmentation("p_m_tp").is_err());
        assert!(registry.translation("msoa", "lad").is_err());
    }
}
