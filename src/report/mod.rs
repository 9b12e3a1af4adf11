//! Sector report writers: collapse a demand vector to a reporting
//! segmentation, translate it onto sector geographies, and write the
//! results as long-format CSVs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::dvector::DVector;
use crate::error::Result;
use crate::io::{write_atomic, write_csv_bytes};
use crate::registry::Registry;
use crate::segments::SegmentationLevel;
use crate::zoning::TranslationWeighting;

/// One sector report output: the sector zoning to translate onto, how to
/// spread values across sectors, and where to write the CSV.
#[derive(Debug, Clone)]
pub struct SectorReportSpec {
    pub sector_zoning: String,
    pub weighting: TranslationWeighting,
    pub output: PathBuf,
}

impl SectorReportSpec {
    pub fn new(sector_zoning: &str, output: impl Into<PathBuf>) -> Self {
        Self {
            sector_zoning: sector_zoning.to_string(),
            weighting: TranslationWeighting::Weighted,
            output: output.into(),
        }
    }
}

/// Aggregate `vector` to the reporting segmentation once, then write one
/// CSV per spec.
pub fn write_sector_reports(
    vector: &DVector,
    registry: &Registry,
    target: &Arc<SegmentationLevel>,
    specs: &[SectorReportSpec],
) -> Result<()> {
    let aggregated = vector.aggregate(target)?;
    for spec in specs {
        write_sector_report(&aggregated, registry, spec)?;
    }
    Ok(())
}

/// Translate an already-aggregated vector onto one sector zoning and write
/// it as a long-format CSV (zone, defining columns, val).
pub fn write_sector_report(
    aggregated: &DVector,
    registry: &Registry,
    spec: &SectorReportSpec,
) -> Result<()> {
    let sectored =
        aggregated.translate_zoning(registry, &spec.sector_zoning, spec.weighting)?;
    let mut df = sectored.to_dataframe()?;
    write_atomic(&spec.output, &write_csv_bytes(&mut df)?)?;

    tracing::info!(
        sectors = spec.sector_zoning.as_str(),
        rows = df.height(),
        path = %spec.output.display(),
        "wrote sector report"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use crate::registry::InMemorySource;
    use crate::types::Segment;
    use crate::zoning::ZoningSystem;

    use super::*;

    fn make_registry() -> Registry {
        let mut source = InMemorySource::new();
        source.add_zoning(ZoningSystem::new("msoa", ["M1", "M2"]).unwrap());
        source.add_zoning(ZoningSystem::new("sector", ["north", "south"]).unwrap());
        source.add_segmentation(
            SegmentationLevel::new(
                "p_m",
                &["p", "m"],
                vec![Segment::from([1, 1]), Segment::from([1, 2])],
            )
            .unwrap(),
        );
        source.add_segmentation(
            SegmentationLevel::new("p", &["p"], vec![Segment::from([1])]).unwrap(),
        );
        source.add_translation("msoa", "sector", vec![
            ("M1".into(), "north".into(), 1.0),
            ("M2".into(), "north".into(), 0.5),
            ("M2".into(), "south".into(), 0.5),
        ]);
        Registry::new(source)
    }

    #[test]
    fn report_aggregates_translates_and_writes_csv() {
        let registry = make_registry();
        let zoning = registry.zoning("msoa").unwrap();
        let segmentation = registry.segmentation("p_m").unwrap();
        let target = registry.segmentation("p").unwrap();

        let mut data = Array2::zeros((2, 2));
        data[[0, 0]] = 10.0;
        data[[0, 1]] = 20.0;
        data[[1, 0]] = 8.0;
        let vector = DVector::from_dense(zoning, segmentation, data).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sectors.csv");
        let specs = [SectorReportSpec::new("sector", &out)];

        write_sector_reports(&vector, &registry, &target, &specs).unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("zone,p,val"));
        // M1 (30) fully north, M2 (8) split evenly: north 34, south 4.
        assert_eq!(lines.next(), Some("north,1,34.0"));
        assert_eq!(lines.next(), Some("south,1,4.0"));
    }
}
