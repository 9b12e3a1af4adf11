use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::{AggregateArgs, BuildArgs, ReportArgs, TranslateArgs, Weighting};
use crate::dvector::DVector;
use crate::registry::Registry;
use crate::report::{write_sector_reports, SectorReportSpec};
use crate::zoning::TranslationWeighting;

fn require_overwritable(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        bail!("Refusing to overwrite existing file: {} (use --force)", path.display());
    }
    Ok(())
}

impl From<Weighting> for TranslationWeighting {
    fn from(weighting: Weighting) -> Self {
        match weighting {
            Weighting::Weighted => TranslationWeighting::Weighted,
            Weighting::NoWeight => TranslationWeighting::NoWeight,
        }
    }
}

pub fn build(args: &BuildArgs, registry: &Registry) -> Result<()> {
    require_overwritable(&args.output, args.force)?;

    let zoning = registry.zoning(&args.zoning)?;
    let segmentation = registry.segmentation(&args.segmentation)?;
    let df = crate::io::read_csv(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let vector = DVector::from_table(&segmentation, &zoning, &df, &args.zone_col, &args.val_col)?;
    tracing::info!(total = vector.sum(), "built demand vector");
    vector.save(&args.output)?;
    Ok(())
}

pub fn aggregate(args: &AggregateArgs, registry: &Registry) -> Result<()> {
    require_overwritable(&args.output, args.force)?;

    let vector = DVector::load(&args.input, registry)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let target = registry.segmentation(&args.to)?;

    vector.aggregate(&target)?.save(&args.output)?;
    Ok(())
}

pub fn translate(args: &TranslateArgs, registry: &Registry) -> Result<()> {
    require_overwritable(&args.output, args.force)?;

    let vector = DVector::load(&args.input, registry)
        .with_context(|| format!("loading {}", args.input.display()))?;

    vector
        .translate_zoning(registry, &args.to, args.weighting.into())?
        .save(&args.output)?;
    Ok(())
}

pub fn report(args: &ReportArgs, registry: &Registry) -> Result<()> {
    require_overwritable(&args.output, args.force)?;

    let vector = DVector::load(&args.input, registry)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let target = registry.segmentation(&args.segmentation)?;

    let spec = SectorReportSpec {
        sector_zoning: args.sectors.clone(),
        weighting: args.weighting.into(),
        output: args.output.clone(),
    };
    write_sector_reports(&vector, registry, &target, &[spec])?;
    Ok(())
}
