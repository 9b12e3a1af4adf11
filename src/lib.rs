#![doc = "Tripvec public API"]
pub mod cli;
pub mod commands;
mod dvector;
mod error;
pub mod io;
pub mod jobs;
pub mod registry;
pub mod report;
mod segments;
mod types;
mod zoning;

#[doc(inline)]
pub use dvector::{multiply_and_aggregate, ArithmeticOp, DVector};

#[doc(inline)]
pub use error::{CatalogueKind, DemandError, Result, ValidationReport};

#[doc(inline)]
pub use registry::{CsvLookupSource, InMemorySource, LookupSource, Registry};

#[doc(inline)]
pub use segments::SegmentationLevel;

#[doc(inline)]
pub use types::Segment;

#[doc(inline)]
pub use zoning::{TranslationTable, TranslationWeighting, ZoningSystem};
