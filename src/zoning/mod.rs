mod translation;
mod zoning;

pub use translation::{TranslationTable, TranslationWeighting};
pub use zoning::ZoningSystem;
