//! Option chain enrichment for option writers.
//!
//! Pipeline, run strictly in sequence:
//! - Fetch one side of the chain (empty table on failure)
//! - Attach premium (price × lot size) and the margin to sell one lot
//! - Export to CSV and summarise
//!
//! Every row of the chain survives to the output; rows without a usable
//! quote or margin carry zeros.

pub mod chain;
pub mod enrich;
pub mod export;
pub mod report;
pub mod source;

pub use chain::{fetch_contracts, instrument_key};
pub use enrich::{enrich_contracts, EnrichConfig};
pub use export::CsvExporter;
pub use report::{BestContract, EnrichedContract, OptionReport, ReportSummary, COLUMNS};
pub use source::{MarginSource, OptionChainSource};
