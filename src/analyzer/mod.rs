//! Per-page analysis
//!
//! - [`signals`]: the [`SignalSource`] seam and the stock extractors
//! - [`page`]: the [`PageAnalyzer`] turning a fetched page into a [`crate::PageResult`]

pub mod page;
pub mod signals;

pub use page::{composite_score, PageAnalyzer, PageInput};
pub use signals::{AnalysisError, DefaultSignals, PageContext, SignalSource};
