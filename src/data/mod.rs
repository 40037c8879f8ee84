/// Data layer: core types, tabular I/O, outlier filters and staging.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐       ┌──────────────────┐
///   │ StagedSeries  │ ───▶ │ filter / window   │  column → filtered Sequence
///   │ source        │ ◀─── └──────────────────┘
///   │ working       │
///   │ committed     │
///   └──────────────┘
///        │  export()
///        ▼
///   ┌──────────┐
///   │  writer   │  Dataset → file
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod staged;
pub mod window;
pub mod writer;

pub use error::{ErrorKind, SieveError};
pub use filter::{FilterStrategy, FilterSummary};
pub use loader::{load_dataset, SheetSelector};
pub use model::{CellValue, Column, Dataset, Sample, Sequence};
pub use staged::{StagedSeries, Working};
pub use writer::{save_dataset, SavePolicy, DEFAULT_SHEET};
