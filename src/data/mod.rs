/// Data layer: core types, loading, filtering, joining and statistics.
///
/// Architecture:
/// ```text
///  Data/ (fetched + unpacked once if missing)
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  .csv / .parquet / .json → DetectionRecord, PollutantSeries
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  exact day / ±N days / month, bounding box, near targets
///   └──────────┘     (proximity: geodesic distance to the target points)
///        │
///        ▼
///   ┌──────────┐
///   │   join   │  outer merge on (date, alias-resolved region)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  stats   │  describe per region, pairwise Pearson matrix
///   └──────────┘
/// ```

pub mod fetch;
pub mod filter;
pub mod join;
pub mod loader;
pub mod model;
pub mod proximity;
pub mod stats;
