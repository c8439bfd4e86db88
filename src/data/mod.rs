//! Data layer: core types, loading, inference, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .xlsx / .ods / .csv / .parquet / .json
//!        │
//!        ▼
//!   ┌──────────┐     ┌──────────┐
//!   │  source   │ ──▶ │  cache    │  newest file, keyed by path + mtime
//!   └──────────┘     └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → rows of CellValue
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  infer    │  categorical / numeric / temporal per column
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  value sets + date ranges → FilteredView
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  KPIs, monthly series, breakdown, ranking
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod infer;
pub mod loader;
pub mod model;
pub mod source;
