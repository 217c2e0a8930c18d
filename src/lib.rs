//! Ticket page to spreadsheet publisher
//!
//! Fetches a ticketing page, extracts "section → ticket item" records and
//! writes them to a Google Sheets tab with formatting:
//! - Section extraction (section-scoped or heading-anchored)
//! - Item normalisation with HYPERLINK formulas
//! - Row layout and header detection
//! - Formatting plan (whole-table style, header styles, row borders)

pub mod config;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod format;
pub mod pipeline;
pub mod rows;
pub mod server;
pub mod sheets;

pub use error::{Error, Result};
pub use extractors::{ExtractionMode, Item, LinkStyle, Section, SelectorProfile};
pub use format::{plan_formatting, FormatOp, StyleConfig};
pub use pipeline::{Pipeline, Preview, PreviewRequest, PublishRequest, Published};
pub use rows::{build_rows, header_indices, is_blank, is_header, Row, RowKind};
