//! Flat row layout written to the sheet
//!
//! Rows carry an explicit [`RowKind`] internally; at the boundary they are
//! plain three-cell string rows, and header/blank rows are recognised
//! structurally again by [`is_header`] and [`is_blank`].

use serde::{Serialize, Serializer};

use crate::extractors::{Item, Section};

/// Marker cells that identify a section header row
pub const DATE_HEADER: &str = "Date";
pub const LINK_HEADER: &str = "Link";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Title,
    Header,
    Item,
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    kind: RowKind,
    cells: [String; 3],
}

impl Row {
    /// `[page title, source url, ""]`
    pub fn title(page_title: &str, link: &str) -> Self {
        Self {
            kind: RowKind::Title,
            cells: [page_title.to_string(), link.to_string(), String::new()],
        }
    }

    /// `[section title, "Date", "Link"]`
    pub fn header(section_title: &str) -> Self {
        Self {
            kind: RowKind::Header,
            cells: [
                section_title.to_string(),
                DATE_HEADER.to_string(),
                LINK_HEADER.to_string(),
            ],
        }
    }

    pub fn item(item: &Item) -> Self {
        Self {
            kind: RowKind::Item,
            cells: [
                item.label.clone(),
                item.descriptor.clone(),
                item.link.clone(),
            ],
        }
    }

    pub fn blank() -> Self {
        Self {
            kind: RowKind::Blank,
            cells: Default::default(),
        }
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn to_values(&self) -> Vec<String> {
        self.cells.to_vec()
    }
}

/// Rows serialize as their plain cells
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.cells.serialize(serializer)
    }
}

/// Title row, blank row, then per section: header, items, blank.
///
/// Sections without items still get their header and trailing blank, so
/// `rows.len() == 2 + Σ(2 + items.len())`.
pub fn build_rows(page_title: &str, link: &str, sections: &[Section]) -> Vec<Row> {
    let capacity = 2 + sections.iter().map(|s| 2 + s.items.len()).sum::<usize>();
    let mut rows = Vec::with_capacity(capacity);

    rows.push(Row::title(page_title, link));
    rows.push(Row::blank());

    for section in sections {
        rows.push(Row::header(&section.title));
        rows.extend(section.items.iter().map(Row::item));
        rows.push(Row::blank());
    }

    rows
}

/// Plain cell values, as appended to the sheet
pub fn to_values(rows: &[Row]) -> Vec<Vec<String>> {
    rows.iter().map(Row::to_values).collect()
}

/// Every cell empty or whitespace-only. An empty row counts as blank.
pub fn is_blank<S: AsRef<str>>(cells: &[S]) -> bool {
    cells.iter().all(|cell| cell.as_ref().trim().is_empty())
}

/// Exact, case-sensitive match on the marker cells; no trimming
pub fn is_header<S: AsRef<str>>(cells: &[S]) -> bool {
    cells.len() >= 3 && cells[1].as_ref() == DATE_HEADER && cells[2].as_ref() == LINK_HEADER
}

/// Indices of header rows, ascending
pub fn header_indices<S: AsRef<str>>(values: &[Vec<S>]) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, cells)| is_header(cells.as_slice()))
        .map(|(i, _)| i)
        .collect()
}
