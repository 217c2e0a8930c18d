//! Sheet formatting plan
//!
//! [`plan_formatting`] derives an ordered list of [`FormatOp`]s from the row
//! values. Order matters: the whole-table style comes first so later header
//! and border ops are not overwritten by it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::rows::is_blank;

/// Style constants. These vary per target page, so they are configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub body_font_size: u32,
    pub header_font_size: u32,
    pub bold_headers: bool,
    /// Outline every non-blank row
    pub borders: bool,
    /// Auto-resize columns `0..auto_resize_columns`
    pub auto_resize_columns: usize,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            body_font_size: 12,
            header_font_size: 14,
            bold_headers: true,
            borders: true,
            auto_resize_columns: 3,
        }
    }
}

/// One unit of styling, applied in list order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FormatOp {
    /// Centered, middle-aligned, wrapped text over `rows × cols`
    WholeRangeStyle {
        rows: usize,
        cols: usize,
        font_size: u32,
    },
    ColumnAutoResize { start: usize, end: usize },
    HeaderRowStyle {
        row: usize,
        cols: usize,
        bold: bool,
        font_size: u32,
    },
    /// Outer and inner borders around a single row
    RowBorder { row: usize, cols: usize },
}

/// Plan formatting for `values`, with `headers` as returned by
/// [`crate::rows::header_indices`].
///
/// Always starts with the whole-table style, then column auto-resize, header
/// styles in ascending row order, and finally one border per non-blank row.
pub fn plan_formatting<S: AsRef<str>>(
    values: &[Vec<S>],
    headers: &[usize],
    style: &StyleConfig,
) -> Vec<FormatOp> {
    let rows = values.len();
    let cols = values.iter().map(Vec::len).max().unwrap_or(0);

    let mut headers = headers.to_vec();
    headers.sort_unstable();
    headers.dedup();

    let mut ops = Vec::with_capacity(2 + headers.len() + rows);
    ops.push(FormatOp::WholeRangeStyle {
        rows,
        cols,
        font_size: style.body_font_size,
    });
    ops.push(FormatOp::ColumnAutoResize {
        start: 0,
        end: style.auto_resize_columns,
    });

    ops.extend(headers.into_iter().map(|row| FormatOp::HeaderRowStyle {
        row,
        cols,
        bold: style.bold_headers,
        font_size: style.header_font_size,
    }));

    if style.borders {
        ops.extend(
            values
                .iter()
                .enumerate()
                .filter(|(_, cells)| !is_blank(cells.as_slice()))
                .map(|(row, _)| FormatOp::RowBorder { row, cols }),
        );
    }

    ops
}

impl FormatOp {
    /// Google Sheets `batchUpdate` request for this op on tab `sheet_id`
    pub fn to_request(&self, sheet_id: i64) -> Value {
        match *self {
            FormatOp::WholeRangeStyle {
                rows,
                cols,
                font_size,
            } => json!({
                "repeatCell": {
                    "range": grid_range(sheet_id, 0, rows, cols),
                    "cell": {
                        "userEnteredFormat": {
                            "textFormat": { "fontSize": font_size },
                            "horizontalAlignment": "CENTER",
                            "verticalAlignment": "MIDDLE",
                            "wrapStrategy": "WRAP",
                        }
                    },
                    "fields": "userEnteredFormat(textFormat,horizontalAlignment,verticalAlignment,wrapStrategy)",
                }
            }),
            FormatOp::ColumnAutoResize { start, end } => json!({
                "autoResizeDimensions": {
                    "dimensions": {
                        "sheetId": sheet_id,
                        "dimension": "COLUMNS",
                        "startIndex": start,
                        "endIndex": end,
                    }
                }
            }),
            FormatOp::HeaderRowStyle {
                row,
                cols,
                bold,
                font_size,
            } => json!({
                "repeatCell": {
                    "range": grid_range(sheet_id, row, row + 1, cols),
                    "cell": {
                        "userEnteredFormat": {
                            "textFormat": { "bold": bold, "fontSize": font_size },
                            "horizontalAlignment": "CENTER",
                            "wrapStrategy": "WRAP",
                        }
                    },
                    "fields": "userEnteredFormat(textFormat,horizontalAlignment,wrapStrategy)",
                }
            }),
            FormatOp::RowBorder { row, cols } => {
                let solid = json!({
                    "style": "SOLID",
                    "width": 1,
                    "color": { "red": 0, "green": 0, "blue": 0 },
                });
                json!({
                    "updateBorders": {
                        "range": grid_range(sheet_id, row, row + 1, cols),
                        "top": solid,
                        "bottom": solid,
                        "left": solid,
                        "right": solid,
                        "innerHorizontal": solid,
                        "innerVertical": solid,
                    }
                })
            }
        }
    }
}

/// Render a whole plan, preserving order
pub fn to_requests(ops: &[FormatOp], sheet_id: i64) -> Vec<Value> {
    ops.iter().map(|op| op.to_request(sheet_id)).collect()
}

fn grid_range(sheet_id: i64, start_row: usize, end_row: usize, cols: usize) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": start_row,
        "endRowIndex": end_row,
        "startColumnIndex": 0,
        "endColumnIndex": cols,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::header_indices;

    fn values(rows: &[[&str; 3]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn border_rows(ops: &[FormatOp]) -> Vec<usize> {
        ops.iter()
            .filter_map(|op| match op {
                FormatOp::RowBorder { row, .. } => Some(*row),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_single_section_plan() {
        let values = values(&[
            ["Page", "https://x", ""],
            ["", "", ""],
            ["VIP Access", "Date", "Link"],
            ["Ticket A", "Mon 1 Jan", r#"=HYPERLINK("https://x/a", "Click here")"#],
            ["Ticket B", "", ""],
            ["", "", ""],
        ]);
        let headers = header_indices(&values);
        let ops = plan_formatting(&values, &headers, &StyleConfig::default());

        assert_eq!(
            ops[..3],
            [
                FormatOp::WholeRangeStyle {
                    rows: 6,
                    cols: 3,
                    font_size: 12
                },
                FormatOp::ColumnAutoResize { start: 0, end: 3 },
                FormatOp::HeaderRowStyle {
                    row: 2,
                    cols: 3,
                    bold: true,
                    font_size: 14
                },
            ]
        );
        assert_eq!(border_rows(&ops), vec![0, 2, 3, 4]);
        assert_eq!(ops.len(), 3 + 4);
    }

    #[test]
    fn test_title_only_plan() {
        let values = values(&[["Page", "https://x", ""], ["", "", ""]]);
        let ops = plan_formatting(&values, &header_indices(&values), &StyleConfig::default());
        assert_eq!(border_rows(&ops), vec![0]);
        assert!(!ops.iter().any(|op| matches!(op, FormatOp::HeaderRowStyle { .. })));
    }

    #[test]
    fn test_whole_range_style_always_first() {
        let empty: Vec<Vec<String>> = vec![];
        let ops = plan_formatting(&empty, &[], &StyleConfig::default());
        assert!(matches!(ops[0], FormatOp::WholeRangeStyle { rows: 0, cols: 0, .. }));

        let all_blank = values(&[["", "", ""], [" ", "", "\t"]]);
        let ops = plan_formatting(&all_blank, &[], &StyleConfig::default());
        assert!(matches!(ops[0], FormatOp::WholeRangeStyle { rows: 2, cols: 3, .. }));
        assert!(border_rows(&ops).is_empty());
    }

    #[test]
    fn test_headers_sorted_and_borders_optional() {
        let values = values(&[
            ["A", "Date", "Link"],
            ["x", "", ""],
            ["B", "Date", "Link"],
        ]);
        let style = StyleConfig {
            borders: false,
            ..StyleConfig::default()
        };
        let ops = plan_formatting(&values, &[2, 0, 2], &style);
        let header_rows: Vec<usize> = ops
            .iter()
            .filter_map(|op| match op {
                FormatOp::HeaderRowStyle { row, .. } => Some(*row),
                _ => None,
            })
            .collect();
        assert_eq!(header_rows, vec![0, 2]);
        assert!(border_rows(&ops).is_empty());
    }

    #[test]
    fn test_column_count_is_widest_row() {
        let values = vec![
            vec!["a".to_string()],
            vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
        ];
        let ops = plan_formatting(&values, &[], &StyleConfig::default());
        assert!(matches!(ops[0], FormatOp::WholeRangeStyle { cols: 4, .. }));
    }

    #[test]
    fn test_border_request_shape() {
        let request = FormatOp::RowBorder { row: 3, cols: 3 }.to_request(42);
        let borders = &request["updateBorders"];
        assert_eq!(borders["range"]["sheetId"], 42);
        assert_eq!(borders["range"]["startRowIndex"], 3);
        assert_eq!(borders["range"]["endRowIndex"], 4);
        assert_eq!(borders["range"]["endColumnIndex"], 3);
        for side in ["top", "bottom", "left", "right", "innerHorizontal", "innerVertical"] {
            assert_eq!(borders[side]["style"], "SOLID");
        }
    }

    #[test]
    fn test_whole_range_request_applies_font_size() {
        let request = FormatOp::WholeRangeStyle {
            rows: 6,
            cols: 3,
            font_size: 12,
        }
        .to_request(7);
        let repeat = &request["repeatCell"];
        assert_eq!(repeat["cell"]["userEnteredFormat"]["textFormat"]["fontSize"], 12);
        assert_eq!(repeat["cell"]["userEnteredFormat"]["verticalAlignment"], "MIDDLE");
        assert!(repeat["fields"].as_str().unwrap().contains("textFormat"));
    }
}
