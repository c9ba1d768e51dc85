use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

use crate::error::{VidyaError, Result};
use crate::formats::{source_file_name, DocumentParser};
use crate::models::{ExcelUnitMeta, TextUnit, UnitMetadata};

/// Excel workbook reader emitting one unit per non-empty sheet
pub struct SpreadsheetParser;

impl DocumentParser for SpreadsheetParser {
    fn parse(&self, path: &Path) -> Result<Vec<TextUnit>> {
        let mut workbook: Xlsx<_> =
            open_workbook(path).map_err(|e: calamine::XlsxError| VidyaError::DocumentExtraction {
                format: "Spreadsheet".to_string(),
                reason: format!("Failed to open workbook: {}", e),
            })?;

        let source_file = source_file_name(path);
        let mut units = Vec::new();

        for sheet_name in workbook.sheet_names().to_vec() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!("Skipping sheet '{}' in {}: {}", sheet_name, source_file, e);
                    continue;
                }
            };

            let grid: Vec<Vec<String>> =
                range.rows().map(|row| row.iter().map(cell_text).collect()).collect();

            let Some(rendered) = render_sheet(&grid) else {
                tracing::debug!("Sheet '{}' in {} is empty", sheet_name, source_file);
                continue;
            };

            let metadata = UnitMetadata::Excel(ExcelUnitMeta {
                source_file: source_file.clone(),
                sheet: sheet_name.clone(),
                rows: rendered.rows,
                columns: rendered.columns,
            });

            units.extend(TextUnit::new(rendered.text, metadata));
        }

        Ok(units)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["xlsx"]
    }

    fn format_name(&self) -> &str {
        "Spreadsheet"
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// A sheet serialized as an aligned text table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSheet {
    pub text: String,

    /// Data rows below the header
    pub rows: usize,

    pub columns: usize,
}

/// Serialize a cell grid with its first non-empty row as the header.
///
/// Columns are right-aligned to their widest cell and separated by two
/// spaces; row order is preserved. Returns `None` when the grid holds no text.
pub fn render_sheet(grid: &[Vec<String>]) -> Option<RenderedSheet> {
    let is_blank = |row: &Vec<String>| row.iter().all(|cell| cell.trim().is_empty());

    let start = grid.iter().position(|row| !is_blank(row))?;
    let end = grid.iter().rposition(|row| !is_blank(row))?;
    let rows = &grid[start..=end];

    let columns = rows
        .iter()
        .filter_map(|row| row.iter().rposition(|cell| !cell.trim().is_empty()))
        .max()
        .map(|last| last + 1)?;

    let mut widths = vec![0usize; columns];
    for row in rows {
        for (idx, cell) in row.iter().take(columns).enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|idx| {
                    let cell = row.get(idx).map(String::as_str).unwrap_or("");
                    format!("{:>width$}", cell, width = widths[idx])
                })
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect();

    let text = lines.join("\n");
    if text.trim().is_empty() {
        return None;
    }

    Some(RenderedSheet { text, rows: rows.len() - 1, columns })
}
