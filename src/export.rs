//! Excel export functionality.

use crate::models::{Role, RotationRecord};
use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, XlsxError};
use std::path::Path;

/// Export rotation history to Excel file.
/// One row per scheduled person, most recent rotation first.
pub fn export_history_to_excel(history: &[RotationRecord], path: &Path) -> Result<usize, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name("Rotation History")?;

    // Header format
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x4472C4))
        .set_font_color(Color::White)
        .set_border(FormatBorder::Thin);

    let headers = ["Timestamp", "Role", "Position", "Name"];

    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    worksheet.set_column_width(0, 22)?; // Timestamp
    worksheet.set_column_width(1, 12)?; // Role
    worksheet.set_column_width(2, 10)?; // Position
    worksheet.set_column_width(3, 30)?; // Name

    let mut row: u32 = 0;
    for record in history {
        for role in Role::ALL {
            for (idx, name) in record.order_for(role).iter().enumerate() {
                row += 1;
                worksheet.write_string(row, 0, &record.timestamp)?;
                worksheet.write_string(row, 1, role.as_str())?;
                worksheet.write_number(row, 2, (idx + 1) as f64)?;
                worksheet.write_string(row, 3, name)?;
            }
        }
    }

    if row > 0 {
        worksheet.autofilter(0, 0, row, 3)?;
    }

    // Freeze top row
    worksheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(row as usize)
}

/// Generate default filename for export.
pub fn generate_export_filename(prefix: &str) -> String {
    let now = Local::now();
    format!("{prefix}_{ts}.xlsx", ts = now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_writes_one_row_per_person() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.xlsx");
        let history = vec![
            RotationRecord::new(
                "2025/12/02 12:00:00".to_string(),
                vec!["A".to_string(), "B".to_string()],
                vec!["C".to_string()],
            ),
            RotationRecord::new("2025/12/01 12:00:00".to_string(), Vec::new(), vec!["C".to_string()]),
        ];

        let rows = export_history_to_excel(&history, &path).unwrap();
        assert_eq!(rows, 4);
        assert!(path.exists());
    }

    #[test]
    fn test_export_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        assert_eq!(export_history_to_excel(&[], &path).unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_export_filename() {
        let name = generate_export_filename("break_history");
        assert!(name.starts_with("break_history_"));
        assert!(name.ends_with(".xlsx"));
    }
}
