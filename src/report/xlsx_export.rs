use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, Image, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::error::Result;
use crate::report::csv_export::{SCREENSHOT_COLUMN, header, row};
use crate::run::run_model::{RunLog, StepRecord};

const MAX_SHEET_NAME: usize = 31;
const IMAGE_ROW_HEIGHT: f64 = 153.0;
const IMAGE_COLUMN_WIDTH: f64 = 55.0;
const MAX_COLUMN_WIDTH: usize = 80;

/// Write the log as a workbook.
///
/// With correlation values, each distinct value gets its own sheet (first-seen
/// order) and records without one go to an `Ungrouped` sheet. Otherwise all
/// records land in a single `Logs` sheet. Screenshots that still exist on
/// disk are embedded in their cell.
pub fn export_xlsx(log: &RunLog, correlation_header: &str, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let columns = header(log, correlation_header);
    let with_correlation = log.has_correlation();
    let mut used_names: Vec<String> = Vec::new();

    if with_correlation {
        for (key, records) in log.correlation_groups() {
            let name = unique_sheet_name(&sanitize_sheet_name(key), &mut used_names);
            write_sheet(workbook.add_worksheet(), &name, &columns, &records, true)?;
        }
        let ungrouped: Vec<&StepRecord> = log
            .records()
            .iter()
            .filter(|r| r.correlation.is_none())
            .collect();
        if !ungrouped.is_empty() {
            let name = unique_sheet_name("Ungrouped", &mut used_names);
            write_sheet(workbook.add_worksheet(), &name, &columns, &ungrouped, true)?;
        }
    } else {
        let records: Vec<&StepRecord> = log.records().iter().collect();
        write_sheet(workbook.add_worksheet(), "Logs", &columns, &records, false)?;
    }

    workbook.save(path)?;
    debug!("Wrote workbook {}", path.display());
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    columns: &[String],
    records: &[&StepRecord],
    with_correlation: bool,
) -> Result<()> {
    worksheet.set_name(name)?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x1F4E78))
        .set_font_color(Color::White)
        .set_align(FormatAlign::Top)
        .set_align(FormatAlign::Left);
    let cell_format = Format::new()
        .set_align(FormatAlign::Top)
        .set_align(FormatAlign::Left);

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for (col, title) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, title, &header_format)?;
    }

    let screenshot_col = columns.iter().position(|c| c == SCREENSHOT_COLUMN);

    for (i, record) in records.iter().enumerate() {
        let row_num = (i + 1) as u32;
        let cells = row(record, with_correlation);
        for (col, cell) in cells.iter().enumerate() {
            if Some(col) == screenshot_col {
                if let Some(shot) = &record.screenshot {
                    if shot.exists() {
                        match Image::new(shot) {
                            Ok(image) => {
                                worksheet.set_row_height(row_num, IMAGE_ROW_HEIGHT)?;
                                worksheet.insert_image_fit_to_cell(row_num, col as u16, &image, true)?;
                                continue;
                            }
                            Err(e) => warn!("Could not embed {}: {}", shot.display(), e),
                        }
                    }
                }
            }
            widths[col] = widths[col].max(cell.chars().count());
            worksheet.write_string_with_format(row_num, col as u16, cell, &cell_format)?;
        }
    }

    for (col, width) in widths.iter().enumerate() {
        let width = if Some(col) == screenshot_col {
            IMAGE_COLUMN_WIDTH
        } else {
            ((*width).min(MAX_COLUMN_WIDTH) + 2) as f64
        };
        worksheet.set_column_width(col as u16, width)?;
    }

    Ok(())
}

/// Replace anything outside `[A-Za-z0-9]` with `_` and cut to the 31-char sheet limit.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_SHEET_NAME)
        .collect();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

/// Sheet names compare case-insensitively in workbooks; suffix `_2`, `_3`... on collision.
pub fn unique_sheet_name(base: &str, used: &mut Vec<String>) -> String {
    let taken = |candidate: &str, used: &[String]| {
        used.iter().any(|u| u.eq_ignore_ascii_case(candidate))
    };

    let mut candidate = base.to_string();
    let mut n = 2;
    while taken(&candidate, used) {
        let suffix = format!("_{}", n);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.len());
        candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    used.push(candidate.clone());
    candidate
}
