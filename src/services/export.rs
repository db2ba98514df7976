//! Table export of filtered readings, as CSV or PDF.

use crate::error::AppError;
use crate::models::ReadingRow;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

/// Column headers, in output order.
pub const CSV_HEADER: [&str; 3] = ["formatted_timestamp", "sensorID", "pressure"];

/// Render rows as UTF-8 CSV with a header row.
pub fn readings_to_csv(rows: &[ReadingRow]) -> String {
    let mut out = String::with_capacity(32 * (rows.len() + 1));
    push_record(&mut out, CSV_HEADER.iter().copied());

    for row in rows {
        let pressure = row.pressure.to_string();
        push_record(
            &mut out,
            [
                row.formatted_timestamp.as_str(),
                row.sensor_id.as_str(),
                pressure.as_str(),
            ],
        );
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// RFC 4180 quoting: only when the field contains a separator, quote or
/// line break.
fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// A4 portrait.
const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN: f32 = 15.0;
const ROW_HEIGHT: f32 = 8.0;
const COLUMN_X: [f32; 3] = [MARGIN, 75.0, 135.0];
const TITLE: &str = "Filtered Data";

/// Render rows as a one-table PDF with the same columns as the CSV.
///
/// Rows continue onto new pages; the header is repeated on each page.
pub fn readings_to_pdf(rows: &[ReadingRow]) -> Result<Vec<u8>, AppError> {
    let (doc, page, layer) = PdfDocument::new(TITLE, PAGE_WIDTH, PAGE_HEIGHT, "Table");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut current = doc.get_page(page).get_layer(layer);
    current.use_text(TITLE, 14.0, Mm(MARGIN), Mm(PAGE_HEIGHT.0 - MARGIN), &bold);
    let mut y = PAGE_HEIGHT.0 - MARGIN - 2.0 * ROW_HEIGHT;
    write_row(&current, CSV_HEADER, y, &bold);

    for row in rows {
        y -= ROW_HEIGHT;
        if y < MARGIN {
            let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Table");
            current = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT.0 - MARGIN;
            write_row(&current, CSV_HEADER, y, &bold);
            y -= ROW_HEIGHT;
        }

        let pressure = row.pressure.to_string();
        write_row(
            &current,
            [
                row.formatted_timestamp.as_str(),
                row.sensor_id.as_str(),
                pressure.as_str(),
            ],
            y,
            &font,
        );
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn write_row(layer: &PdfLayerReference, cells: [&str; 3], y: f32, font: &IndirectFontRef) {
    for (x, cell) in COLUMN_X.iter().zip(cells) {
        layer.use_text(cell, 10.0, Mm(*x), Mm(y), font);
    }
}

fn pdf_error(e: printpdf::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("PDF export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sensor: &str, pressure: f64) -> ReadingRow {
        ReadingRow {
            sensor_id: sensor.to_string(),
            timestamp: "2024-05-01T08:00:00Z".to_string(),
            formatted_timestamp: "01/05/2024 16:00".to_string(),
            pressure,
        }
    }

    #[test]
    fn test_header_and_rows() {
        let csv = readings_to_csv(&[row("REG-01", 2.5), row("REG-02", 3.0)]);
        assert_eq!(
            csv,
            "formatted_timestamp,sensorID,pressure\n\
             01/05/2024 16:00,REG-01,2.5\n\
             01/05/2024 16:00,REG-02,3\n"
        );
    }

    #[test]
    fn test_quotes_awkward_sensor_ids() {
        let csv = readings_to_csv(&[row("line \"A\", east", 1.0)]);
        assert!(csv.contains("\"line \"\"A\"\", east\""));
    }

    #[test]
    fn test_empty_export_has_header() {
        assert_eq!(readings_to_csv(&[]), "formatted_timestamp,sensorID,pressure\n");
    }

    #[test]
    fn test_pdf_export_is_a_pdf() {
        let bytes = readings_to_pdf(&[row("REG-01", 2.5)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_pdf_export_spans_pages() {
        let rows: Vec<ReadingRow> = (0..200).map(|i| row("REG-01", i as f64)).collect();
        let one_page = readings_to_pdf(&rows[..5]).unwrap();
        let many_pages = readings_to_pdf(&rows).unwrap();

        assert!(many_pages.starts_with(b"%PDF"));
        assert!(many_pages.len() > one_page.len());
    }

    #[test]
    fn test_empty_pdf_export_still_renders() {
        assert!(readings_to_pdf(&[]).unwrap().starts_with(b"%PDF"));
    }
}
