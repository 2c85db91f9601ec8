//! Class-cancellations extraction.
//!
//! The cancellation page renders one `table.dataTable`. Row 0 is always the
//! header and is skipped unconditionally. Data rows need at least 5 cells;
//! the first four are date/period/subject/instructor and cell 7 is remarks
//! when the row is wide enough. The remarks index is a fixed offset into the
//! portal's current column layout — schema drift there misaligns the field
//! silently rather than failing, which is why the column mapping lives in
//! one place here.

use scraper::{Html, Selector};
use tracing::info;

use super::{cell_texts, collect_records, RowOutcome, RowSkip};
use crate::core::config::CANCELLATIONS_MARKER;
use crate::types::Cancellation;

const MIN_CELLS: usize = 5;
const REMARKS_CELL: usize = 7;

/// Scan every data row of the cancellations table, keeping skip reasons.
pub fn scan_cancellation_rows(html: &str) -> Vec<RowOutcome<Cancellation>> {
    let document = Html::parse_document(html);

    let (Ok(table_sel), Ok(row_sel)) = (
        Selector::parse(CANCELLATIONS_MARKER),
        Selector::parse("tr"),
    ) else {
        return Vec::new();
    };

    let Some(table) = document.select(&table_sel).next() else {
        info!("cancellations: no '{}' in page", CANCELLATIONS_MARKER);
        return Vec::new();
    };

    table
        .select(&row_sel)
        .skip(1) // header row
        .map(|row| {
            let cells = cell_texts(row);
            if cells.len() < MIN_CELLS {
                return RowOutcome::Skipped(RowSkip::TooFewCells {
                    have: cells.len(),
                    need: MIN_CELLS,
                });
            }

            let record = Cancellation {
                date: cells[0].clone(),
                period: cells[1].clone(),
                subject: cells[2].clone(),
                instructor: cells[3].clone(),
                remarks: cells.get(REMARKS_CELL).cloned().unwrap_or_default(),
            };

            for (value, field) in [
                (&record.date, "date"),
                (&record.period, "period"),
                (&record.subject, "subject"),
                (&record.instructor, "instructor"),
            ] {
                if value.is_empty() {
                    return RowOutcome::Skipped(RowSkip::EmptyRequiredField(field));
                }
            }

            RowOutcome::Record(record)
        })
        .collect()
}

/// Records only — what the API returns.
pub fn extract_cancellations(html: &str) -> Vec<Cancellation> {
    collect_records(scan_cancellation_rows(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
                 <table class="dataTable">
                   <tr><th>Date</th><th>Period</th><th>Subject</th><th>Instructor</th>
                       <th>Room</th><th>A</th><th>B</th><th>Remarks</th></tr>
                   {rows}
                 </table>
               </body></html>"#
        )
    }

    fn full_row(date: &str, period: &str, subject: &str, instructor: &str, remarks: &str) -> String {
        format!(
            "<tr><td>{date}</td><td>{period}</td><td>{subject}</td><td>{instructor}</td>\
             <td>101</td><td>-</td><td>-</td><td>{remarks}</td></tr>"
        )
    }

    #[test]
    fn test_header_skipped_and_short_row_dropped() {
        // Row 1: 6 cells, required fields all set. Row 2: only 4 cells.
        let rows = "<tr><td>04/10</td><td>2</td><td>Math I</td><td>Tanaka</td><td>101</td><td>-</td></tr>
                    <tr><td>04/11</td><td>3</td><td>English</td><td>Sato</td></tr>";
        let html = page(rows);
        let outcomes = scan_cancellation_rows(&html);
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0], RowOutcome::Record(_)));
        assert_eq!(
            outcomes[1],
            RowOutcome::Skipped(RowSkip::TooFewCells { have: 4, need: 5 })
        );

        let records = extract_cancellations(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].subject, "Math I");
        // 6 cells — no cell index 7, so remarks default to empty.
        assert_eq!(records[0].remarks, "");
    }

    #[test]
    fn test_remarks_come_from_eighth_cell() {
        let html = page(&full_row("04/10", "2", "Math I", "Tanaka", "make-up on 04/17"));
        let records = extract_cancellations(&html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].remarks, "make-up on 04/17");
    }

    #[test]
    fn test_record_requires_all_four_fields() {
        let html = page(&[
            full_row("04/10", "2", "Math I", "Tanaka", ""),
            full_row("", "3", "English", "Sato", ""),
            full_row("04/11", "  ", "Physics", "Suzuki", ""),
            full_row("04/12", "4", "", "Ito", ""),
            full_row("04/13", "5", "Chemistry", " ", ""),
        ]
        .join("\n"));

        let outcomes = scan_cancellation_rows(&html);
        assert_eq!(outcomes.len(), 5);
        assert!(matches!(outcomes[0], RowOutcome::Record(_)));
        assert_eq!(
            outcomes[1],
            RowOutcome::Skipped(RowSkip::EmptyRequiredField("date"))
        );
        assert_eq!(
            outcomes[2],
            RowOutcome::Skipped(RowSkip::EmptyRequiredField("period"))
        );
        assert_eq!(
            outcomes[3],
            RowOutcome::Skipped(RowSkip::EmptyRequiredField("subject"))
        );
        assert_eq!(
            outcomes[4],
            RowOutcome::Skipped(RowSkip::EmptyRequiredField("instructor"))
        );
        assert_eq!(extract_cancellations(&html).len(), 1);
    }

    #[test]
    fn test_no_table_is_empty_not_error() {
        let html = "<html><body><table><tr><td>wrong table</td></tr></table></body></html>";
        assert!(extract_cancellations(html).is_empty());
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let html = page("");
        assert!(extract_cancellations(&html).is_empty());
        assert!(scan_cancellation_rows(&html).is_empty());
    }

    #[test]
    fn test_fields_are_trimmed() {
        let html = page(&full_row(" 04/10 ", " 2 ", " Math I ", " Tanaka ", "  note  "));
        let records = extract_cancellations(&html);
        assert_eq!(records[0].date, "04/10");
        assert_eq!(records[0].period, "2");
        assert_eq!(records[0].subject, "Math I");
        assert_eq!(records[0].instructor, "Tanaka");
        assert_eq!(records[0].remarks, "note");
    }
}
