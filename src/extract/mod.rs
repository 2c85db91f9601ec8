//! Table extraction from captured portal HTML.
//!
//! The extractors are pure functions over an HTML string, so every brittle
//! assumption about the portal's markup is testable against fixtures without
//! a browser. Both extractors report a typed outcome per table row instead of
//! silently swallowing misshapen rows — tests assert *why* a row was dropped,
//! production callers just keep the records.

use scraper::{ElementRef, Selector};

pub mod cancellations;
pub mod news;

pub use cancellations::extract_cancellations;
pub use news::extract_news;

/// Why a table row produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowSkip {
    /// Fewer `td` cells than the extractor's minimum.
    TooFewCells { have: usize, need: usize },
    /// A required field was empty after trimming.
    EmptyRequiredField(&'static str),
}

/// Per-row extraction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T> {
    Record(T),
    Skipped(RowSkip),
}

impl<T> RowOutcome<T> {
    pub fn into_record(self) -> Option<T> {
        match self {
            RowOutcome::Record(r) => Some(r),
            RowOutcome::Skipped(_) => None,
        }
    }
}

/// Trimmed text of each `td` cell in a row, in document order.
fn cell_texts(row: ElementRef<'_>) -> Vec<String> {
    let Ok(td) = Selector::parse("td") else {
        return Vec::new();
    };
    row.select(&td)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn collect_records<T>(outcomes: Vec<RowOutcome<T>>) -> Vec<T> {
    outcomes.into_iter().filter_map(RowOutcome::into_record).collect()
}
