//! News/announcements extraction.
//!
//! The front page nests the announcements table inside the first
//! `.box-warning` container. Every `tr` with at least three `td` cells
//! becomes a record; no row is treated specially, so if the portal ever adds
//! a `td`-based header row it would be misread as an article (the live table
//! uses `th` for its header, which `cell_texts` never matches).

use scraper::{Html, Selector};
use tracing::info;

use super::{cell_texts, collect_records, RowOutcome, RowSkip};
use crate::core::config::NEWS_MARKER;
use crate::types::NewsArticle;

const MIN_CELLS: usize = 3;

/// Scan every row of the announcements table, keeping skip reasons.
///
/// Zero `.box-warning` containers (or no nested table) is an empty scan, not
/// an error — the portal renders the box only when announcements exist.
pub fn scan_news_rows(html: &str) -> Vec<RowOutcome<NewsArticle>> {
    let document = Html::parse_document(html);

    let (Ok(container_sel), Ok(table_sel), Ok(row_sel)) = (
        Selector::parse(NEWS_MARKER),
        Selector::parse("table"),
        Selector::parse("tr"),
    ) else {
        return Vec::new();
    };

    let Some(container) = document.select(&container_sel).next() else {
        info!("news: no '{}' container in page", NEWS_MARKER);
        return Vec::new();
    };
    let Some(table) = container.select(&table_sel).next() else {
        info!("news: '{}' container holds no table", NEWS_MARKER);
        return Vec::new();
    };

    table
        .select(&row_sel)
        .enumerate()
        .map(|(idx, row)| {
            let cells = cell_texts(row);
            if cells.len() < MIN_CELLS {
                return RowOutcome::Skipped(RowSkip::TooFewCells {
                    have: cells.len(),
                    need: MIN_CELLS,
                });
            }
            RowOutcome::Record(NewsArticle {
                id: (idx + 1).to_string(),
                date: cells[0].clone(),
                category: cells[1].clone(),
                title: cells[2].clone(),
                content: String::new(),
            })
        })
        .collect()
}

/// Records only — what the API returns.
pub fn extract_news(html: &str) -> Vec<NewsArticle> {
    collect_records(scan_news_rows(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(table_body: &str) -> String {
        format!(
            r#"<html><body>
                 <div class="box-warning"><table>{table_body}</table></div>
               </body></html>"#
        )
    }

    #[test]
    fn test_four_clean_rows_give_four_records() {
        let html = page(
            "<tr><td>04/01</td><td>Office</td><td>Spring schedule</td></tr>
             <tr><td>04/02</td><td>Library</td><td>New hours</td></tr>
             <tr><td>04/03</td><td>Office</td><td>Bus change</td></tr>
             <tr><td>04/04</td><td>Clubs</td><td>Recruitment</td></tr>",
        );
        let articles = extract_news(&html);
        assert_eq!(articles.len(), 4);
        let ids: Vec<&str> = articles.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        assert!(articles.iter().all(|a| a.content.is_empty()));
        assert_eq!(articles[1].category, "Library");
        assert_eq!(articles[2].title, "Bus change");
    }

    #[test]
    fn test_short_rows_are_skipped_with_reason() {
        let html = page(
            "<tr><td>04/01</td><td>Office</td></tr>
             <tr><td>04/02</td><td>Library</td><td>New hours</td></tr>",
        );
        let outcomes = scan_news_rows(&html);
        assert_eq!(outcomes.len(), 2);
        assert_eq!(
            outcomes[0],
            RowOutcome::Skipped(RowSkip::TooFewCells { have: 2, need: 3 })
        );
        assert_eq!(extract_news(&html).len(), 1);
        // The id tracks the row position, not the record count.
        assert_eq!(extract_news(&html)[0].id, "2");
    }

    #[test]
    fn test_cell_text_is_trimmed() {
        let html = page("<tr><td>  04/01 </td><td>\n Office </td><td> Spring schedule\t</td></tr>");
        let articles = extract_news(&html);
        assert_eq!(articles[0].date, "04/01");
        assert_eq!(articles[0].category, "Office");
        assert_eq!(articles[0].title, "Spring schedule");
    }

    #[test]
    fn test_no_container_is_empty_not_error() {
        let html = "<html><body><p>maintenance</p></body></html>";
        assert!(extract_news(html).is_empty());
        assert!(scan_news_rows(html).is_empty());
    }

    #[test]
    fn test_container_without_table_is_empty() {
        let html = r#"<html><body><div class="box-warning">no announcements</div></body></html>"#;
        assert!(extract_news(html).is_empty());
    }

    #[test]
    fn test_only_first_container_is_read() {
        let html = r#"<html><body>
            <div class="box-warning"><table>
              <tr><td>04/01</td><td>Office</td><td>First box</td></tr>
            </table></div>
            <div class="box-warning"><table>
              <tr><td>04/02</td><td>Other</td><td>Second box</td></tr>
            </table></div>
        </body></html>"#;
        let articles = extract_news(html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "First box");
    }

    #[test]
    fn test_th_header_row_yields_no_record() {
        let html = page(
            "<tr><th>Date</th><th>Category</th><th>Title</th></tr>
             <tr><td>04/01</td><td>Office</td><td>Spring schedule</td></tr>",
        );
        let outcomes = scan_news_rows(&html);
        // The th row has zero td cells and is skipped, but still occupies
        // row position 1 — the record after it gets id "2".
        assert_eq!(
            outcomes[0],
            RowOutcome::Skipped(RowSkip::TooFewCells { have: 0, need: 3 })
        );
        let articles = extract_news(&html);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "2");
    }
}
