use serde::{Deserialize, Serialize};

/// One row of the portal's front-page announcements table.
///
/// `id` is the 1-based row position within a single scrape. It is unique
/// within one response only — the portal assigns no stable identifiers, so
/// the same article may carry a different `id` on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub date: String,
    pub category: String,
    pub title: String,
    /// Reserved. The listing page carries no article body; always empty.
    #[serde(default)]
    pub content: String,
}

/// One row of the class-cancellations table.
///
/// A row only becomes a record when `date`, `period`, `subject` and
/// `instructor` are all non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub date: String,
    pub period: String,
    pub subject: String,
    pub instructor: String,
    #[serde(default)]
    pub remarks: String,
}
