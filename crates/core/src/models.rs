use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Bytes sent so far for one upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_loaded: u64,
    pub bytes_total: u64,
}

impl UploadProgress {
    /// `None` when the total is unknown.
    pub fn percent(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        let ratio = self.bytes_loaded as f64 / self.bytes_total as f64;
        Some((ratio * 100.0).clamp(0.0, 100.0))
    }
}

/// Keyword search request body for `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    /// Empty means every indexed title.
    pub pdf_title: String,
}

impl SearchQuery {
    pub fn from_input(raw_keywords: &str, pdf_title: &str) -> Option<Self> {
        let keywords = parse_keywords(raw_keywords);
        if keywords.is_empty() {
            return None;
        }
        Some(Self {
            keywords,
            pdf_title: pdf_title.to_string(),
        })
    }
}

/// Splits a comma separated keyword field, trimming and dropping blanks.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

/// A page reference the server may send either as a number or as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PageRef {
    Number(u64),
    Text(String),
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(number) => write!(f, "{number}"),
            PageRef::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForumResult {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Problem Description")]
    pub problem_description: String,
    #[serde(rename = "Solution")]
    pub solution: String,
    #[serde(rename = "Chapter")]
    pub chapter: String,
    #[serde(rename = "Keyword", default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(rename = "Chapter Page", default, skip_serializing_if = "Option::is_none")]
    pub chapter_page: Option<PageRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfResult {
    #[serde(rename = "Keyword", default)]
    pub keyword: Option<String>,
    #[serde(rename = "Sentence")]
    pub sentence: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Page Number")]
    pub page_number: PageRef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    #[serde(rename = "tkData", default)]
    pub forum: Vec<ForumResult>,
    #[serde(rename = "pdfData", default)]
    pub pdf: Vec<PdfResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub duration: f64,
    pub num_results: u64,
    pub results: SearchResults,
}

/// Response body of the JSON endpoints that answer with either a
/// `message` or an `error`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StatusReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RemoveFileRequest {
    pub file_name: String,
}

/// What a single upload attempt came back with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadReply {
    Accepted,
    /// 400 with the body's `error` field, if it had one.
    Rejected(Option<String>),
    Failed(u16),
}

/// File picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
}

impl UploadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.pdf".to_string())
    }
}

/// Ordered titles pushed by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PdfTitleList(pub Vec<String>);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub message: String,
}

/// Forum entry body for `POST /submit_problem`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForumSubmission {
    pub name: String,
    #[serde(rename = "problem-description")]
    pub problem_description: String,
    pub solution: String,
    #[serde(rename = "chapter-name")]
    pub chapter_name: String,
    #[serde(rename = "chapter-page")]
    pub chapter_page: String,
}

impl ForumSubmission {
    pub fn is_complete(&self) -> bool {
        [
            &self.name,
            &self.problem_description,
            &self.solution,
            &self.chapter_name,
            &self.chapter_page,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TocEntry {
    #[serde(rename = "Chapter")]
    pub level: u32,
    #[serde(rename = "Title")]
    pub title: String,
    /// `-1` when the entry's target could not be resolved to a page.
    #[serde(rename = "Page")]
    pub page: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_keeps_entries_with_unresolved_pages() {
        let body = r#"[
            {"Chapter": 1, "Title": "1 Intro", "Page": 3},
            {"Chapter": 2, "Title": "2 External link", "Page": -1}
        ]"#;
        let toc: Vec<TocEntry> = serde_json::from_str(body).unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[1].level, 2);
        assert_eq!(toc[1].page, -1);
    }

    #[test]
    fn keywords_are_trimmed_and_blanks_dropped() {
        assert_eq!(parse_keywords("  a, ,b ,"), vec!["a", "b"]);
        assert_eq!(parse_keywords("pump,  valve , seal"), vec!["pump", "valve", "seal"]);
        assert!(parse_keywords(" , ,, ").is_empty());
    }

    #[test]
    fn empty_keyword_input_builds_no_query() {
        assert!(SearchQuery::from_input("   ,  ", "").is_none());
        let query = SearchQuery::from_input("loop", "manual.pdf").unwrap();
        assert_eq!(query.keywords, vec!["loop"]);
        assert_eq!(query.pdf_title, "manual.pdf");
    }

    #[test]
    fn progress_percent_needs_a_total() {
        let unknown = UploadProgress {
            bytes_loaded: 10,
            bytes_total: 0,
        };
        assert_eq!(unknown.percent(), None);

        let half = UploadProgress {
            bytes_loaded: 50,
            bytes_total: 200,
        };
        assert_eq!(half.percent(), Some(25.0));
    }

    #[test]
    fn search_response_accepts_numeric_and_text_pages() {
        let body = r#"{
            "duration": 0.0123,
            "num_results": 2,
            "results": {
                "tkData": [{
                    "Name": "Ana",
                    "Keyword": "loop",
                    "Problem Description": "infinite <b>loop</b>",
                    "Solution": "add a break",
                    "Chapter": "3",
                    "Chapter Page": "12"
                }],
                "pdfData": [{
                    "Keyword": "loop",
                    "Page Number": 4,
                    "Sentence": "a <b>loop</b> here.",
                    "Title": "manual.pdf"
                }]
            }
        }"#;

        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.num_results, 2);
        assert_eq!(response.results.forum[0].chapter_page, Some(PageRef::Text("12".into())));
        assert_eq!(response.results.pdf[0].page_number, PageRef::Number(4));
        assert_eq!(response.results.pdf[0].page_number.to_string(), "4");
    }

    #[test]
    fn forum_submission_uses_dashed_field_names() {
        let submission = ForumSubmission {
            name: "Ana".into(),
            problem_description: "jam".into(),
            solution: "oil".into(),
            chapter_name: "Maintenance".into(),
            chapter_page: "7".into(),
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["problem-description"], "jam");
        assert_eq!(value["chapter-page"], "7");
        assert!(submission.is_complete());
        assert!(!ForumSubmission::default().is_complete());
    }
}
