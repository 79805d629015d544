use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::{ForumResult, PageRef, PdfResult, PdfTitleList, SearchResponse};

pub const TITLE_PLACEHOLDER: &str = "Select PDF Title";

/// Clamped gauge value and its two-decimal label.
pub fn gauge(percent: f64) -> (f64, String) {
    let value = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    };
    (value, format!("{value:.2}%"))
}

pub fn reset_gauge() -> (f64, String) {
    (0.0, "0%".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TitleSelector {
    SearchFilter,
    RemovalTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleOptions {
    pub options: Vec<SelectOption>,
}

impl From<&PdfTitleList> for TitleOptions {
    fn from(titles: &PdfTitleList) -> Self {
        let placeholder = SelectOption {
            value: String::new(),
            label: TITLE_PLACEHOLDER.to_string(),
        };
        let options = std::iter::once(placeholder)
            .chain(titles.0.iter().map(|title| SelectOption {
                value: title.clone(),
                label: title.clone(),
            }))
            .collect();
        Self { options }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub duration_secs: f64,
    pub num_results: u64,
}

impl From<&SearchResponse> for SearchSummary {
    fn from(response: &SearchResponse) -> Self {
        Self {
            duration_secs: response.duration,
            num_results: response.num_results,
        }
    }
}

impl fmt::Display for SearchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Duration: {:.3} seconds", self.duration_secs)?;
        write!(f, "Results Found: {}", self.num_results)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Forum,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEntry {
    Forum(ForumResult),
    Pdf(PdfResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSection {
    pub keyword: String,
    pub entries: Vec<PanelEntry>,
}

impl KeywordSection {
    pub fn heading(&self) -> String {
        format!("Results for \"{}\"", self.keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Empty(String),
    /// May be empty when several keywords matched nothing.
    Sections(Vec<KeywordSection>),
}

pub fn forum_panel(results: &[ForumResult], keywords: &[String]) -> ResultPanel {
    group_by_keyword(
        results,
        keywords,
        |result, needle| {
            contains_ignore_case(&result.problem_description, needle)
                || contains_ignore_case(&result.solution, needle)
        },
        |result| PanelEntry::Forum(result.clone()),
    )
}

pub fn pdf_panel(results: &[PdfResult], keywords: &[String]) -> ResultPanel {
    group_by_keyword(
        results,
        keywords,
        |result, needle| {
            result
                .keyword
                .as_deref()
                .is_some_and(|keyword| contains_ignore_case(keyword, needle))
        },
        |result| PanelEntry::Pdf(result.clone()),
    )
}

fn group_by_keyword<T>(
    results: &[T],
    keywords: &[String],
    matches: impl Fn(&T, &str) -> bool,
    entry: impl Fn(&T) -> PanelEntry,
) -> ResultPanel {
    if results.is_empty() {
        return ResultPanel::Empty(no_results(&keywords.join(", ")));
    }

    let sections: Vec<KeywordSection> = keywords
        .iter()
        .filter_map(|keyword| {
            let entries: Vec<PanelEntry> = results
                .iter()
                .filter(|result| matches(*result, keyword.as_str()))
                .map(&entry)
                .collect();
            (!entries.is_empty()).then(|| KeywordSection {
                keyword: keyword.clone(),
                entries,
            })
        })
        .collect();

    match keywords {
        [only] if sections.is_empty() => ResultPanel::Empty(no_results(only)),
        _ => ResultPanel::Sections(sections),
    }
}

fn no_results(subject: &str) -> String {
    format!("No results found for \"{subject}\".")
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Relative navigation target for one PDF hit.
pub fn pdf_view_path(title: &str, page: &PageRef) -> String {
    format!("/view_pdf?title={}#page={page}", urlencoding::encode(title))
}

/// Removes the inline highlight markup the server wraps around matches.
pub fn strip_markup(text: &str) -> String {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    match TAGS.get_or_init(|| Regex::new(r"</?[a-zA-Z][^>]*>").ok()) {
        Some(tags) => tags.replace_all(text, "").into_owned(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forum(problem: &str, solution: &str) -> ForumResult {
        ForumResult {
            name: "Ana".into(),
            problem_description: problem.into(),
            solution: solution.into(),
            chapter: "2".into(),
            keyword: None,
            chapter_page: None,
        }
    }

    fn pdf(keyword: Option<&str>, page: u64) -> PdfResult {
        PdfResult {
            keyword: keyword.map(str::to_string),
            sentence: "text".into(),
            title: "manual.pdf".into(),
            page_number: PageRef::Number(page),
        }
    }

    fn keywords(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn forum_section_keeps_only_matching_entries() {
        let results = vec![
            forum("Endless LOOP in startup", "restart"),
            forum("jam", "clear the loop guard"),
            forum("noise", "tighten bolts"),
        ];

        let panel = forum_panel(&results, &keywords(&["loop"]));
        let ResultPanel::Sections(sections) = panel else {
            panic!("expected sections");
        };
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading(), "Results for \"loop\"");
        assert_eq!(
            sections[0].entries,
            vec![
                PanelEntry::Forum(results[0].clone()),
                PanelEntry::Forum(results[1].clone())
            ]
        );
    }

    #[test]
    fn sections_follow_keyword_order_and_skip_misses() {
        let results = vec![pdf(Some("valve"), 1), pdf(Some("Pump"), 2)];
        let panel = pdf_panel(&results, &keywords(&["pump", "seal", "valve"]));
        let ResultPanel::Sections(sections) = panel else {
            panic!("expected sections");
        };
        let order: Vec<_> = sections.iter().map(|section| section.keyword.as_str()).collect();
        assert_eq!(order, vec!["pump", "valve"]);
    }

    #[test]
    fn empty_results_mention_every_keyword() {
        let panel = forum_panel(&[], &keywords(&["a", "b"]));
        assert_eq!(panel, ResultPanel::Empty("No results found for \"a, b\".".into()));
    }

    #[test]
    fn single_unmatched_keyword_gets_a_message() {
        let panel = pdf_panel(&[pdf(None, 1)], &keywords(&["pump"]));
        assert_eq!(panel, ResultPanel::Empty("No results found for \"pump\".".into()));
    }

    #[test]
    fn several_unmatched_keywords_leave_the_panel_blank() {
        let panel = pdf_panel(&[pdf(Some("gear"), 1)], &keywords(&["pump", "seal"]));
        assert_eq!(panel, ResultPanel::Sections(Vec::new()));
    }

    #[test]
    fn gauge_is_clamped_with_two_decimals() {
        assert_eq!(gauge(42.5), (42.5, "42.50%".to_string()));
        assert_eq!(gauge(130.0), (100.0, "100.00%".to_string()));
        assert_eq!(gauge(-3.0).1, "0.00%");
        assert_eq!(reset_gauge().1, "0%");
    }

    #[test]
    fn title_options_start_with_placeholder() {
        let options = TitleOptions::from(&PdfTitleList(vec!["a.pdf".into()]));
        assert_eq!(options.options[0].value, "");
        assert_eq!(options.options[0].label, TITLE_PLACEHOLDER);
        assert_eq!(options.options[1].value, "a.pdf");
    }

    #[test]
    fn summary_formats_duration_to_three_decimals() {
        let summary = SearchSummary {
            duration_secs: 0.12345,
            num_results: 7,
        };
        assert_eq!(
            summary.to_string(),
            "Search Duration: 0.123 seconds\nResults Found: 7"
        );
    }

    #[test]
    fn pdf_link_encodes_title_and_keeps_page() {
        assert_eq!(
            pdf_view_path("Pump Manual.pdf", &PageRef::Number(12)),
            "/view_pdf?title=Pump%20Manual.pdf#page=12"
        );
    }

    #[test]
    fn highlight_tags_are_removed() {
        assert_eq!(strip_markup("a <b>loop</b> here"), "a loop here");
    }
}
