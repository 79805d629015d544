use std::io::{self, BufRead, Write};

use docsearch_client_core::render::{pdf_view_path, strip_markup};
use docsearch_client_core::{
    ChatUpdate, ModalState, PanelEntry, PanelKind, ResultPanel, SearchSummary, TitleOptions,
    TitleSelector, TocEntry, View,
};
use tracing::debug;

/// Renders controller output as plain lines on stdout.
pub struct TerminalView {
    base_url: String,
    assume_yes: bool,
    assistant_line_open: bool,
}

impl TerminalView {
    pub fn new(base_url: impl Into<String>, assume_yes: bool) -> Self {
        Self {
            base_url: base_url.into(),
            assume_yes,
            assistant_line_open: false,
        }
    }

    fn close_assistant_line(&mut self) {
        if self.assistant_line_open {
            println!();
            self.assistant_line_open = false;
        }
    }
}

impl View for TerminalView {
    fn set_gauge(&mut self, percent: f64, label: &str) {
        print!("\rprogress: {label:>8}");
        if percent >= 100.0 || percent == 0.0 {
            println!();
        }
        let _ = io::stdout().flush();
    }

    fn set_title_options(&mut self, selector: TitleSelector, options: &TitleOptions) {
        let name = match selector {
            TitleSelector::SearchFilter => "search filter",
            TitleSelector::RemovalTarget => "removal target",
        };
        let titles: Vec<&str> = options
            .options
            .iter()
            .filter(|option| !option.value.is_empty())
            .map(|option| option.label.as_str())
            .collect();
        println!("{name} titles: [{}]", titles.join(", "));
    }

    fn notify(&mut self, message: &str) {
        self.close_assistant_line();
        println!("{message}");
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn show_search_summary(&mut self, summary: &SearchSummary) {
        println!("{summary}");
    }

    fn render_panel(&mut self, kind: PanelKind, panel: &ResultPanel) {
        match kind {
            PanelKind::Forum => println!("\n== Traible Knowledge Forum =="),
            PanelKind::Pdf => println!("\n== PDF Results =="),
        }

        let sections = match panel {
            ResultPanel::Empty(message) => {
                println!("{message}");
                return;
            }
            ResultPanel::Sections(sections) => sections,
        };

        for section in sections {
            println!("\n{}", section.heading());
            for entry in &section.entries {
                match entry {
                    PanelEntry::Forum(result) => {
                        println!("  Submitted by: {}", result.name);
                        println!("  Problem Description: {}", strip_markup(&result.problem_description));
                        println!("  Solution: {}", strip_markup(&result.solution));
                        println!("  Chapter: {}", result.chapter);
                    }
                    PanelEntry::Pdf(result) => {
                        println!("  {}", strip_markup(&result.sentence));
                        println!("  PDF Title: {}", result.title);
                        println!("  Page Number: {}", result.page_number);
                        println!(
                            "  -> {}{}",
                            self.base_url.trim_end_matches('/'),
                            pdf_view_path(&result.title, &result.page_number)
                        );
                    }
                }
                println!();
            }
        }
    }

    fn apply_chat(&mut self, update: &ChatUpdate) {
        match update {
            ChatUpdate::UserLine(text) => {
                self.close_assistant_line();
                println!("You: {text}");
            }
            ChatUpdate::StartAssistant(text) => {
                self.close_assistant_line();
                print!("AI: {text}");
                self.assistant_line_open = true;
            }
            ChatUpdate::AppendAssistant(text) => {
                print!("{text}");
                self.assistant_line_open = true;
            }
        }
        let _ = io::stdout().flush();
    }

    fn set_modal(&mut self, state: ModalState) {
        debug!(?state, "upload dialog");
        if state == ModalState::Mandatory {
            println!("No documents are indexed yet; upload a PDF to continue.");
        }
    }

    fn navigate(&mut self, target: &str) {
        println!("open: {target}");
    }

    fn open_window(&mut self, target: &str) {
        println!("open in new window: {target}");
    }

    fn show_table_of_contents(&mut self, entries: &[TocEntry]) {
        if entries.is_empty() {
            println!("no table of contents");
        }
        for entry in entries {
            let indent = "  ".repeat(entry.level.saturating_sub(1) as usize);
            println!("{indent}{} .... {}", entry.title, entry.page);
        }
    }
}
