/// Where the next assistant token goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphState {
    AwaitingNewParagraph,
    AppendingToCurrent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    User(String),
    Assistant(String),
}

/// Incremental change the view applies to its transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    /// Also clears the input field.
    UserLine(String),
    /// Opens a new assistant paragraph whose first text is `text`.
    StartAssistant(String),
    AppendAssistant(String),
}

/// Paragraph-boundary bookkeeping for one chat transcript.
///
/// Only one assistant reply is assumed in flight: every token that arrives
/// after a user message belongs to that reply until the next user message.
#[derive(Debug, Clone)]
pub struct ChatSession {
    state: ParagraphState,
    transcript: Vec<TranscriptEntry>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            state: ParagraphState::AwaitingNewParagraph,
            transcript: Vec::new(),
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParagraphState {
        self.state
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn on_user_send(&mut self, message: &str) -> ChatUpdate {
        self.transcript.push(TranscriptEntry::User(message.to_string()));
        self.state = ParagraphState::AwaitingNewParagraph;
        ChatUpdate::UserLine(message.to_string())
    }

    pub fn on_token(&mut self, token: &str) -> ChatUpdate {
        let text = format!("{token} ");

        // Only `on_user_send` pushes other entries, and it also resets the
        // state, so while appending the open paragraph is the last entry.
        if self.state == ParagraphState::AppendingToCurrent {
            if let Some(TranscriptEntry::Assistant(current)) = self.transcript.last_mut() {
                current.push_str(&text);
                return ChatUpdate::AppendAssistant(text);
            }
        }

        self.transcript.push(TranscriptEntry::Assistant(text.clone()));
        self.state = ParagraphState::AppendingToCurrent;
        ChatUpdate::StartAssistant(text)
    }
}
