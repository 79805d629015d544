use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, warn};

use crate::chat::ChatSession;
use crate::modal::{ModalState, UploadModal};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::render::{
    forum_panel, gauge, pdf_panel, pdf_view_path, reset_gauge, PanelKind, SearchSummary,
    TitleOptions, TitleSelector,
};
use crate::traits::{DocumentService, EventChannel, View};
use crate::{
    ChatMessage, ClientError, ForumSubmission, PdfResult, SearchQuery, StatusReply, UploadFile,
    UploadProgress, UploadReply,
};

pub const MISSING_FILE: &str = "You must upload a file before proceeding.";
pub const UPLOAD_DONE: &str = "File uploaded successfully!";
pub const UPLOAD_FAILED: &str = "Failed to upload file.";
pub const MISSING_KEYWORDS: &str = "Please enter at least one keyword to search.";
pub const MISSING_REMOVAL_TARGET: &str = "Please select a file to remove.";
pub const REMOVAL_FAILED: &str = "An error occurred while removing the file.";
pub const INCOMPLETE_FORUM_ENTRY: &str = "Please fill in all fields.";
pub const FORUM_SUBMIT_FAILED: &str = "An error occurred while submitting the entry.";
pub const TOC_FAILED: &str = "Failed to load the table of contents.";
pub const CHAT_SEND_FAILED: &str = "Message could not be sent.";

/// Everything a user can ask the client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    PageLoaded { upload_required: bool },
    ShowUploadModal,
    DismissModal,
    ChooseFile(UploadFile),
    Upload,
    /// Raw keyword field contents, as typed.
    Search(String),
    /// Selecting a title re-runs the last keyword input with the new filter.
    SelectPdfTitle(String),
    /// Keyword input and title filter set together, searched once.
    FilteredSearch { keywords: String, pdf_title: String },
    RemoveFile(String),
    SendChat(String),
    OpenForum,
    OpenPdf(PdfResult),
    SubmitForumEntry(ForumSubmission),
    LoadTableOfContents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// Stopped before any request went out.
    Rejected,
    Failed,
}

pub struct ClientController<S, C, V>
where
    S: DocumentService,
    C: EventChannel,
    V: View,
{
    service: S,
    channel: C,
    view: V,
    base_url: String,
    chat: ChatSession,
    modal: UploadModal,
    chosen_file: Option<UploadFile>,
    keyword_input: String,
    pdf_title: String,
    events: Option<UnboundedReceiver<ServerEvent>>,
}

impl<S, C, V> ClientController<S, C, V>
where
    S: DocumentService + Sync,
    C: EventChannel + Sync,
    V: View,
{
    pub fn new(service: S, channel: C, view: V, base_url: impl Into<String>) -> Self {
        Self {
            service,
            channel,
            view,
            base_url: base_url.into(),
            chat: ChatSession::new(),
            modal: UploadModal::default(),
            chosen_file: None,
            keyword_input: String::new(),
            pdf_title: String::new(),
            events: None,
        }
    }

    /// Hands the controller the server push stream so pushes that arrive
    /// while a request is in flight are applied immediately.
    pub fn attach_events(&mut self, events: UnboundedReceiver<ServerEvent>) {
        self.events = Some(events);
    }

    /// Next server push, or `None` once the stream is over or was never attached.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn modal_state(&self) -> ModalState {
        self.modal.state()
    }

    pub async fn dispatch(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::PageLoaded { upload_required } => {
                if upload_required {
                    let state = self.modal.show(true);
                    self.view.set_modal(state);
                }
                Outcome::Done
            }
            Intent::ShowUploadModal => {
                let state = self.modal.show(false);
                self.view.set_modal(state);
                Outcome::Done
            }
            Intent::DismissModal => {
                if let Some(state) = self.modal.dismiss() {
                    self.view.set_modal(state);
                }
                Outcome::Done
            }
            Intent::ChooseFile(file) => {
                self.chosen_file = Some(file);
                if let Some(state) = self.modal.file_chosen() {
                    self.view.set_modal(state);
                }
                Outcome::Done
            }
            Intent::Upload => self.upload().await,
            Intent::Search(raw_keywords) => {
                self.keyword_input = raw_keywords;
                self.search().await
            }
            Intent::SelectPdfTitle(title) => {
                self.pdf_title = title;
                self.search().await
            }
            Intent::FilteredSearch {
                keywords,
                pdf_title,
            } => {
                self.keyword_input = keywords;
                self.pdf_title = pdf_title;
                self.search().await
            }
            Intent::RemoveFile(selection) => self.remove_file(&selection).await,
            Intent::SendChat(text) => self.send_chat(text).await,
            Intent::OpenForum => {
                let target = self.absolute("/forum");
                self.view.open_window(&target);
                Outcome::Done
            }
            Intent::OpenPdf(result) => {
                let target = self.absolute(&pdf_view_path(&result.title, &result.page_number));
                self.view.navigate(&target);
                Outcome::Done
            }
            Intent::SubmitForumEntry(submission) => self.submit_forum_entry(&submission).await,
            Intent::LoadTableOfContents => match self.service.table_of_contents().await {
                Ok(entries) => {
                    self.view.show_table_of_contents(&entries);
                    Outcome::Done
                }
                Err(error) => {
                    error!(%error, "table of contents request failed");
                    self.view.notify(TOC_FAILED);
                    Outcome::Failed
                }
            },
        }
    }

    /// Applies one server push. Called in delivery order.
    pub fn handle_event(&mut self, event: ServerEvent) {
        apply_event(&mut self.view, &mut self.chat, &mut self.pdf_title, event);
    }

    async fn upload(&mut self) -> Outcome {
        let Some(file) = self.chosen_file.clone() else {
            self.view.notify(MISSING_FILE);
            return Outcome::Rejected;
        };

        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let reply = {
            let request = self.service.upload(&file, progress_tx);
            tokio::pin!(request);
            loop {
                tokio::select! {
                    biased;
                    Some(event) = next_pushed(&mut self.events) => {
                        apply_event(&mut self.view, &mut self.chat, &mut self.pdf_title, event)
                    }
                    Some(progress) = progress_rx.recv() => show_progress(&mut self.view, progress),
                    reply = &mut request => break reply,
                }
            }
        };
        // Pushes queued before the reply belong to this upload.
        while let Some(event) = self.events.as_mut().and_then(|events| events.try_recv().ok()) {
            self.handle_event(event);
        }

        match reply {
            Ok(UploadReply::Accepted) => {
                let state = self.modal.hide();
                self.view.set_modal(state);
                let (value, label) = reset_gauge();
                self.view.set_gauge(value, &label);
                self.view.notify(UPLOAD_DONE);
                Outcome::Done
            }
            Ok(UploadReply::Rejected(message)) => {
                self.view.notify(message.as_deref().unwrap_or(UPLOAD_FAILED));
                Outcome::Failed
            }
            Ok(UploadReply::Failed(status)) => {
                warn!(status, path = %file.path.display(), "upload rejected");
                self.view.notify(UPLOAD_FAILED);
                Outcome::Failed
            }
            Err(error) => {
                error!(%error, path = %file.path.display(), "upload failed");
                self.view.notify(UPLOAD_FAILED);
                Outcome::Failed
            }
        }
    }

    async fn search(&mut self) -> Outcome {
        let Some(query) = SearchQuery::from_input(&self.keyword_input, &self.pdf_title) else {
            self.view.notify(MISSING_KEYWORDS);
            return Outcome::Rejected;
        };

        match self.service.search(&query).await {
            Ok(response) => {
                self.view.show_search_summary(&SearchSummary::from(&response));
                let forum = forum_panel(&response.results.forum, &query.keywords);
                let pdf = pdf_panel(&response.results.pdf, &query.keywords);
                self.view.render_panel(PanelKind::Forum, &forum);
                self.view.render_panel(PanelKind::Pdf, &pdf);
                Outcome::Done
            }
            Err(ClientError::Server(message)) => {
                self.view.notify(&message);
                Outcome::Failed
            }
            Err(error) => {
                error!(%error, "search request failed");
                Outcome::Failed
            }
        }
    }

    async fn remove_file(&mut self, selection: &str) -> Outcome {
        if selection.is_empty() {
            self.view.notify(MISSING_REMOVAL_TARGET);
            return Outcome::Rejected;
        }
        let prompt = format!("Are you sure you want to remove the file: \"{selection}\"?");
        if !self.view.confirm(&prompt) {
            return Outcome::Rejected;
        }

        match self.service.remove_file(selection).await {
            Ok(reply) => {
                let removed = self.show_status_reply(reply);
                if removed {
                    if let Err(error) = self.channel.emit(ClientEvent::RefreshPdfTitles).await {
                        warn!(%error, "could not request a title refresh");
                    }
                    Outcome::Done
                } else {
                    Outcome::Failed
                }
            }
            Err(error) => {
                error!(%error, file_name = selection, "remove request failed");
                self.view.notify(REMOVAL_FAILED);
                Outcome::Failed
            }
        }
    }

    async fn send_chat(&mut self, text: String) -> Outcome {
        if text.trim().is_empty() {
            return Outcome::Rejected;
        }

        let event = ClientEvent::SendMessage(ChatMessage {
            message: text.clone(),
        });
        let sent = self.channel.emit(event).await;

        let update = self.chat.on_user_send(&text);
        self.view.apply_chat(&update);
        match sent {
            Ok(()) => Outcome::Done,
            Err(error) => {
                error!(%error, "chat message not sent");
                self.view.notify(CHAT_SEND_FAILED);
                Outcome::Failed
            }
        }
    }

    async fn submit_forum_entry(&mut self, submission: &ForumSubmission) -> Outcome {
        if !submission.is_complete() {
            self.view.notify(INCOMPLETE_FORUM_ENTRY);
            return Outcome::Rejected;
        }

        match self.service.submit_forum_entry(submission).await {
            Ok(reply) => {
                if self.show_status_reply(reply) {
                    Outcome::Done
                } else {
                    Outcome::Failed
                }
            }
            Err(error) => {
                error!(%error, "forum submission failed");
                self.view.notify(FORUM_SUBMIT_FAILED);
                Outcome::Failed
            }
        }
    }

    /// Returns true for a `message` reply.
    fn show_status_reply(&mut self, reply: StatusReply) -> bool {
        match reply {
            StatusReply {
                message: Some(message),
                ..
            } => {
                self.view.notify(&message);
                true
            }
            StatusReply {
                error: Some(error), ..
            } => {
                self.view.notify(&format!("Error: {error}"));
                false
            }
            StatusReply { .. } => {
                warn!("reply carried neither message nor error");
                false
            }
        }
    }

    fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn apply_event<V: View>(
    view: &mut V,
    chat: &mut ChatSession,
    pdf_title: &mut String,
    event: ServerEvent,
) {
    match event {
        ServerEvent::Progress(percent) => {
            let (value, label) = gauge(percent);
            view.set_gauge(value, &label);
        }
        ServerEvent::PdfTitles(titles) => {
            let options = TitleOptions::from(&titles);
            view.set_title_options(TitleSelector::SearchFilter, &options);
            view.set_title_options(TitleSelector::RemovalTarget, &options);
            // Rebuilt selectors fall back to the placeholder.
            pdf_title.clear();
        }
        ServerEvent::ChatToken(token) => {
            let update = chat.on_token(&token);
            view.apply_chat(&update);
        }
    }
}

/// Never resolves without an attached stream, so `select!` just skips it.
async fn next_pushed(events: &mut Option<UnboundedReceiver<ServerEvent>>) -> Option<ServerEvent> {
    match events {
        Some(events) => events.recv().await,
        None => std::future::pending().await,
    }
}

fn show_progress<V: View>(view: &mut V, progress: UploadProgress) {
    if let Some(percent) = progress.percent() {
        let (value, label) = gauge(percent);
        view.set_gauge(value, &label);
    }
}
