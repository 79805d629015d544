use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::chat::ChatUpdate;
use crate::modal::ModalState;
use crate::protocol::ClientEvent;
use crate::render::{PanelKind, ResultPanel, SearchSummary, TitleOptions, TitleSelector};
use crate::{
    ClientError, ForumSubmission, SearchQuery, SearchResponse, StatusReply, TocEntry, UploadFile,
    UploadProgress, UploadReply,
};

/// HTTP endpoints of the document service.
#[async_trait]
pub trait DocumentService {
    /// Streams `file` as multipart data, reporting sent bytes on `progress`.
    async fn upload(
        &self,
        file: &UploadFile,
        progress: UnboundedSender<UploadProgress>,
    ) -> Result<UploadReply, ClientError>;

    /// A body carrying `error` comes back as [`ClientError::Server`].
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ClientError>;

    async fn remove_file(&self, file_name: &str) -> Result<StatusReply, ClientError>;

    async fn submit_forum_entry(
        &self,
        submission: &ForumSubmission,
    ) -> Result<StatusReply, ClientError>;

    async fn table_of_contents(&self) -> Result<Vec<TocEntry>, ClientError>;
}

/// Outbound half of the realtime channel.
#[async_trait]
pub trait EventChannel {
    async fn emit(&self, event: ClientEvent) -> Result<(), ClientError>;
}

/// Presentation surface the controller renders into.
pub trait View {
    fn set_gauge(&mut self, percent: f64, label: &str);

    fn set_title_options(&mut self, selector: TitleSelector, options: &TitleOptions);

    /// Blocking notice, the equivalent of an alert.
    fn notify(&mut self, message: &str);

    fn confirm(&mut self, prompt: &str) -> bool;

    fn show_search_summary(&mut self, summary: &SearchSummary);

    fn render_panel(&mut self, kind: PanelKind, panel: &ResultPanel);

    fn apply_chat(&mut self, update: &ChatUpdate);

    fn set_modal(&mut self, state: ModalState);

    fn navigate(&mut self, target: &str);

    fn open_window(&mut self, target: &str);

    fn show_table_of_contents(&mut self, entries: &[TocEntry]);
}
