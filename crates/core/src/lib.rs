pub mod chat;
pub mod config;
pub mod controller;
pub mod error;
pub mod modal;
pub mod models;
pub mod protocol;
pub mod render;
pub mod services;
pub mod traits;

pub use chat::{ChatSession, ChatUpdate, ParagraphState, TranscriptEntry};
pub use config::{ClientConfig, RetryPolicy, DEFAULT_BASE_URL};
pub use controller::{ClientController, Intent, Outcome};
pub use error::ClientError;
pub use modal::{ModalState, UploadModal};
pub use models::{
    parse_keywords, ChatMessage, ForumResult, ForumSubmission, PageRef, PdfResult, PdfTitleList,
    RemoveFileRequest, SearchQuery, SearchResponse, SearchResults, StatusReply, TocEntry,
    UploadFile, UploadProgress, UploadReply,
};
pub use protocol::{ClientEvent, ServerEvent};
pub use render::{
    KeywordSection, PanelEntry, PanelKind, ResultPanel, SearchSummary, SelectOption,
    TitleOptions, TitleSelector,
};
pub use services::{EventStream, HttpDocumentService, SocketIoChannel};
pub use traits::{DocumentService, EventChannel, View};
