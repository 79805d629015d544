pub mod http;
pub mod realtime;

pub use http::HttpDocumentService;
pub use realtime::{EventStream, SocketIoChannel};
