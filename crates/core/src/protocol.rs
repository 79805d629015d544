//! Text framing for the realtime channel: Socket.IO packets carried inside
//! Engine.IO v4 packets over a WebSocket.

use serde_json::{json, Value};

use crate::{ChatMessage, ClientError, PdfTitleList};

/// Sent after the open packet to join the default namespace.
pub const CONNECT_FRAME: &str = "40";
pub const PONG_FRAME: &str = "3";

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Value),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, ClientError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ClientError::Channel("empty engine frame".to_string()))?;
        let body = chars.as_str();

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(body)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping(body.to_string())),
            '3' => Ok(EnginePacket::Pong(body.to_string())),
            '4' => Ok(EnginePacket::Message(body.to_string())),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(ClientError::Channel(format!(
                "unknown engine packet type {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        ack_id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
    /// Acks and binary packets; the client never requests either.
    Unsupported(char),
}

impl SocketPacket {
    pub fn decode(payload: &str) -> Result<Self, ClientError> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .ok_or_else(|| ClientError::Channel("empty socket packet".to_string()))?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Ok(SocketPacket::Unsupported(kind));
        }

        let mut namespace = "/".to_string();
        if rest.starts_with('/') {
            let end = rest.find(',').unwrap_or(rest.len());
            namespace = rest[..end].to_string();
            rest = rest.get(end + 1..).unwrap_or("");
        }

        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let ack_id = if digits > 0 {
            rest[..digits].parse::<u64>().ok()
        } else {
            None
        };
        rest = &rest[digits..];

        let data = if rest.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(rest)?)
        };

        match kind {
            '0' => Ok(SocketPacket::Connect { namespace, data }),
            '1' => Ok(SocketPacket::Disconnect { namespace }),
            '2' => {
                let mut items = match data {
                    Some(Value::Array(items)) => items,
                    _ => {
                        return Err(ClientError::Channel(
                            "event packet without an argument array".to_string(),
                        ))
                    }
                };
                if items.is_empty() {
                    return Err(ClientError::Channel("event packet without a name".to_string()));
                }
                let name = match items.remove(0) {
                    Value::String(name) => name,
                    other => {
                        return Err(ClientError::Channel(format!(
                            "event name is not a string: {other}"
                        )))
                    }
                };
                Ok(SocketPacket::Event {
                    namespace,
                    ack_id,
                    name,
                    args: items,
                })
            }
            '4' => Ok(SocketPacket::ConnectError { namespace, data }),
            other => Ok(SocketPacket::Unsupported(other)),
        }
    }
}

/// Events the server pushes.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Progress(f64),
    PdfTitles(PdfTitleList),
    ChatToken(String),
}

impl ServerEvent {
    /// `Ok(None)` for event names the client does not handle.
    pub fn from_event(name: &str, args: &[Value]) -> Result<Option<Self>, ClientError> {
        let first = args.first();
        let event = match name {
            "progress" => {
                let progress = first
                    .and_then(|payload| payload.get("progress"))
                    .and_then(Value::as_f64)
                    .ok_or_else(|| malformed(name))?;
                ServerEvent::Progress(progress)
            }
            "update_pdf_titles" => {
                let titles = match first {
                    Some(Value::Array(_)) => first,
                    Some(Value::Object(payload)) => payload.get("titles"),
                    _ => None,
                }
                .cloned()
                .ok_or_else(|| malformed(name))?;
                ServerEvent::PdfTitles(serde_json::from_value(titles)?)
            }
            "receive_message" => {
                let message = first
                    .and_then(|payload| payload.get("message"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(name))?;
                ServerEvent::ChatToken(message.to_string())
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn malformed(name: &str) -> ClientError {
    ClientError::Channel(format!("malformed {name} payload"))
}

/// Events the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    RefreshPdfTitles,
    SendMessage(ChatMessage),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::RefreshPdfTitles => "update_pdf_titles",
            ClientEvent::SendMessage(_) => "send_message",
        }
    }

    /// Full Engine.IO text frame for this event.
    pub fn encode(&self) -> Result<String, ClientError> {
        let args = match self {
            ClientEvent::RefreshPdfTitles => json!([self.name()]),
            ClientEvent::SendMessage(message) => json!([self.name(), message]),
        };
        Ok(format!("42{}", serde_json::to_string(&args)?))
    }
}
