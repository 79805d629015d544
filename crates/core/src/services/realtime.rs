use async_trait::async_trait;
use futures_util::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};

use crate::protocol::{
    ClientEvent, EnginePacket, ServerEvent, SocketPacket, CONNECT_FRAME, PONG_FRAME,
};
use crate::traits::EventChannel;
use crate::{ClientConfig, ClientError};

/// Server events in delivery order. Ends when the connection closes.
pub type EventStream = UnboundedReceiver<ServerEvent>;

/// Handle to the realtime connection. Cloning shares the same socket.
#[derive(Debug, Clone)]
pub struct SocketIoChannel {
    outbound: UnboundedSender<String>,
}

impl SocketIoChannel {
    /// Opens the WebSocket, completes the Engine.IO handshake, joins the
    /// default namespace, and starts the reader and writer tasks.
    pub async fn connect(config: &ClientConfig) -> Result<(Self, EventStream), ClientError> {
        let url = config.socket_url()?;
        let (socket, _) = tokio::time::timeout(config.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| ClientError::Timeout(url.to_string()))??;
        let (mut sink, mut source) = socket.split();

        let handshake = loop {
            match source.next().await {
                Some(Ok(WsMessage::Text(frame))) => {
                    if let EnginePacket::Open(handshake) = EnginePacket::decode(&frame)? {
                        break handshake;
                    }
                }
                Some(Ok(_)) => continue,
                Some(Err(error)) => return Err(error.into()),
                None => return Err(ClientError::ChannelClosed),
            }
        };
        info!(
            url = %url,
            sid = handshake.get("sid").and_then(|sid| sid.as_str()).unwrap_or_default(),
            "realtime channel open"
        );

        sink.send(WsMessage::Text(CONNECT_FRAME.to_string())).await?;

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (events_tx, events) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(error) = sink.send(WsMessage::Text(frame)).await {
                    warn!(%error, "realtime write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });
        tokio::spawn(read_loop(source, outbound.clone(), events_tx));

        Ok((Self { outbound }, events))
    }

    /// A handle with nothing behind it: every emit fails with
    /// [`ClientError::ChannelClosed`] and the event stream is already over.
    pub fn detached() -> (Self, EventStream) {
        let (outbound, _) = mpsc::unbounded_channel();
        let (_, events) = mpsc::unbounded_channel();
        (Self { outbound }, events)
    }
}

#[async_trait]
impl EventChannel for SocketIoChannel {
    async fn emit(&self, event: ClientEvent) -> Result<(), ClientError> {
        let frame = event.encode()?;
        debug!(event = event.name(), "emitting");
        self.outbound
            .send(frame)
            .map_err(|_| ClientError::ChannelClosed)
    }
}

async fn read_loop<S>(
    mut source: S,
    outbound: UnboundedSender<String>,
    events: UnboundedSender<ServerEvent>,
) where
    S: Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(message) = source.next().await {
        let frame = match message {
            Ok(WsMessage::Text(frame)) => frame,
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(error) => {
                warn!(%error, "realtime read failed");
                break;
            }
        };

        match route_frame(&frame, &outbound) {
            Ok(Some(event)) => {
                if events.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(ClientError::ChannelClosed) => break,
            Err(error) => warn!(%error, frame = %frame, "dropping realtime frame"),
        }
    }
    info!("realtime channel closed");
}

/// Answers pings and turns event frames into [`ServerEvent`]s.
pub(crate) fn route_frame(
    frame: &str,
    outbound: &UnboundedSender<String>,
) -> Result<Option<ServerEvent>, ClientError> {
    match EnginePacket::decode(frame)? {
        EnginePacket::Ping(_) => {
            outbound
                .send(PONG_FRAME.to_string())
                .map_err(|_| ClientError::ChannelClosed)?;
            Ok(None)
        }
        EnginePacket::Message(payload) => match SocketPacket::decode(&payload)? {
            SocketPacket::Event { name, args, .. } => ServerEvent::from_event(&name, &args),
            SocketPacket::ConnectError { data, .. } => Err(ClientError::Channel(format!(
                "namespace connection refused: {}",
                data.unwrap_or_default()
            ))),
            SocketPacket::Disconnect { .. } => Err(ClientError::ChannelClosed),
            SocketPacket::Connect { .. } | SocketPacket::Unsupported(_) => Ok(None),
        },
        EnginePacket::Close => Err(ClientError::ChannelClosed),
        EnginePacket::Open(_) | EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PdfTitleList;

    #[test]
    fn ping_is_answered_with_pong() {
        let (outbound, mut frames) = mpsc::unbounded_channel();
        assert_eq!(route_frame("2", &outbound).unwrap(), None);
        assert_eq!(frames.try_recv().unwrap(), "3");
    }

    #[test]
    fn event_frames_become_server_events() {
        let (outbound, _frames) = mpsc::unbounded_channel();
        let event = route_frame(r#"42["update_pdf_titles",["a.pdf"]]"#, &outbound).unwrap();
        assert_eq!(
            event,
            Some(ServerEvent::PdfTitles(PdfTitleList(vec!["a.pdf".into()])))
        );

        let token = route_frame(r#"42["receive_message",{"message":"Hello"}]"#, &outbound).unwrap();
        assert_eq!(token, Some(ServerEvent::ChatToken("Hello".into())));
    }

    #[test]
    fn server_disconnect_closes_the_channel() {
        let (outbound, _frames) = mpsc::unbounded_channel();
        assert!(matches!(
            route_frame("41", &outbound),
            Err(ClientError::ChannelClosed)
        ));
        assert!(matches!(route_frame("1", &outbound), Err(ClientError::ChannelClosed)));
    }

    #[tokio::test]
    async fn detached_channel_is_closed_both_ways() {
        let (channel, mut events) = SocketIoChannel::detached();
        assert!(matches!(
            channel.emit(ClientEvent::RefreshPdfTitles).await,
            Err(ClientError::ChannelClosed)
        ));
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test]
    async fn emit_queues_encoded_frames_in_order() {
        let (outbound, mut frames) = mpsc::unbounded_channel();
        let channel = SocketIoChannel { outbound };
        channel.emit(ClientEvent::RefreshPdfTitles).await.unwrap();
        channel
            .emit(ClientEvent::SendMessage(crate::ChatMessage {
                message: "hi".into(),
            }))
            .await
            .unwrap();

        assert_eq!(frames.recv().await.unwrap(), r#"42["update_pdf_titles"]"#);
        assert_eq!(
            frames.recv().await.unwrap(),
            r#"42["send_message",{"message":"hi"}]"#
        );
    }
}
