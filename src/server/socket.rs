//! WebSocket adapters
//!
//! Converts between axum WebSocket messages and relay frames so the session
//! loop can run over a split socket.

use axum::extract::ws::Message;
use futures::{future, Sink, SinkExt, Stream, StreamExt};

use crate::registry::{FrameKind, RelayFrame};

/// Convert an inbound WebSocket message to a relay frame
///
/// Control messages are not relayed.
pub fn into_frame(message: Message) -> Option<RelayFrame> {
    match message {
        Message::Text(text) => Some(RelayFrame::text(text.as_str())),
        Message::Binary(data) => Some(RelayFrame::binary(data)),
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
    }
}

/// Convert a relay frame to an outbound WebSocket message
pub fn into_message(frame: RelayFrame) -> Message {
    match frame.kind {
        FrameKind::Text => match std::str::from_utf8(&frame.data) {
            Ok(text) => Message::Text(text.into()),
            Err(_) => Message::Binary(frame.data.clone()),
        },
        FrameKind::Binary => Message::Binary(frame.data),
    }
}

/// Adapt the read half of a socket into a stream of relay frames
///
/// The stream ends at the first close message.
pub fn inbound<S>(stream: S) -> impl Stream<Item = Result<RelayFrame, axum::Error>> + Unpin + Send
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin + Send,
{
    stream
        .take_while(|message| future::ready(!matches!(message, Ok(Message::Close(_)))))
        .filter_map(|message| future::ready(message.map(into_frame).transpose()))
}

/// Adapt the write half of a socket into a sink of relay frames
pub fn outbound<S>(sink: S) -> impl Sink<RelayFrame, Error = axum::Error> + Unpin + Send + 'static
where
    S: Sink<Message, Error = axum::Error> + Unpin + Send + 'static,
{
    sink.with(|frame: RelayFrame| future::ready(Ok::<_, axum::Error>(into_message(frame))))
}
