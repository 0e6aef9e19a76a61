//! Per-connection session loop
//!
//! Reads frames from a joined member's connection and broadcasts them to the
//! rest of the channel, while a writer task drains the member's queue onto
//! the same connection. The loop works over any `futures` stream/sink pair,
//! so the transport stays outside this module.

use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::registry::{Channel, MemberId, RelayFrame};
use crate::stats::SessionStats;

use super::state::{CloseReason, SessionState};

/// How long a closing session waits for queued frames to be flushed
pub const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Why the session ended
    pub reason: CloseReason,
    /// Final statistics
    pub stats: SessionStats,
}

/// A joined member's session
pub struct Session {
    channel: Arc<Channel>,
    state: SessionState,
}

impl Session {
    /// Create a session for a member that has already joined `channel`
    pub fn new(channel: Arc<Channel>, member_id: MemberId) -> Self {
        let state = SessionState::new(channel.id().clone(), member_id);
        Self { channel, state }
    }

    /// Member id of this session
    pub fn member_id(&self) -> &MemberId {
        &self.state.member_id
    }

    /// Run until the connection ends
    ///
    /// `queue` is the receiving half of the handle the member joined with.
    /// On return the member has left the channel; this happens exactly once,
    /// whatever ended the session.
    pub async fn run<R, E, W>(
        mut self,
        mut inbound: R,
        outbound: W,
        queue: mpsc::Receiver<RelayFrame>,
    ) -> SessionSummary
    where
        R: Stream<Item = Result<RelayFrame, E>> + Unpin,
        E: std::fmt::Display,
        W: Sink<RelayFrame> + Unpin + Send + 'static,
        W::Error: std::fmt::Display + Send,
    {
        tracing::debug!(
            channel = %self.state.channel_id,
            member = %self.state.member_id,
            "Session started"
        );

        let mut writer = tokio::spawn(write_loop(outbound, queue));
        let mut writer_result = None;

        let reason = loop {
            tokio::select! {
                next = inbound.next() => match next {
                    Some(Ok(frame)) => {
                        self.state.on_frame(frame.len());
                        self.channel.broadcast(&self.state.member_id, frame).await;
                    }
                    Some(Err(e)) => break CloseReason::ReadError(e.to_string()),
                    None => break CloseReason::RemoteClosed,
                },
                sent = &mut writer => {
                    writer_result = Some(sent);
                    break CloseReason::WriteFailed;
                }
            }
        };

        self.state.close(reason.clone());
        self.channel.leave(&self.state.member_id).await;

        // Leaving dropped the last queue sender, so the writer flushes and exits.
        let frames_sent = match writer_result {
            Some(result) => result.unwrap_or(0),
            None => match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await {
                Ok(result) => result.unwrap_or(0),
                Err(_) => {
                    writer.abort();
                    tracing::debug!(
                        member = %self.state.member_id,
                        "Writer did not drain in time, aborted"
                    );
                    0
                }
            },
        };

        let stats = self.state.stats(frames_sent);

        tracing::info!(
            channel = %self.state.channel_id,
            member = %self.state.member_id,
            reason = %reason,
            frames_received = stats.frames_received,
            frames_sent = stats.frames_sent,
            duration_ms = stats.duration.as_millis() as u64,
            "Session closed"
        );

        SessionSummary { reason, stats }
    }
}

/// Drain a member's queue onto its connection, returning the frames written
async fn write_loop<W>(mut outbound: W, mut queue: mpsc::Receiver<RelayFrame>) -> u64
where
    W: Sink<RelayFrame> + Unpin,
    W::Error: std::fmt::Display,
{
    let mut sent = 0;

    while let Some(frame) = queue.recv().await {
        if let Err(e) = outbound.send(frame).await {
            tracing::debug!(error = %e, "Connection write failed");
            return sent;
        }
        sent += 1;
    }

    let _ = outbound.close().await;
    sent
}
