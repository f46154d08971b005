//! Chat turn orchestration.
//!
//! One turn moves through: validate input → resolve session → persist user
//! message → generate reply → persist assistant message → commit the
//! streaming response envelope → stream frames → complete.  Everything up
//! to the envelope can fail with a normal status code; once headers are
//! out, failures are absorbed into a single terminal fallback frame
//! because the status can no longer change.
//!
//! The assistant message is always persisted in full before the first
//! frame is emitted: the stored record is authoritative no matter what the
//! client actually received.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::auth::Principal;
use crate::entities::{ChatStore, Sender, SessionStore};
use crate::error::ServerError;
use crate::generator::ReplyContext;
use crate::schemas::chat::ChatRequest;
use crate::state::AppState;
use crate::stream::{segment, Frame, PacingPolicy, RelatedLink};

/// Upper bound on an inbound message, checked before any row is written.
pub(crate) const MAX_MESSAGE_BYTES: usize = 4 * 1024;

/// Generic apology for failures after the commit point; the persisted
/// reply (if any) remains the durable record.
const STREAM_APOLOGY: &str =
    "Sorry, this reply could not be delivered in full. It has been saved to your history.";

/// Why frame delivery stopped early.
#[derive(Debug)]
pub(crate) enum PumpError {
    /// The client went away; abandon everything, write nothing further.
    ClientGone,
    /// A frame could not be produced; the apology frame is still owed.
    Frame(String),
}

/// Drive one authenticated chat turn end to end, returning the committed
/// streaming response.
pub async fn run_chat(
    state: Arc<AppState>,
    principal: Principal,
    req: ChatRequest,
) -> Result<Response, ServerError> {
    let message = req.message.trim().to_owned();
    if message.is_empty() {
        return Err(ServerError::Validation("message must not be empty".into()));
    }
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(ServerError::Validation(format!(
            "message exceeds {MAX_MESSAGE_BYTES} bytes"
        )));
    }

    let session_id = state
        .store
        .resolve_or_create(principal.id, req.session_id)
        .await?;
    info!(principal_id = principal.id, session_id, "session resolved");

    state
        .store
        .append_message(session_id, Sender::User, &message)
        .await?;
    info!(principal_id = principal.id, session_id, "user message persisted");

    let ctx = ReplyContext {
        display_name: display_name(&principal.email),
        role: principal.role,
    };
    // Generation failures never propagate: the generator substitutes a
    // bounded fallback, so there is always text to persist and stream.
    let reply = state.generator.generate(&message, &ctx);
    info!(session_id, reply_len = reply.len(), "reply generated");

    let links: Vec<RelatedLink> = Vec::new();

    state
        .store
        .append_message(session_id, Sender::Assistant, &reply)
        .await?;
    info!(principal_id = principal.id, session_id, "assistant message persisted");

    // ── Commit point ─────────────────────────────────────────────────────────
    // Returning this response sends the envelope; from here on, errors can
    // only be reported inside the stream itself.  The producer runs in its
    // own task so pacing sleeps suspend only this turn.
    let (tx, rx) = mpsc::channel::<String>(16);
    let pacing = state.pacing;
    tokio::spawn(async move {
        info!(session_id, "stream started");
        let producer_tx = tx.clone();
        let producer = async move { pump_frames(&producer_tx, &reply, &links, &pacing).await };
        deliver(tx, producer, session_id).await;
    });

    let body = Body::from_stream(
        ReceiverStream::new(rx).map(|line| Ok::<_, Infallible>(Bytes::from(line))),
    );
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok(response)
}

fn display_name(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_owned()
}

/// Run a frame producer to completion, emitting the fallback final frame
/// if it fails while the client is still connected.
pub(crate) async fn deliver<F>(tx: mpsc::Sender<String>, producer: F, session_id: i64)
where
    F: std::future::Future<Output = Result<(), PumpError>>,
{
    match producer.await {
        Ok(()) => info!(session_id, "stream completed"),
        Err(PumpError::ClientGone) => {
            // No further writes of any kind after a detected disconnect.
            info!(session_id, "client disconnected mid-stream");
        }
        Err(PumpError::Frame(detail)) => {
            warn!(session_id, error = %detail, "stream failed; sending fallback frame");
            let apology = Frame::Final {
                reply: STREAM_APOLOGY.to_owned(),
                links: Vec::new(),
            };
            if let Ok(line) = apology.to_line() {
                let _ = tx.send(line).await;
            }
        }
    }
}

/// Emit every token frame with pacing, then exactly one final frame.
pub(crate) async fn pump_frames(
    tx: &mpsc::Sender<String>,
    reply: &str,
    links: &[RelatedLink],
    pacing: &PacingPolicy,
) -> Result<(), PumpError> {
    for chunk in segment(reply) {
        let frame = Frame::Token {
            delta: chunk.delta().to_owned(),
        };
        let line = frame.to_line().map_err(|e| PumpError::Frame(e.to_string()))?;
        tx.send(line).await.map_err(|_| PumpError::ClientGone)?;
        // Race the pacing delay against channel closure so a disconnect
        // does not keep the task sleeping to the end of the delay.
        let delay = pacing.delay_after(&chunk);
        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = tx.closed() => return Err(PumpError::ClientGone),
            }
        }
    }
    let final_frame = Frame::Final {
        reply: reply.to_owned(),
        links: links.to_vec(),
    };
    let line = final_frame
        .to_line()
        .map_err(|e| PumpError::Frame(e.to_string()))?;
    tx.send(line).await.map_err(|_| PumpError::ClientGone)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    async fn collect_frames(mut rx: mpsc::Receiver<String>) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(line) = rx.recv().await {
            frames.push(serde_json::from_str(line.trim()).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn deltas_reconstruct_the_final_reply() {
        let reply = "First thought. Second thought.\n\nNew paragraph here.";
        let (tx, rx) = mpsc::channel(64);
        pump_frames(&tx, reply, &[], &PacingPolicy::none())
            .await
            .unwrap();
        drop(tx);

        let frames = collect_frames(rx).await;
        let mut reconstructed = String::new();
        let mut finals = 0;
        for frame in &frames {
            match frame {
                Frame::Token { delta } => reconstructed.push_str(delta),
                Frame::Final { reply: r, links } => {
                    finals += 1;
                    assert_eq!(r, reply);
                    assert!(links.is_empty());
                }
            }
        }
        assert_eq!(finals, 1);
        assert_eq!(reconstructed, reply);
        assert!(matches!(frames.last(), Some(Frame::Final { .. })));
    }

    #[tokio::test]
    async fn mid_stream_fault_yields_exactly_one_fallback_final() {
        let (tx, rx) = mpsc::channel(8);
        let producer = async { Err(PumpError::Frame("simulated fault".into())) };
        deliver(tx, producer, 1).await;

        let frames = collect_frames(rx).await;
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            Frame::Final { reply, links } => {
                assert!(!reply.is_empty());
                assert!(links.is_empty());
            }
            other => panic!("expected final frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn client_disconnect_stops_delivery_without_fallback() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = pump_frames(&tx, "One. Two. Three.", &[], &PacingPolicy::none()).await;
        assert!(matches!(result, Err(PumpError::ClientGone)));
    }

    #[tokio::test]
    async fn disconnect_during_pacing_abandons_the_delay() {
        // Delays far longer than the test timeout: completion proves the
        // sleep was cut short by the closed channel.
        let policy = PacingPolicy {
            sentence_min_ms: 60_000,
            sentence_max_ms: 60_000,
            paragraph_ms: 60_000,
        };
        let (tx, mut rx) = mpsc::channel(1);
        let pump = tokio::spawn(async move {
            pump_frames(&tx, "One. Two. Three.", &[], &policy).await
        });

        // Take the first frame so the producer is inside its delay, then
        // walk away.
        let _ = rx.recv().await.unwrap();
        drop(rx);

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), pump)
            .await
            .expect("pump must stop promptly after disconnect")
            .unwrap();
        assert!(matches!(result, Err(PumpError::ClientGone)));
    }

    #[test]
    fn display_name_is_email_local_part() {
        assert_eq!(display_name("ada@example.edu"), "ada");
        assert_eq!(display_name("no-at-sign"), "no-at-sign");
    }
}
