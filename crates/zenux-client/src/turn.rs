//! Per-turn state machine and the async stream driver.
//!
//! A turn moves `Idle -> Streaming -> {Finalized | Cancelled | Failed}`.
//! The accumulating buffer lives only inside the `Streaming` state (owned
//! by the [`StreamConsumer`]) and is dropped on any non-`Finalized` exit.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::cancel::CancelHandle;
use crate::consumer::{ConsumerEvent, StreamConsumer};

/// Terminal state of one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The stream completed; this is the final message text (never empty).
    Finalized(String),
    /// The user aborted mid-stream. Nothing may be persisted.
    Cancelled,
    /// Transport or in-band failure. Distinguished from cancellation so the
    /// UI can show a retry prompt instead of silently clearing.
    Failed(String),
}

/// Drive one relay response stream to a terminal state.
///
/// `on_update` receives the full accumulated text after every line that
/// yielded new content. Returning from this function drops `stream`, which
/// aborts the underlying HTTP request; cancellation therefore needs no
/// separate teardown.
pub async fn run_turn<S, E>(
    mut stream: S,
    cancel: CancelHandle,
    mut on_update: impl FnMut(&str),
) -> TurnOutcome
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut consumer = StreamConsumer::new();

    loop {
        tokio::select! {
            // Checked before the next chunk so an abort never loses to a
            // ready read.
            biased;
            _ = cancel.cancelled() => {
                return TurnOutcome::Cancelled;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    for event in consumer.feed(&bytes) {
                        match event {
                            ConsumerEvent::ContentUpdated => on_update(consumer.content()),
                            ConsumerEvent::Failed(error) => return TurnOutcome::Failed(error),
                            // The sentinel announces the end; keep reading
                            // until the transport itself completes.
                            ConsumerEvent::Done => {}
                        }
                    }
                }
                Some(Err(e)) => return TurnOutcome::Failed(e.to_string()),
                None => break,
            }
        }
    }

    match consumer.finish() {
        Ok(text) => TurnOutcome::Finalized(text),
        Err(error) => TurnOutcome::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn chunks(lines: &[&str]) -> Vec<Result<Bytes, Infallible>> {
        lines
            .iter()
            .map(|l| Ok(Bytes::from(format!("{l}\n\n"))))
            .collect()
    }

    #[tokio::test]
    async fn finalizes_with_accumulated_text() {
        let stream = futures::stream::iter(chunks(&[
            r#"data: {"choices":[{"delta":{"content":"Hi "}}]}"#,
            r#"data: {"choices":[{"delta":{"content":"there"}}]}"#,
            "data: [DONE]",
        ]));

        let mut updates = Vec::new();
        let outcome = run_turn(stream, CancelHandle::new(), |content| {
            updates.push(content.to_string());
        })
        .await;

        assert_eq!(outcome, TurnOutcome::Finalized("Hi there".to_string()));
        assert_eq!(updates, vec!["Hi ".to_string(), "Hi there".to_string()]);
    }

    #[tokio::test]
    async fn empty_stream_finalizes_with_fallback() {
        let stream = futures::stream::iter(chunks(&["data: [DONE]"]));
        let outcome = run_turn(stream, CancelHandle::new(), |_| {}).await;

        match outcome {
            TurnOutcome::Finalized(text) => assert!(!text.is_empty()),
            other => panic!("expected Finalized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_fails_the_turn() {
        let stream = futures::stream::iter(vec![
            Ok(Bytes::from("data: {\"content\":\"x\"}\n\n")),
            Err("connection reset"),
        ]);
        let outcome = run_turn(stream, CancelHandle::new(), |_| {}).await;
        assert_eq!(outcome, TurnOutcome::Failed("connection reset".to_string()));
    }

    #[tokio::test]
    async fn in_band_error_fails_the_turn() {
        let stream = futures::stream::iter(chunks(&[r#"data: {"error":"quota exceeded"}"#]));
        let outcome = run_turn(stream, CancelHandle::new(), |_| {}).await;
        assert_eq!(outcome, TurnOutcome::Failed("quota exceeded".to_string()));
    }

    #[tokio::test]
    async fn cancellation_wins_over_a_stalled_stream() {
        // A stream that yields one chunk and then never completes.
        let stalled = futures::stream::iter(chunks(&[r#"data: {"content":"partial"}"#]))
            .chain(futures::stream::pending());
        let mut stalled = Box::pin(stalled);

        let cancel = CancelHandle::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let outcome = run_turn(&mut stalled, cancel, |_| {}).await;
        assert_eq!(outcome, TurnOutcome::Cancelled);
    }

    #[tokio::test]
    async fn pre_cancelled_handle_short_circuits() {
        let cancel = CancelHandle::new();
        cancel.cancel();

        let stream = futures::stream::iter(chunks(&[r#"data: {"content":"never seen"}"#]));
        let outcome = run_turn(stream, cancel, |_| {}).await;
        assert_eq!(outcome, TurnOutcome::Cancelled);
    }
}
