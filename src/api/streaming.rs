use crate::api::client::ByteStream;
use crate::api::sse::frame_stream;
use crate::error::{Result, RunixError};
use crate::exchange::{Completion, Exchange};
use colored::*;
use futures::stream::{self, StreamExt};
use tokio::time::{timeout, Duration};

pub struct StreamingResult {
    pub completion: Option<Completion>,
    pub frames: usize,
}

/// Drive a `text/event-stream` body through the classifier until the body
/// ends. Deltas are handed to `on_delta` as they arrive.
///
/// A `timeout_secs` of zero waits indefinitely for the next chunk. Any chunk
/// resets the clock, including keep-alive comments that carry no frame.
pub async fn process_streaming_response<F>(
    body: ByteStream,
    exchange: &mut Exchange,
    timeout_secs: u64,
    verbose: bool,
    mut on_delta: F,
) -> Result<StreamingResult>
where
    F: FnMut(&str),
{
    let body = match timeout_secs {
        0 => body,
        secs => with_chunk_timeout(body, Duration::from_secs(secs)),
    };
    let mut frames = Box::pin(frame_stream(body));
    let mut result = StreamingResult {
        completion: None,
        frames: 0,
    };

    loop {
        let frame = match frames.next().await {
            Some(frame) => frame?,
            None => break,
        };
        result.frames += 1;

        if verbose {
            if let Some(event) = &frame.event {
                eprintln!("{}", format!("[runix] SSE event: {}", event).dimmed());
            }
        }

        let outcome = exchange.apply_frame(&frame);

        if outcome.dropped && verbose {
            eprintln!(
                "{}",
                format!("[runix] Dropped unparseable frame: {}", frame.data).dimmed()
            );
        }

        if let Some(delta) = outcome.delta {
            on_delta(&delta);
        }

        if let Some(completion) = outcome.completion {
            if verbose {
                eprintln!("{}", "[runix] Stream completed".dimmed());
            }
            result.completion = Some(completion);
        }
    }

    Ok(result)
}

/// Fail with `RunixError::Timeout` when the body goes quiet for longer than
/// `limit` between chunks.
fn with_chunk_timeout(body: ByteStream, limit: Duration) -> ByteStream {
    Box::pin(stream::unfold(Some(body), move |body| async move {
        let mut body = body?;
        match timeout(limit, body.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(body))),
            Ok(None) => None,
            Err(_) => Some((Err(RunixError::Timeout), None)),
        }
    }))
}
