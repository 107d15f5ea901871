use std::time::Duration;

use axum::response::sse::{Event, Sse};
use futures::stream::Stream;

use super::models::{ChatCompletionChunk, ChatCompletionChunkBuilder, ChatCompletionChunkChoice};
use crate::constants::{MOCK_STREAM_MESSAGE, SSE_DONE_MESSAGE};

/// Per-word deltas of the mocked streaming reply, each carrying a trailing space.
pub fn mock_stream_words() -> impl Iterator<Item = String> {
    MOCK_STREAM_MESSAGE
        .split_whitespace()
        .map(|word| format!("{word} "))
}

/// Emits one chunk per word with `chunk_delay` after each, then the stop chunk
/// and the `[DONE]` sentinel.
pub fn stream_chat_completion(
    chunk_delay: Duration,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let sse_stream = async_stream::stream! {
        for content in mock_stream_words() {
            let chunk = ChatCompletionChunkBuilder::new()
                .choices(vec![ChatCompletionChunkChoice::content(content)])
                .build();
            yield Ok(create_sse_event(&chunk));

            tokio::time::sleep(chunk_delay).await;
        }

        let final_chunk = ChatCompletionChunkBuilder::new()
            .choices(vec![ChatCompletionChunkChoice::stop()])
            .build();
        yield Ok(create_sse_event(&final_chunk));

        yield Ok(Event::default().data(SSE_DONE_MESSAGE));
        tracing::debug!("mock stream finished");
    };

    Sse::new(sse_stream)
}

/// Creates an SSE event from a chunk
fn create_sse_event(chunk: &ChatCompletionChunk) -> Event {
    let data = serde_json::to_string(&chunk).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize chunk: {}", e);
        String::from("{}")
    });
    Event::default().data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_reconstruct_sentence_with_trailing_space() {
        let joined: String = mock_stream_words().collect();
        assert_eq!(joined, format!("{MOCK_STREAM_MESSAGE} "));
    }

    #[test]
    fn every_word_ends_with_single_space() {
        for word in mock_stream_words() {
            assert!(word.ends_with(' '));
            assert!(!word.trim_end().contains(' '));
        }
        assert_eq!(mock_stream_words().count(), 27);
    }
}
