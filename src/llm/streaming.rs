//! Streaming response handling

use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use futures::Stream;

use crate::errors::Result;

/// Lazy, single-pass stream of answer fragments from the LLM.
///
/// Terminates when the underlying provider signals completion. Implements
/// [`Stream`] directly so it can be consumed chunk by chunk (e.g. as an HTTP
/// response body) or drained with [`StreamingResponse::collect_all`].
pub struct StreamingResponse {
    stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl StreamingResponse {
    pub fn new(stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>) -> Self {
        Self { stream }
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        use futures::StreamExt;
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
        self.stream
    }
}

impl Stream for StreamingResponse {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.stream.as_mut().poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn test_collect_all_concatenates_chunks() {
        let chunks = vec![Ok("Hello".to_string()), Ok(", world".to_string())];
        let response = StreamingResponse::new(Box::pin(stream::iter(chunks)));

        assert_eq!(response.collect_all().await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn test_collect_all_propagates_errors() {
        let chunks = vec![
            Ok("partial".to_string()),
            Err(crate::RagChatError::LlmError("connection reset".to_string())),
        ];
        let response = StreamingResponse::new(Box::pin(stream::iter(chunks)));

        assert!(response.collect_all().await.is_err());
    }
}
