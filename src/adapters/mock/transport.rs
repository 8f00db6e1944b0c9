//! Mock streaming transport for testing.
//!
//! Responses are queued and handed out in order, one per `post_stream`
//! call, so a turn that makes a continuation request gets the second
//! queued response.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::traits::{ByteStream, Headers, StreamTransport};

/// A recorded request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

impl RecordedRequest {
    /// Body parsed as JSON (`Null` if it is not valid JSON).
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or_default()
    }
}

/// Scripted outcome of one `post_stream` call.
#[derive(Debug)]
pub enum MockStream {
    /// Yield these chunks, then end
    Chunks(Vec<Bytes>),
    /// Yield these chunks, then fail
    ChunksThenError(Vec<Bytes>, TransportError),
    /// Yield these chunks, then stay open forever
    ChunksThenHang(Vec<Bytes>),
    /// Yield whatever the test pushes through the paired sender
    Channel(mpsc::UnboundedReceiver<Result<Bytes, TransportError>>),
    /// Fail to open
    OpenError(TransportError),
}

impl MockStream {
    /// One chunk per frame, each formatted as `data: <frame>\n`.
    pub fn frames(frames: &[&str]) -> Self {
        MockStream::Chunks(frames.iter().map(|f| frame_chunk(f)).collect())
    }

    /// Like [`MockStream::frames`] but the stream never ends.
    pub fn frames_then_hang(frames: &[&str]) -> Self {
        MockStream::ChunksThenHang(frames.iter().map(|f| frame_chunk(f)).collect())
    }

    /// A stream fed from the returned sender.
    pub fn channel() -> (mpsc::UnboundedSender<Result<Bytes, TransportError>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, MockStream::Channel(rx))
    }

    fn into_byte_stream(self) -> Result<ByteStream, TransportError> {
        match self {
            MockStream::Chunks(chunks) => Ok(Box::pin(stream::iter(
                chunks.into_iter().map(Ok::<Bytes, TransportError>),
            ))),
            MockStream::ChunksThenError(chunks, err) => Ok(Box::pin(stream::iter(
                chunks
                    .into_iter()
                    .map(Ok::<Bytes, TransportError>)
                    .chain(std::iter::once(Err(err))),
            ))),
            MockStream::ChunksThenHang(chunks) => Ok(Box::pin(
                stream::iter(chunks.into_iter().map(Ok::<Bytes, TransportError>))
                    .chain(stream::pending()),
            )),
            MockStream::Channel(rx) => Ok(Box::pin(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            }))),
            MockStream::OpenError(err) => Err(err),
        }
    }
}

/// Format one frame line.
pub fn frame_chunk(frame: &str) -> Bytes {
    Bytes::from(format!("data: {}\n", frame))
}

/// Mock transport with a FIFO of scripted responses.
///
/// # Example
///
/// ```ignore
/// use parlor::adapters::mock::{MockStream, MockTransport};
///
/// let transport = MockTransport::new();
/// transport.push(MockStream::frames(&[r#"{"content":"hi"}"#, "[DONE]"]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockStream>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next unanswered call.
    pub fn push(&self, response: MockStream) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// All requests made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });

        let response = self.responses.lock().unwrap().pop_front();
        match response {
            Some(response) => response.into_byte_stream(),
            None => Err(TransportError::Other(format!(
                "No mock response queued for {}",
                url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_responses_are_consumed_in_order() {
        let transport = MockTransport::new();
        transport.push(MockStream::frames(&["{\"content\":\"a\"}"]));
        transport.push(MockStream::OpenError(TransportError::Timeout("t".into())));

        let mut first = transport
            .post_stream("http://x/stream", "{\"n\":1}", &Headers::new())
            .await
            .unwrap();
        assert_eq!(
            first.next().await.unwrap().unwrap(),
            Bytes::from("data: {\"content\":\"a\"}\n")
        );
        assert!(first.next().await.is_none());

        let second = transport
            .post_stream("http://x/stream", "{\"n\":2}", &Headers::new())
            .await;
        assert!(matches!(second, Err(TransportError::Timeout(_))));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].json()["n"], 2);
        assert_eq!(transport.remaining(), 0);
    }

    #[tokio::test]
    async fn test_empty_queue_is_an_error() {
        let transport = MockTransport::new();
        let result = transport.post_stream("http://x", "", &Headers::new()).await;
        assert!(matches!(result, Err(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn test_chunks_then_error() {
        let transport = MockTransport::new();
        transport.push(MockStream::ChunksThenError(
            vec![frame_chunk("{}")],
            TransportError::Io("reset".into()),
        ));
        let items: Vec<_> = transport
            .post_stream("http://x", "", &Headers::new())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_channel_stream() {
        let transport = MockTransport::new();
        let (tx, response) = MockStream::channel();
        transport.push(response);

        let mut stream = transport
            .post_stream("http://x", "", &Headers::new())
            .await
            .unwrap();
        tx.send(Ok(frame_chunk("[DONE]"))).unwrap();
        drop(tx);

        assert_eq!(stream.next().await.unwrap().unwrap(), frame_chunk("[DONE]"));
        assert!(stream.next().await.is_none());
    }
}
