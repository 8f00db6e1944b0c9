//! Streaming transport trait abstraction.
//!
//! The turn controller only needs one operation from the network: POST a
//! JSON body and read the response incrementally. Keeping it behind a trait
//! lets tests script the byte stream chunk by chunk.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

use crate::error::TransportError;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Response body delivered as it arrives.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Trait for opening a streamed POST request.
///
/// # Example
///
/// ```ignore
/// use parlor::traits::{Headers, StreamTransport};
///
/// async fn open<T: StreamTransport>(transport: &T) -> Result<(), TransportError> {
///     let mut body = transport
///         .post_stream("http://localhost:8000/api/chat/stream", "{}", &Headers::new())
///         .await?;
///     while let Some(chunk) = body.next().await {
///         println!("{} bytes", chunk?.len());
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// POST `body` to `url` and return the response body as a byte stream.
    ///
    /// Fails before yielding anything if the connection cannot be made or
    /// the service answers with a non-success status.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, TransportError>;
}
