use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, trace};

use crate::codec::PayloadDecoder;
use crate::connection::{BodyStatus, ResponseContent};
use crate::protocol::BodyError;
use crate::protocol::body::BodySubscriber;

/// Initial capacity of the read buffer
pub const DEFAULT_READ_CAPACITY: usize = 8 * 1024;

/// Drives a [`ResponseContent`] from an async byte source.
///
/// The reader only pulls from the source while the subscriber has demand outstanding, so a
/// slow consumer applies backpressure all the way to the socket. Bytes that follow the body
/// stay in the read buffer and can be taken back with [`into_parts`](BodyReader::into_parts).
#[derive(Debug)]
pub struct BodyReader<R> {
    reader: R,
    read_buf: BytesMut,
    capacity: usize,
}

impl<R> BodyReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_READ_CAPACITY)
    }

    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, read_buf: BytesMut::with_capacity(capacity), capacity }
    }

    /// Starts from bytes already read past the response head.
    pub fn with_buffer(reader: R, read_buf: BytesMut) -> Self {
        let capacity = read_buf.capacity().max(DEFAULT_READ_CAPACITY);
        Self { reader, read_buf, capacity }
    }

    /// Reads until `content` reaches a final status.
    ///
    /// Subscribes `content` first if that has not happened yet. Read errors and an early end
    /// of the source are reported to the subscriber, not returned.
    pub async fn read_body<S: BodySubscriber>(&mut self, content: &mut ResponseContent<S>) -> BodyStatus {
        if content.status() == BodyStatus::Unsubscribed {
            content.subscribe();
        }

        let subscription = content.subscription().clone();

        while !content.status().is_finished() {
            if !subscription.demand_available().await {
                content.observe_cancel();
                break;
            }

            if self.read_buf.is_empty() {
                self.read_buf.reserve(self.capacity);
                match self.reader.read_buf(&mut self.read_buf).await {
                    Ok(0) => {
                        debug!(state = %content.state_message(), "source closed");
                        content.on_connection_closed();
                        break;
                    }
                    Ok(n) => trace!(n, "read body bytes"),
                    Err(e) => {
                        error!(cause = %e, "failed to read body");
                        content.on_error(BodyError::io(e));
                        break;
                    }
                }
            }

            content.accept(&mut self.read_buf);
        }

        content.status()
    }

    /// Returns the source and any bytes read beyond the body.
    pub fn into_parts(self) -> (R, BytesMut) {
        (self.reader, self.read_buf)
    }
}

/// Reads one body as a stream of [`PayloadItem`](crate::protocol::PayloadItem)s, without
/// demand gating.
pub fn framed_payload<R: AsyncRead>(reader: R, decoder: PayloadDecoder) -> FramedRead<R, PayloadDecoder> {
    FramedRead::with_capacity(reader, decoder, DEFAULT_READ_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};

    use futures::StreamExt;
    use http_body_util::BodyExt;
    use indoc::indoc;
    use tokio::io::ReadBuf;

    use crate::protocol::body::body_channel;
    use crate::protocol::{FramingDeclaration, PayloadItem, PayloadSize};

    /// Source handing out at most `step` bytes per read, then an optional error.
    struct MockIO {
        data: Vec<u8>,
        position: usize,
        step: usize,
        fail_at_end: bool,
    }

    impl MockIO {
        fn new(data: &[u8], step: usize) -> Self {
            Self { data: data.to_vec(), position: 0, step, fail_at_end: false }
        }

        fn failing(data: &[u8], step: usize) -> Self {
            Self { fail_at_end: true, ..Self::new(data, step) }
        }
    }

    impl AsyncRead for MockIO {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if self.position >= self.data.len() && self.fail_at_end {
                return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
            }
            let end = (self.position + self.step).min(self.data.len()).min(self.position + buf.remaining());
            buf.put_slice(&self.data[self.position..end]);
            self.position = end;
            Poll::Ready(Ok(()))
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
    }

    async fn read_through_channel(declaration: FramingDeclaration, io: MockIO) -> (Result<Vec<u8>, BodyError>, BodyStatus, BytesMut) {
        init_tracing();
        let (subscriber, body) = body_channel(PayloadSize::Chunked);
        let mut content = ResponseContent::new(&declaration, subscriber);

        let driver = tokio::spawn(async move {
            let mut reader = BodyReader::new(io);
            let status = reader.read_body(&mut content).await;
            let (_io, rest) = reader.into_parts();
            (status, rest)
        });

        let body = body.collect().await.map(|collected| collected.to_bytes().to_vec());
        let (status, rest) = driver.await.unwrap();
        (body, status, rest)
    }

    #[tokio::test]
    async fn test_chunked_body_small_reads() {
        let input = indoc! {"
            4\r
            Wiki\r
            5\r
            pedia\r
            0\r
            \r
        "};
        for step in [1, 2, 3, 7, 1024] {
            let (body, status, rest) = read_through_channel(FramingDeclaration::chunked(), MockIO::new(input.as_bytes(), step)).await;
            assert_eq!(body.unwrap(), b"Wikipedia", "step {step}");
            assert_eq!(status, BodyStatus::Completed);
            assert!(rest.is_empty(), "step {step}");
        }
    }

    #[tokio::test]
    async fn test_fixed_length_body() {
        let (body, status, rest) =
            read_through_channel(FramingDeclaration::fixed(11), MockIO::new(b"hello worldHTTP/1.1", 64)).await;
        assert_eq!(body.unwrap(), b"hello world");
        assert_eq!(status, BodyStatus::Completed);
        assert_eq!(&rest[..], b"HTTP/1.1");
    }

    #[tokio::test]
    async fn test_until_close_body() {
        let data = vec![b'x'; 20 * 1024];
        let (body, status, _) = read_through_channel(FramingDeclaration::until_close(), MockIO::new(&data, 3000)).await;
        assert_eq!(body.unwrap(), data);
        assert_eq!(status, BodyStatus::Completed);
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let (body, status, _) = read_through_channel(FramingDeclaration::fixed(100), MockIO::new(b"short", 2)).await;
        assert!(matches!(body, Err(BodyError::UnexpectedEof { received: 5 })));
        assert_eq!(status, BodyStatus::Failed);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (body, status, _) = read_through_channel(FramingDeclaration::chunked(), MockIO::new(b"G\r\n", 8)).await;
        let error = body.unwrap_err();
        assert!(error.as_framing().is_some());
        assert_eq!(status, BodyStatus::Failed);
    }

    #[tokio::test]
    async fn test_read_error() {
        let (body, status, _) = read_through_channel(FramingDeclaration::fixed(10), MockIO::failing(b"abc", 8)).await;
        assert!(matches!(body, Err(BodyError::Io { .. })));
        assert_eq!(status, BodyStatus::Failed);
    }

    #[tokio::test]
    async fn test_dropped_body_cancels() {
        let (subscriber, body) = body_channel(PayloadSize::UntilClose);
        let finished = Arc::new(AtomicBool::new(false));
        let canceled = Arc::clone(&finished);
        let mut content = ResponseContent::new(&FramingDeclaration::until_close(), subscriber)
            .on_finished(move |result| canceled.store(result.is_err_and(BodyError::is_canceled), Ordering::SeqCst));

        let driver = tokio::spawn(async move {
            let mut reader = BodyReader::new(MockIO::new(&[b'z'; 64], 8));
            reader.read_body(&mut content).await
        });

        let mut body = body;
        let first = body.frame().await.unwrap().unwrap();
        assert_eq!(first.into_data().unwrap().len(), 8);
        drop(body);

        assert_eq!(driver.await.unwrap(), BodyStatus::Canceled);
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_buffered_bytes_are_decoded_first() {
        let (subscriber, body) = body_channel(PayloadSize::Length(6));
        let mut content = ResponseContent::new(&FramingDeclaration::fixed(6), subscriber);

        let driver = tokio::spawn(async move {
            let mut reader = BodyReader::with_buffer(MockIO::new(b"def", 8), BytesMut::from(&b"abc"[..]));
            reader.read_body(&mut content).await
        });

        let bytes = body.collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"abcdef");
        assert_eq!(driver.await.unwrap(), BodyStatus::Completed);
    }

    #[tokio::test]
    async fn test_framed_payload() {
        let mut framed = framed_payload(MockIO::new(b"3\r\nabc\r\n0\r\n\r\n", 2), PayloadDecoder::chunked());

        let mut body = Vec::new();
        while let Some(item) = framed.next().await {
            match item.unwrap() {
                PayloadItem::Data(batch) => body.extend_from_slice(&batch.to_bytes()),
                PayloadItem::Eof => break,
            }
        }
        assert_eq!(body, b"abc");
    }
}
