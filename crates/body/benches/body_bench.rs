use bytes::BytesMut;
use criterion::{Criterion, criterion_group, criterion_main};
use http_body_util::BodyExt;
use micro_body::codec::PayloadDecoder;
use micro_body::connection::{BodyReader, ResponseContent};
use micro_body::protocol::body::body_channel;
use micro_body::protocol::{Decoded, FramingDeclaration};
use std::hint::black_box;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};

// Mock IO for testing
#[derive(Clone)]
struct MockIO {
    read_data: Vec<u8>,
    read_pos: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>) -> Self {
        Self { read_data, read_pos: 0 }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

fn chunked_body(chunk_size: usize, chunks: usize) -> Vec<u8> {
    let mut wire = Vec::new();
    for _ in 0..chunks {
        wire.extend(format!("{chunk_size:x}\r\n").into_bytes());
        wire.extend(vec![b'b'; chunk_size]);
        wire.extend(b"\r\n");
    }
    wire.extend(b"0\r\n\r\n");
    wire
}

fn bench_chunked_decoder(c: &mut Criterion) {
    let body = chunked_body(512, 16);

    c.bench_function("decode_chunked_body", |b| {
        b.iter(|| {
            let mut decoder = PayloadDecoder::chunked();
            let mut bytes = BytesMut::from(&body[..]);
            let decoded = decoder.decode_buf(&mut bytes).unwrap();
            assert!(matches!(decoded, Decoded::Complete(_)));
            black_box(decoded);
        });
    });
}

fn bench_response_content(c: &mut Criterion) {
    let body = chunked_body(4 * 1024, 64);
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

    c.bench_function("read_chunked_response_body", |b| {
        b.to_async(&runtime).iter(|| async {
            let (subscriber, response_body) = body_channel(micro_body::protocol::PayloadSize::Chunked);
            let mut content = ResponseContent::new(&FramingDeclaration::chunked(), subscriber);
            let mut reader = BodyReader::new(MockIO::new(body.clone()));

            let (status, collected) = tokio::join!(reader.read_body(&mut content), response_body.collect());
            black_box((status, collected.unwrap().to_bytes()));
        });
    });
}

criterion_group!(benches, bench_chunked_decoder, bench_response_content);
criterion_main!(benches);
