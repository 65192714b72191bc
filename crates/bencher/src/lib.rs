use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    input: TestInput,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, input: TestInput) -> Self {
        Self { name, group, input }
    }

    pub fn small(name: &'static str, input: TestInput) -> Self {
        Self::new(name, TestGroup::Small, input)
    }

    pub fn normal(name: &'static str, input: TestInput) -> Self {
        Self::new(name, TestGroup::Normal, input)
    }

    pub fn large(name: &'static str, input: TestInput) -> Self {
        Self::new(name, TestGroup::Large, input)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn input(&self) -> &TestInput {
        &self.input
    }
}

/// Wire bytes of one response body together with its decoded length.
#[derive(Debug, Clone)]
pub struct TestInput {
    wire: Vec<u8>,
    body_len: u64,
}

impl TestInput {
    /// A chunked body made of `chunks` chunks of `chunk_size` bytes each.
    pub fn chunked(chunk_size: usize, chunks: usize) -> Self {
        let mut wire = Vec::with_capacity(chunks * (chunk_size + 16) + 5);
        let mut line = String::new();
        for i in 0..chunks {
            line.clear();
            let _ = write!(line, "{chunk_size:x}\r\n");
            wire.extend_from_slice(line.as_bytes());
            wire.extend(std::iter::repeat_n(b'a' + (i % 26) as u8, chunk_size));
            wire.extend_from_slice(b"\r\n");
        }
        wire.extend_from_slice(b"0\r\n\r\n");
        Self { wire, body_len: (chunk_size * chunks) as u64 }
    }

    /// A body of `len` bytes delimited by its content length.
    pub fn fixed(len: usize) -> Self {
        Self { wire: vec![b'x'; len], body_len: len as u64 }
    }

    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    pub fn body_len(&self) -> u64 {
        self.body_len
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}
