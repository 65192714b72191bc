use std::ops::Deref;

use bytes::{Bytes, BytesMut};

/// A read-only batch of decoded body bytes.
///
/// A batch collects every unit decoded while processing one input buffer. Each unit
/// is a [`Bytes`] view split off the input, so building a batch never copies payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayloadBatch {
    units: Vec<Bytes>,
}

impl PayloadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, bytes: Bytes) {
        if !bytes.is_empty() {
            self.units.push(bytes);
        }
    }

    /// Total number of payload bytes in this batch
    pub fn byte_len(&self) -> u64 {
        self.units.iter().map(|unit| unit.len() as u64).sum()
    }

    /// Copies the units of this batch into one contiguous buffer.
    pub fn to_bytes(&self) -> Bytes {
        match self.units.as_slice() {
            [] => Bytes::new(),
            [single] => single.clone(),
            units => {
                let mut buf = BytesMut::with_capacity(units.iter().map(Bytes::len).sum());
                for unit in units {
                    buf.extend_from_slice(unit);
                }
                buf.freeze()
            }
        }
    }
}

impl Deref for PayloadBatch {
    type Target = [Bytes];

    fn deref(&self) -> &Self::Target {
        &self.units
    }
}

impl IntoIterator for PayloadBatch {
    type Item = Bytes;
    type IntoIter = std::vec::IntoIter<Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.into_iter()
    }
}

impl From<Bytes> for PayloadBatch {
    fn from(bytes: Bytes) -> Self {
        let mut batch = Self::new();
        batch.push(bytes);
        batch
    }
}

/// The outcome of feeding one input buffer to a framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The body continues; the batch holds whatever this buffer contributed, possibly nothing
    Partial(PayloadBatch),
    /// The body is finished; the batch holds the last decoded bytes, possibly nothing
    Complete(PayloadBatch),
}

impl Decoded {
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, Decoded::Complete(_))
    }

    pub fn batch(&self) -> &PayloadBatch {
        match self {
            Decoded::Partial(batch) | Decoded::Complete(batch) => batch,
        }
    }

    pub fn into_batch(self) -> PayloadBatch {
        match self {
            Decoded::Partial(batch) | Decoded::Complete(batch) => batch,
        }
    }
}

/// Represents an item in the body stream produced by the streaming decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// A batch of payload data
    Data(PayloadBatch),
    /// Marks the end of the payload stream
    Eof,
}

impl PayloadItem {
    /// Returns true if this item represents the end of the payload stream
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    /// Returns true if this item contains payload data
    #[inline]
    pub fn is_data(&self) -> bool {
        matches!(self, PayloadItem::Data(_))
    }

    /// Returns a reference to the contained batch if this is a Data item
    pub fn as_batch(&self) -> Option<&PayloadBatch> {
        match self {
            PayloadItem::Data(batch) => Some(batch),
            PayloadItem::Eof => None,
        }
    }

    /// Consumes the item and returns the contained batch if this is a Data item
    pub fn into_batch(self) -> Option<PayloadBatch> {
        match self {
            PayloadItem::Data(batch) => Some(batch),
            PayloadItem::Eof => None,
        }
    }
}

/// Represents the size information of a body, as known before decoding starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Body with known length in bytes
    Length(u64),
    /// Body using chunked transfer encoding
    Chunked,
    /// Body delimited by the connection closing
    UntilClose,
}

impl PayloadSize {
    /// Returns the exact body length, if known
    #[inline]
    pub fn exact(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(length) => Some(*length),
            PayloadSize::Chunked | PayloadSize::UntilClose => None,
        }
    }

    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }
}
