use std::collections::VecDeque;

use bytes::Bytes;

/// A narrow view of an external byte buffer.
///
/// Buffers are not required to be contiguous. `chunk_at` returns the longest
/// contiguous run that starts at `pos`, which lets a [`ByteSeq`] walk any
/// buffer segment by segment without copying it first.
///
/// Implementations must be immutable for as long as they are shared.
///
/// [`ByteSeq`]: crate::bytes::ByteSeq
pub trait ByteBuffer: Send + Sync {
    /// Total number of readable bytes.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the contiguous run of bytes starting at `pos`.
    ///
    /// The returned slice is non-empty whenever `pos < len()`.
    fn chunk_at(&self, pos: usize) -> &[u8];

    /// Returns the whole buffer as one slice, if it is stored contiguously.
    fn as_contiguous(&self) -> Option<&[u8]>;
}

impl ByteBuffer for Bytes {
    fn len(&self) -> usize {
        Bytes::len(self)
    }

    fn chunk_at(&self, pos: usize) -> &[u8] {
        &self[pos..]
    }

    fn as_contiguous(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl ByteBuffer for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn chunk_at(&self, pos: usize) -> &[u8] {
        &self[pos..]
    }

    fn as_contiguous(&self) -> Option<&[u8]> {
        Some(self)
    }
}

impl ByteBuffer for Box<[u8]> {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn chunk_at(&self, pos: usize) -> &[u8] {
        &self[pos..]
    }

    fn as_contiguous(&self) -> Option<&[u8]> {
        Some(self)
    }
}

/// A ring buffer is contiguous only while it has not wrapped.
impl ByteBuffer for VecDeque<u8> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn chunk_at(&self, pos: usize) -> &[u8] {
        let (front, back) = self.as_slices();
        if pos < front.len() {
            &front[pos..]
        } else {
            &back[pos - front.len()..]
        }
    }

    fn as_contiguous(&self) -> Option<&[u8]> {
        match self.as_slices() {
            (front, []) => Some(front),
            ([], back) => Some(back),
            _ => None,
        }
    }
}
