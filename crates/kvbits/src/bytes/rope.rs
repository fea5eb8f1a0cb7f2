use core::mem;
use std::sync::Arc;

use bytes::Bytes;

use crate::bytes::{ByteBuffer, ByteSeq, Charset};

/// Text encoded with a known charset, kept for [`fmt::Display`].
///
/// [`fmt::Display`]: core::fmt::Display
#[derive(Clone)]
pub struct Text {
    pub(crate) bytes: Bytes,
    pub(crate) charset: Charset,
}

impl Text {
    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

/// A window into an external [`ByteBuffer`].
#[derive(Clone)]
pub struct BufferView {
    pub(crate) buffer: Arc<dyn ByteBuffer>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl BufferView {
    pub(crate) fn contiguous(&self) -> Option<&[u8]> {
        self.buffer
            .as_contiguous()
            .map(|all| &all[self.offset..self.offset + self.len])
    }
}

/// An O(1) sub-range of another sequence.
#[derive(Clone)]
pub struct SliceView {
    pub(crate) inner: Arc<ByteSeq>,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

/// Concatenation node. The combined length is cached at construction.
pub struct Rope {
    pub(crate) head: ByteSeq,
    pub(crate) tail: ByteSeq,
    pub(crate) len: usize,
}

impl Rope {
    pub fn head(&self) -> &ByteSeq {
        &self.head
    }

    pub fn tail(&self) -> &ByteSeq {
        &self.tail
    }
}

const fn is_nested(seq: &ByteSeq) -> bool {
    matches!(seq, ByteSeq::Concat(_) | ByteSeq::Slice(_))
}

// Unlinks uniquely owned children onto a heap stack so that dropping a
// million-node chain does not recurse a million frames deep.
impl Drop for Rope {
    fn drop(&mut self) {
        if !is_nested(&self.head) && !is_nested(&self.tail) {
            return;
        }
        let mut stack = vec![mem::take(&mut self.head), mem::take(&mut self.tail)];
        while let Some(seq) = stack.pop() {
            match seq {
                ByteSeq::Concat(rope) => {
                    if let Some(mut rope) = Arc::into_inner(rope) {
                        stack.push(mem::take(&mut rope.head));
                        stack.push(mem::take(&mut rope.tail));
                    }
                }
                ByteSeq::Slice(SliceView { inner, .. }) => {
                    if let Some(inner) = Arc::into_inner(inner) {
                        stack.push(inner);
                    }
                }
                _ => {}
            }
        }
    }
}
