use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use std::{io, sync::Arc};

use bytes::{BufMut, Bytes};

use crate::{
    bytes::{BufferView, ByteBuffer, Charset, Chunks, Rope, SeqReader, SliceView, Text},
    error::{Error, Result},
};

/// An immutable, logically contiguous sequence of bytes.
///
/// Every variant shares one contract: length never changes, equality and
/// ordering depend only on the bytes, and iteration yields the bytes as an
/// ordered series of contiguous chunks.
///
/// Cloning is always O(1): array storage is reference counted by [`Bytes`]
/// and composite variants hold their parts behind an [`Arc`]. Use
/// [`ByteSeq::copy`] to obtain independent storage.
///
/// # Example
///
/// ```
/// use kvbits::bytes::ByteSeq;
///
/// let key = ByteSeq::from_static(b"user:").concat(ByteSeq::from("42"));
/// assert_eq!(key.len(), 7);
/// assert_eq!(key.to_string(), "user:42");
/// assert!(!key.has_array());
/// assert_eq!(key.sub_seq(5, 7).unwrap(), ByteSeq::from_static(b"42"));
/// ```
#[derive(Clone, Default)]
pub enum ByteSeq {
    /// The empty sequence. Never allocates.
    #[default]
    Empty,
    /// Bytes owned by (or shared through) a [`Bytes`] handle.
    Array(Bytes),
    /// A window into an external [`ByteBuffer`].
    Buffer(BufferView),
    /// Encoded text that remembers its charset.
    Text(Text),
    /// Lazy concatenation of two sequences.
    Concat(Arc<Rope>),
    /// A sub-range of another sequence.
    Slice(SliceView),
}

impl ByteSeq {
    /// The empty sequence.
    pub const EMPTY: Self = Self::Empty;

    pub const fn empty() -> Self {
        Self::Empty
    }

    /// Wraps static memory without copying.
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self::Array(Bytes::from_static(bytes))
    }

    /// Takes ownership of `bytes`.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::Array(Bytes::from(bytes))
    }

    /// Shares an existing [`Bytes`] handle.
    pub const fn from_bytes(bytes: Bytes) -> Self {
        Self::Array(bytes)
    }

    /// Copies `bytes` into new, exclusively owned storage.
    pub fn copy_from_slice(bytes: &[u8]) -> Self {
        Self::Array(Bytes::copy_from_slice(bytes))
    }

    /// Wraps an external buffer without copying it.
    pub fn from_buffer<B>(buffer: B) -> Self
    where
        B: ByteBuffer + 'static,
    {
        Self::from_shared_buffer(Arc::new(buffer))
    }

    /// Wraps an already shared external buffer without copying it.
    pub fn from_shared_buffer(buffer: Arc<dyn ByteBuffer>) -> Self {
        let len = buffer.len();
        Self::Buffer(BufferView {
            buffer,
            offset: 0,
            len,
        })
    }

    /// Encodes `text` with `charset`.
    pub fn encode(text: &str, charset: Charset) -> Self {
        Self::Text(Text {
            bytes: Bytes::from(charset.encode(text)),
            charset,
        })
    }

    /// Encodes `text` as US-ASCII, replacing anything else with `?`.
    pub fn ascii(text: &str) -> Self {
        Self::encode(text, Charset::Ascii)
    }

    /// Takes ownership of a UTF-8 string without re-encoding it.
    pub fn utf8(text: impl Into<String>) -> Self {
        Self::Text(Text {
            bytes: Bytes::from(text.into()),
            charset: Charset::Utf8,
        })
    }

    /// Returns the concatenation of `self` and `tail` in O(1).
    ///
    /// Empty operands are elided rather than wrapped.
    ///
    /// # Panics
    ///
    /// Panics if the combined length overflows `usize`. Use
    /// [`ByteSeq::try_concat`] to handle that case.
    #[must_use]
    pub fn concat(self, tail: Self) -> Self {
        match self.try_concat(tail) {
            Ok(seq) => seq,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`ByteSeq::concat`], but reports a combined length past
    /// `usize::MAX` instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LengthOverflow`] if the lengths do not fit a `usize`.
    pub fn try_concat(self, tail: Self) -> Result<Self> {
        if self.is_empty() {
            return Ok(tail);
        }
        if tail.is_empty() {
            return Ok(self);
        }
        let (head_len, tail_len) = (self.len(), tail.len());
        let len = head_len
            .checked_add(tail_len)
            .ok_or(Error::LengthOverflow {
                head: head_len,
                tail: tail_len,
            })?;
        Ok(Self::Concat(Arc::new(Rope {
            head: self,
            tail,
            len,
        })))
    }

    /// Concatenates every sequence in `parts`, left to right.
    pub fn concat_all<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        parts.into_iter().fold(Self::Empty, Self::concat)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Array(bytes) => bytes.len(),
            Self::Buffer(view) => view.len,
            Self::Text(text) => text.bytes.len(),
            Self::Concat(rope) => rope.len,
            Self::Slice(view) => view.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the byte at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<u8> {
        let len = self.len();
        if index >= len {
            return Err(Error::out_of_bounds(index, index.saturating_add(1), len));
        }
        Ok(self.chunk_at(index)[0])
    }

    /// Returns a view of `start..end` in O(1), without copying.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `start > end` or `end > len()`.
    pub fn sub_seq(&self, start: usize, end: usize) -> Result<Self> {
        let len = self.len();
        if start > end || end > len {
            return Err(Error::out_of_bounds(start, end, len));
        }
        if start == end {
            return Ok(Self::Empty);
        }
        if start == 0 && end == len {
            return Ok(self.clone());
        }
        Ok(match self {
            Self::Empty => Self::Empty,
            Self::Array(bytes) => Self::Array(bytes.slice(start..end)),
            Self::Text(text) => Self::Text(Text {
                bytes: text.bytes.slice(start..end),
                charset: text.charset,
            }),
            Self::Buffer(view) => Self::Buffer(BufferView {
                buffer: Arc::clone(&view.buffer),
                offset: view.offset + start,
                len: end - start,
            }),
            Self::Slice(view) => Self::Slice(SliceView {
                inner: Arc::clone(&view.inner),
                offset: view.offset + start,
                len: end - start,
            }),
            Self::Concat(_) => Self::Slice(SliceView {
                inner: Arc::new(self.clone()),
                offset: start,
                len: end - start,
            }),
        })
    }

    /// Returns `true` if the bytes are available as one contiguous slice.
    pub fn has_array(&self) -> bool {
        self.contiguous().is_some()
    }

    /// Returns the contiguous backing slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedRepresentation`] when [`Self::has_array`]
    /// is `false`.
    pub fn array(&self) -> Result<&[u8]> {
        self.contiguous().ok_or(Error::UnsupportedRepresentation)
    }

    fn contiguous(&self) -> Option<&[u8]> {
        match self {
            Self::Empty => Some(&[][..]),
            Self::Array(bytes) => Some(&bytes[..]),
            Self::Text(text) => Some(&text.bytes[..]),
            Self::Buffer(view) => view.contiguous(),
            Self::Concat(_) | Self::Slice(_) => None,
        }
    }

    /// Materializes the bytes into new, exclusively owned array storage.
    ///
    /// This is the only operation guaranteed to detach the result from every
    /// buffer, rope or view the original references.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self::Array(Bytes::from(self.to_vec()))
    }

    /// Iterates the contiguous chunks that make up this sequence.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(self, 0, self.len())
    }

    /// Returns the contiguous run of bytes that starts at `pos`.
    pub(crate) fn chunk_at(&self, mut pos: usize) -> &[u8] {
        let mut seq = self;
        let mut end = self.len();
        loop {
            match seq {
                Self::Empty => return &[],
                Self::Array(bytes) => return &bytes[pos..end],
                Self::Text(text) => return &text.bytes[pos..end],
                Self::Buffer(view) => {
                    let chunk = view.buffer.chunk_at(view.offset + pos);
                    return &chunk[..chunk.len().min(end - pos)];
                }
                Self::Slice(view) => {
                    pos += view.offset;
                    end += view.offset;
                    seq = &*view.inner;
                }
                Self::Concat(rope) => {
                    let split = rope.head.len();
                    if pos < split {
                        end = end.min(split);
                        seq = &rope.head;
                    } else {
                        pos -= split;
                        end -= split;
                        seq = &rope.tail;
                    }
                }
            }
        }
    }

    /// Returns a [`bytes::Buf`] cursor over this sequence.
    pub fn reader(&self) -> SeqReader {
        SeqReader::new(self.clone())
    }

    /// Byte-wise equality, regardless of representation.
    pub fn content_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        match (self.contiguous(), other.contiguous()) {
            (Some(a), Some(b)) => a == b,
            _ => self.compare(other) == Ordering::Equal,
        }
    }

    /// Unsigned lexicographic comparison; a proper prefix sorts first.
    pub fn compare(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.contiguous(), other.contiguous()) {
            return a.cmp(b);
        }
        let (mut lhs, mut rhs) = (self.chunks(), other.chunks());
        let (mut a, mut b): (&[u8], &[u8]) = (&[], &[]);
        loop {
            if a.is_empty() {
                a = lhs.next().unwrap_or_default();
            }
            if b.is_empty() {
                b = rhs.next().unwrap_or_default();
            }
            match (a.is_empty(), b.is_empty()) {
                (true, true) => return Ordering::Equal,
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                (false, false) => {}
            }
            let n = a.len().min(b.len());
            match a[..n].cmp(&b[..n]) {
                Ordering::Equal => {
                    a = &a[n..];
                    b = &b[n..];
                }
                unequal => return unequal,
            }
        }
    }

    /// The charset this sequence was encoded with, if it is text.
    pub fn charset(&self) -> Option<Charset> {
        match self {
            Self::Text(text) => Some(text.charset),
            _ => None,
        }
    }

    /// Decodes the bytes as `charset`.
    ///
    /// Contiguous sequences decode in a single pass over the backing array;
    /// ropes, views and segmented buffers decode chunk by chunk. Both paths
    /// produce identical text.
    pub fn decode(&self, charset: Charset) -> String {
        if let Some(bytes) = self.contiguous() {
            return charset.decode(bytes);
        }
        let mut decoder = charset.decoder();
        for chunk in self.chunks() {
            decoder.push(chunk);
        }
        decoder.finish()
    }

    /// Copies the bytes into a new vector.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for chunk in self.chunks() {
            out.extend_from_slice(chunk);
        }
        out
    }

    /// Writes every chunk to `writer`, in order.
    ///
    /// # Errors
    ///
    /// Propagates the first I/O error from `writer`.
    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.chunks() {
            writer.write_all(chunk)?;
        }
        Ok(())
    }

    /// Appends every chunk to `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` does not have `len()` bytes of remaining capacity, as
    /// [`BufMut::put_slice`] does.
    pub fn copy_to_buf<B: BufMut>(&self, dst: &mut B) {
        for chunk in self.chunks() {
            dst.put_slice(chunk);
        }
    }
}

impl PartialEq for ByteSeq {
    fn eq(&self, other: &Self) -> bool {
        self.content_eq(other)
    }
}

impl Eq for ByteSeq {}

impl PartialEq<[u8]> for ByteSeq {
    fn eq(&self, other: &[u8]) -> bool {
        self.len() == other.len() && self.chunks().eq_bytes(other)
    }
}

impl PartialEq<&[u8]> for ByteSeq {
    fn eq(&self, other: &&[u8]) -> bool {
        *self == **other
    }
}

impl PartialEq<str> for ByteSeq {
    fn eq(&self, other: &str) -> bool {
        *self == *other.as_bytes()
    }
}

impl PartialEq<&str> for ByteSeq {
    fn eq(&self, other: &&str) -> bool {
        *self == *other.as_bytes()
    }
}

impl PartialOrd for ByteSeq {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteSeq {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl Hash for ByteSeq {
    // Hashes fixed-size blocks so chunk boundaries never leak into the hash.
    fn hash<H: Hasher>(&self, state: &mut H) {
        const BLOCK: usize = 64;
        state.write_usize(self.len());
        let mut block = [0_u8; BLOCK];
        let mut filled = 0;
        for mut chunk in self.chunks() {
            while !chunk.is_empty() {
                let n = (BLOCK - filled).min(chunk.len());
                block[filled..filled + n].copy_from_slice(&chunk[..n]);
                filled += n;
                chunk = &chunk[n..];
                if filled == BLOCK {
                    state.write(&block);
                    filled = 0;
                }
            }
        }
        state.write(&block[..filled]);
    }
}

impl fmt::Display for ByteSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.decode(self.charset().unwrap_or_default()))
    }
}

impl fmt::Debug for ByteSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Empty => "Empty",
            Self::Array(_) => "Array",
            Self::Buffer(_) => "Buffer",
            Self::Text(_) => "Text",
            Self::Concat(_) => "Concat",
            Self::Slice(_) => "Slice",
        };
        write!(f, "{variant}(b\"")?;
        for chunk in self.chunks() {
            for &b in chunk {
                write!(f, "{}", core::ascii::escape_default(b))?;
            }
        }
        f.write_str("\")")
    }
}

impl From<&'static [u8]> for ByteSeq {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from_static(bytes)
    }
}

impl From<&'static str> for ByteSeq {
    fn from(text: &'static str) -> Self {
        Self::Text(Text {
            bytes: Bytes::from_static(text.as_bytes()),
            charset: Charset::Utf8,
        })
    }
}

impl From<String> for ByteSeq {
    fn from(text: String) -> Self {
        Self::utf8(text)
    }
}

impl From<Vec<u8>> for ByteSeq {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

impl From<Bytes> for ByteSeq {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl FromIterator<ByteSeq> for ByteSeq {
    fn from_iter<I: IntoIterator<Item = ByteSeq>>(iter: I) -> Self {
        Self::concat_all(iter)
    }
}

trait ChunksExt {
    fn eq_bytes(self, other: &[u8]) -> bool;
}

impl ChunksExt for Chunks<'_> {
    fn eq_bytes(self, mut other: &[u8]) -> bool {
        for chunk in self {
            match other.split_at_checked(chunk.len()) {
                Some((head, rest)) if head == chunk => other = rest,
                _ => return false,
            }
        }
        other.is_empty()
    }
}
