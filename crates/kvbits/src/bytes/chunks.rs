use std::io::IoSlice;

use bytes::Buf;

use crate::bytes::ByteSeq;

#[derive(Clone, Copy)]
struct Frame<'a> {
    seq: &'a ByteSeq,
    start: usize,
    end: usize,
}

/// Iterator over the contiguous chunks of a [`ByteSeq`], in order.
///
/// Traversal keeps its own stack, so rope depth never translates into call
/// depth. Empty chunks are never yielded.
#[derive(Clone)]
pub struct Chunks<'a> {
    // The next frame to visit; kept outside `stack` so that leaf sequences
    // iterate without allocating.
    top: Option<Frame<'a>>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(seq: &'a ByteSeq, start: usize, end: usize) -> Self {
        Self {
            top: Some(Frame { seq, start, end }),
            stack: Vec::new(),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        loop {
            let Frame { seq, start, end } = match self.top.take() {
                Some(frame) => frame,
                None => self.stack.pop()?,
            };
            if start >= end {
                continue;
            }
            match seq {
                ByteSeq::Empty => {}
                ByteSeq::Array(bytes) => return Some(&bytes[start..end]),
                ByteSeq::Text(text) => return Some(&text.bytes[start..end]),
                ByteSeq::Buffer(view) => {
                    let chunk = view.buffer.chunk_at(view.offset + start);
                    let take = chunk.len().min(end - start);
                    if take == 0 {
                        continue;
                    }
                    if start + take < end {
                        self.top = Some(Frame {
                            seq,
                            start: start + take,
                            end,
                        });
                    }
                    return Some(&chunk[..take]);
                }
                ByteSeq::Slice(view) => {
                    self.top = Some(Frame {
                        seq: &view.inner,
                        start: view.offset + start,
                        end: view.offset + end,
                    });
                }
                ByteSeq::Concat(rope) => {
                    let split = rope.head.len();
                    if end > split {
                        self.stack.push(Frame {
                            seq: &rope.tail,
                            start: start.max(split) - split,
                            end: end - split,
                        });
                    }
                    if start < split {
                        self.top = Some(Frame {
                            seq: &rope.head,
                            start,
                            end: end.min(split),
                        });
                    }
                }
            }
        }
    }
}

/// A [`Buf`] cursor over a [`ByteSeq`].
///
/// `chunks_vectored` exposes the underlying chunks directly, so a rope can be
/// handed to a vectored writer without flattening it first.
#[derive(Clone, Debug)]
pub struct SeqReader {
    seq: ByteSeq,
    pos: usize,
}

impl SeqReader {
    pub(crate) const fn new(seq: ByteSeq) -> Self {
        Self { seq, pos: 0 }
    }

    /// Bytes consumed so far.
    pub const fn position(&self) -> usize {
        self.pos
    }

    pub fn into_inner(self) -> ByteSeq {
        self.seq
    }
}

impl Buf for SeqReader {
    fn remaining(&self) -> usize {
        self.seq.len() - self.pos
    }

    fn chunk(&self) -> &[u8] {
        if self.pos >= self.seq.len() {
            &[]
        } else {
            self.seq.chunk_at(self.pos)
        }
    }

    fn advance(&mut self, cnt: usize) {
        assert!(
            cnt <= self.remaining(),
            "cannot advance {cnt} bytes with {} remaining",
            self.remaining()
        );
        self.pos += cnt;
    }

    fn chunks_vectored<'a>(&'a self, dst: &mut [IoSlice<'a>]) -> usize {
        let mut filled = 0;
        let chunks = Chunks::new(&self.seq, self.pos, self.seq.len());
        for (slot, chunk) in dst.iter_mut().zip(chunks) {
            *slot = IoSlice::new(chunk);
            filled += 1;
        }
        filled
    }
}
