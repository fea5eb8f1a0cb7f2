use core::cmp::Ordering;
use std::{
    collections::{VecDeque, hash_map::DefaultHasher},
    hash::{Hash, Hasher},
    io::IoSlice,
};

use bytes::{Buf, Bytes, BytesMut};
use proptest::prelude::*;

use crate::{
    bytes::{ByteBuffer, ByteSeq, Charset},
    error::Error,
};

/// A deliberately fragmented buffer: never contiguous once it has two parts.
struct Segments(Vec<Vec<u8>>);

impl ByteBuffer for Segments {
    fn len(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    fn chunk_at(&self, mut pos: usize) -> &[u8] {
        for part in &self.0 {
            if pos < part.len() {
                return &part[pos..];
            }
            pos -= part.len();
        }
        &[]
    }

    fn as_contiguous(&self) -> Option<&[u8]> {
        match self.0.as_slice() {
            [] => Some(&[][..]),
            [only] => Some(only.as_slice()),
            _ => None,
        }
    }
}

fn segmented(data: &[u8], width: usize) -> ByteSeq {
    ByteSeq::from_buffer(Segments(
        data.chunks(width.max(1)).map(<[u8]>::to_vec).collect(),
    ))
}

fn byte_rope(data: &[u8]) -> ByteSeq {
    data.iter()
        .rev()
        .fold(ByteSeq::Empty, |tail, &b| ByteSeq::from_vec(vec![b]).concat(tail))
}

/// Every representation of the same content.
fn variants(data: &[u8]) -> Vec<ByteSeq> {
    let mid = data.len() / 2;
    let latin1: String = data.iter().map(|&b| char::from(b)).collect();
    let padded = ByteSeq::from_static(b"<<")
        .concat(ByteSeq::copy_from_slice(data))
        .concat(ByteSeq::from_static(b">>"));
    vec![
        ByteSeq::from_vec(data.to_vec()),
        ByteSeq::from_buffer(Bytes::copy_from_slice(data)),
        ByteSeq::from_buffer(VecDeque::from(data.to_vec())),
        segmented(data, 3),
        ByteSeq::encode(&latin1, Charset::Latin1),
        ByteSeq::copy_from_slice(&data[..mid]).concat(ByteSeq::copy_from_slice(&data[mid..])),
        padded.sub_seq(2, 2 + data.len()).unwrap(),
        byte_rope(data),
    ]
}

fn hash_of(seq: &ByteSeq) -> u64 {
    let mut hasher = DefaultHasher::new();
    seq.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn copy_is_equal_and_detached() {
    let data = b"the quick brown fox";
    for seq in variants(data) {
        let copy = seq.copy();
        assert!(copy.content_eq(&seq), "{seq:?}");
        assert!(matches!(copy, ByteSeq::Array(_)));
        assert!(copy.has_array());
    }

    let mut backing = BytesMut::from(&data[..]);
    let copy = ByteSeq::copy_from_slice(&backing).copy();
    backing[0] = b'T';
    assert_eq!(copy, &data[..]);

    let original = ByteSeq::from_vec(data.to_vec());
    let copy = original.copy();
    assert_ne!(
        original.array().unwrap().as_ptr(),
        copy.array().unwrap().as_ptr()
    );
}

#[test]
fn concat_length_and_indexing() {
    let a = b"hello, ";
    let b = b"world";
    for lhs in variants(a) {
        for rhs in variants(b) {
            let joined = lhs.clone().concat(rhs.clone());
            assert_eq!(joined.len(), lhs.len() + rhs.len());
            for i in 0..joined.len() {
                let expected = if i < lhs.len() {
                    lhs.get(i)
                } else {
                    rhs.get(i - lhs.len())
                };
                assert_eq!(joined.get(i), expected);
            }
            assert_eq!(joined, &b"hello, world"[..]);
        }
    }
}

#[test]
fn concat_elides_empty_operands() {
    let seq = ByteSeq::from_static(b"abc");
    assert!(matches!(ByteSeq::EMPTY.concat(seq.clone()), ByteSeq::Array(_)));
    assert!(matches!(seq.concat(ByteSeq::empty()), ByteSeq::Array(_)));
}

#[test]
fn lexicographic_order() {
    for a in variants(&[1, 2, 3]) {
        for b in variants(&[1, 2, 4]) {
            assert_eq!(a.compare(&b), Ordering::Less);
            assert_eq!(b.compare(&a), Ordering::Greater);
        }
        for short in variants(&[1, 2]) {
            assert_eq!(short.compare(&a), Ordering::Less);
            assert!(short < a);
        }
    }
    let high = ByteSeq::from_static(&[0xFF]);
    let low = ByteSeq::from_static(&[0x01]);
    assert!(low < high, "bytes compare unsigned");
    assert_eq!(ByteSeq::EMPTY.compare(&ByteSeq::empty()), Ordering::Equal);
}

#[test]
fn equality_and_hash_ignore_representation() {
    let data: Vec<u8> = (0..200).map(|i| (i * 7) as u8).collect();
    let all = variants(&data);
    let expected = hash_of(&all[0]);
    for seq in &all {
        assert_eq!(seq, &all[0]);
        assert_eq!(hash_of(seq), expected, "{seq:?}");
    }
}

#[test]
fn get_out_of_bounds() {
    for seq in variants(b"abc") {
        assert_eq!(seq.get(2), Ok(b'c'));
        assert_eq!(
            seq.get(3),
            Err(Error::OutOfBounds {
                start: 3,
                end: 4,
                len: 3
            })
        );
        assert_eq!(
            seq.get(usize::MAX),
            Err(Error::OutOfBounds {
                start: usize::MAX,
                end: usize::MAX,
                len: 3
            })
        );
    }
}

#[cfg(target_pointer_width = "64")]
fn doubled(times: u32) -> ByteSeq {
    let mut seq = ByteSeq::from_static(b"x");
    for _ in 0..times {
        seq = seq.clone().concat(seq);
    }
    seq
}

#[cfg(target_pointer_width = "64")]
#[test]
fn try_concat_reports_length_overflow() {
    let huge = doubled(63);
    assert_eq!(huge.len(), 1 << 63);
    assert_eq!(
        huge.clone().try_concat(huge),
        Err(Error::LengthOverflow {
            head: 1 << 63,
            tail: 1 << 63
        })
    );
}

#[cfg(target_pointer_width = "64")]
#[test]
#[should_panic(expected = "overflows usize")]
fn concat_panics_on_length_overflow() {
    let huge = doubled(63);
    let _ = huge.clone().concat(huge);
}

#[test]
fn sub_seq_bounds_and_content() {
    let data = b"0123456789";
    for seq in variants(data) {
        assert_eq!(seq.sub_seq(2, 5).unwrap(), &data[2..5]);
        assert_eq!(seq.sub_seq(0, 10).unwrap(), &data[..]);
        assert!(seq.sub_seq(4, 4).unwrap().is_empty());
        assert!(matches!(seq.sub_seq(3, 2), Err(Error::OutOfBounds { .. })));
        assert!(matches!(seq.sub_seq(0, 11), Err(Error::OutOfBounds { .. })));

        let nested = seq.sub_seq(1, 9).unwrap().sub_seq(2, 6).unwrap();
        assert_eq!(nested, &data[3..7]);
        assert_eq!(nested.get(0), Ok(b'3'));
    }
}

#[test]
fn sub_seq_of_view_collapses_onto_delegate() {
    let rope = ByteSeq::from_static(b"abc").concat(ByteSeq::from_static(b"def"));
    let view = rope.sub_seq(1, 5).unwrap();
    let inner = view.sub_seq(1, 3).unwrap();
    match (&view, &inner) {
        (ByteSeq::Slice(outer), ByteSeq::Slice(nested)) => {
            assert!(std::sync::Arc::ptr_eq(&outer.inner, &nested.inner));
            assert_eq!(nested.offset, 2);
        }
        other => panic!("unexpected variants: {other:?}"),
    }
    assert_eq!(inner, &b"cd"[..]);
}

#[test]
fn array_access_requires_contiguous_backing() {
    let rope = ByteSeq::from_static(b"ab").concat(ByteSeq::from_static(b"cd"));
    assert!(!rope.has_array());
    assert_eq!(rope.array(), Err(Error::UnsupportedRepresentation));

    let fragmented = segmented(b"abcd", 2);
    assert!(!fragmented.has_array());
    assert_eq!(fragmented.array(), Err(Error::UnsupportedRepresentation));

    let buffered = ByteSeq::from_buffer(b"abcd".to_vec());
    assert!(buffered.has_array());
    assert_eq!(buffered.sub_seq(1, 3).unwrap().array(), Ok(&b"bc"[..]));

    assert_eq!(ByteSeq::EMPTY.array(), Ok(&b""[..]));
}

#[test]
fn deep_right_leaning_rope() {
    const DEPTH: usize = 100_000;
    let data: Vec<u8> = (0..DEPTH).map(|i| (i % 251) as u8).collect();
    let rope = byte_rope(&data);

    assert_eq!(rope.len(), DEPTH);
    assert_eq!(rope.get(DEPTH - 1), Ok(data[DEPTH - 1]));
    assert_eq!(rope.chunks().count(), DEPTH);
    assert_eq!(rope.to_vec(), data);
    assert_eq!(rope.compare(&ByteSeq::from_vec(data.clone())), Ordering::Equal);
    assert_eq!(rope.sub_seq(10, 20).unwrap(), &data[10..20]);
    drop(rope);
}

#[test]
fn deep_left_leaning_rope() {
    const DEPTH: usize = 100_000;
    let rope = ByteSeq::concat_all((0..DEPTH).map(|_| ByteSeq::from_static(b"x")));
    assert_eq!(rope.len(), DEPTH);
    assert_eq!(rope.get(0), Ok(b'x'));
    assert_eq!(rope.chunks().map(<[u8]>::len).sum::<usize>(), DEPTH);
    let view = rope.sub_seq(1, DEPTH - 1).unwrap();
    drop(rope);
    assert_eq!(view.len(), DEPTH - 2);
    drop(view);
}

#[test]
fn shared_subtrees_survive_parent_drop() {
    let shared = ByteSeq::from_static(b"ab").concat(ByteSeq::from_static(b"cd"));
    let parent = shared.clone().concat(ByteSeq::from_static(b"ef"));
    drop(parent);
    assert_eq!(shared, &b"abcd"[..]);
}

#[test]
fn chunks_are_restartable() {
    let seq = segmented(b"abcdefgh", 3).concat(ByteSeq::from_static(b"ij"));
    let first: Vec<&[u8]> = seq.chunks().collect();
    let second: Vec<&[u8]> = seq.chunks().collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![&b"abc"[..], &b"def"[..], &b"gh"[..], &b"ij"[..]]);
}

#[test]
fn decode_paths_agree() {
    let samples: Vec<(Charset, Vec<u8>)> = vec![
        (Charset::Utf8, "héllo wörld 😀 ✓".as_bytes().to_vec()),
        (Charset::Utf8, vec![b'a', 0xF0, 0x9F, b'b', 0xE2, 0x82, 0xAC, 0xC3]),
        (Charset::Utf8, vec![0xED, 0xA0, 0x80, 0xFF, 0xC0, 0xAF, 0xE0]),
        (Charset::Utf16Be, Charset::Utf16Be.encode("a😀b")),
        (Charset::Utf16Le, Charset::Utf16Le.encode("ü😀")),
        (Charset::Utf16Be, vec![0xD8, 0x3D, 0x00, 0x41, 0xDC, 0x00, 0xD8]),
        (Charset::Utf16Le, vec![0x3D, 0xD8, 0x3D, 0xD8, 0x00, 0xDE]),
        (Charset::Ascii, vec![b'o', b'k', 0x80, 0xFF]),
        (Charset::Latin1, vec![b'a', 0xE9, 0xFF]),
    ];
    for (charset, data) in samples {
        let expected = charset.decode(&data);
        for width in 1..=4 {
            assert_eq!(segmented(&data, width).decode(charset), expected, "{charset} width {width}");
        }
        assert_eq!(byte_rope(&data).decode(charset), expected, "{charset} rope");
    }
}

#[test]
fn decode_matches_std_lossy() {
    let data = [b'x', 0xF0, 0x9F, 0x98, b'y', 0xE2, 0x82];
    assert_eq!(
        byte_rope(&data).decode(Charset::Utf8),
        String::from_utf8_lossy(&data)
    );
}

#[test]
fn text_remembers_charset() {
    let latin = ByteSeq::encode("café", Charset::Latin1);
    assert_eq!(latin.len(), 4);
    assert_eq!(latin.charset(), Some(Charset::Latin1));
    assert_eq!(latin.to_string(), "café");
    assert_eq!(latin.decode(Charset::Utf8), "caf\u{FFFD}");

    let ascii = ByteSeq::ascii("naïve");
    assert_eq!(ascii, "na?ve");

    let wide = ByteSeq::encode("hi", Charset::Utf16Le);
    assert_eq!(wide, &[b'h', 0, b'i', 0][..]);
    assert_eq!(wide.to_string(), "hi");

    assert_eq!(ByteSeq::from("plain").charset(), Some(Charset::Utf8));
    assert_eq!(ByteSeq::from_static(b"raw").charset(), None);
}

#[test]
fn charset_names_round_trip() {
    for charset in [
        Charset::Ascii,
        Charset::Latin1,
        Charset::Utf8,
        Charset::Utf16Be,
        Charset::Utf16Le,
    ] {
        assert_eq!(charset.name().parse::<Charset>(), Ok(charset));
    }
    assert!("EBCDIC".parse::<Charset>().is_err());
}

#[test]
fn reader_exposes_chunks_for_vectored_writes() {
    let seq = ByteSeq::from_static(b"SET ")
        .concat(ByteSeq::from("key"))
        .concat(ByteSeq::from_static(b" value"));
    let mut reader = seq.reader();

    let mut slots = [IoSlice::new(&[]); 8];
    let filled = reader.chunks_vectored(&mut slots);
    assert_eq!(filled, 3);
    assert_eq!(&*slots[1], b"key");

    assert_eq!(reader.chunk(), b"SET ");
    reader.advance(5);
    assert_eq!(reader.chunk(), b"ey");
    assert_eq!(reader.copy_to_bytes(reader.remaining()), &b"ey value"[..]);
    assert_eq!(reader.position(), seq.len());
    assert!(reader.chunk().is_empty());
}

#[test]
fn write_to_and_copy_to_buf() {
    let seq = segmented(b"scatter gather", 4).concat(ByteSeq::from_static(b"!"));
    let mut out = Vec::new();
    seq.write_to(&mut out).unwrap();
    assert_eq!(out, b"scatter gather!");

    let mut buf = BytesMut::new();
    seq.copy_to_buf(&mut buf);
    assert_eq!(&buf[..], b"scatter gather!");
}

#[test]
fn debug_escapes_bytes() {
    let seq = ByteSeq::from_static(b"a\n\xff");
    assert_eq!(format!("{seq:?}"), "Array(b\"a\\n\\xff\")");
}

proptest! {
    #[test]
    fn prop_concat_law(a in prop::collection::vec(any::<u8>(), 0..64),
                       b in prop::collection::vec(any::<u8>(), 0..64)) {
        let joined = segmented(&a, 5).concat(byte_rope(&b));
        prop_assert_eq!(joined.len(), a.len() + b.len());
        for i in 0..joined.len() {
            let expected = if i < a.len() { a[i] } else { b[i - a.len()] };
            prop_assert_eq!(joined.get(i), Ok(expected));
        }
    }

    #[test]
    fn prop_compare_matches_slices(a in prop::collection::vec(any::<u8>(), 0..32),
                                   b in prop::collection::vec(any::<u8>(), 0..32)) {
        let lhs = byte_rope(&a);
        let rhs = segmented(&b, 3);
        prop_assert_eq!(lhs.compare(&rhs), a.cmp(&b));
        prop_assert_eq!(lhs == rhs, a == b);
    }

    #[test]
    fn prop_decode_paths_agree(data in prop::collection::vec(any::<u8>(), 0..48),
                               width in 1_usize..6) {
        for charset in [Charset::Utf8, Charset::Utf16Be, Charset::Utf16Le, Charset::Ascii] {
            prop_assert_eq!(segmented(&data, width).decode(charset), charset.decode(&data));
        }
    }
}
