use core::{fmt, mem, str::FromStr};

use crate::error::{Error, Result};

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Character sets a [`ByteSeq`] can be encoded from and decoded into.
///
/// Malformed input never fails to decode: every invalid or truncated unit is
/// replaced with U+FFFD, following [`String::from_utf8_lossy`] for UTF-8 and
/// [`char::decode_utf16`] for UTF-16.
///
/// [`ByteSeq`]: crate::bytes::ByteSeq
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    /// 7-bit US-ASCII. Unmappable characters encode as `?`.
    Ascii,
    /// ISO-8859-1. Unmappable characters encode as `?`.
    Latin1,
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
}

impl Charset {
    /// Canonical IANA name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ascii => "US-ASCII",
            Self::Latin1 => "ISO-8859-1",
            Self::Utf8 => "UTF-8",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
        }
    }

    /// Encodes `text` into a freshly allocated byte vector.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }

    /// Decodes one contiguous slice in a single pass.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Ascii => bytes.iter().map(|&b| ascii_char(b)).collect(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Utf16Be | Self::Utf16Le => {
                let pairs = bytes.chunks_exact(2);
                let odd = !pairs.remainder().is_empty();
                let units = pairs.map(|pair| self.unit([pair[0], pair[1]]));
                let mut out: String = char::decode_utf16(units)
                    .map(|r| r.unwrap_or(REPLACEMENT))
                    .collect();
                if odd {
                    out.push(REPLACEMENT);
                }
                out
            }
        }
    }

    /// Returns an incremental decoder for input that arrives in chunks.
    pub fn decoder(self) -> Decoder {
        Decoder {
            charset: self,
            out: String::new(),
            pending: Vec::new(),
            high_surrogate: None,
        }
    }

    fn unit(self, pair: [u8; 2]) -> u16 {
        match self {
            Self::Utf16Le => u16::from_le_bytes(pair),
            _ => u16::from_be_bytes(pair),
        }
    }
}

fn ascii_char(b: u8) -> char {
    if b.is_ascii() { char::from(b) } else { REPLACEMENT }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "US-ASCII" | "ASCII" => Ok(Self::Ascii),
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => Ok(Self::Latin1),
            "UTF-8" | "UTF8" => Ok(Self::Utf8),
            "UTF-16BE" => Ok(Self::Utf16Be),
            "UTF-16LE" => Ok(Self::Utf16Le),
            _ => Err(Error::InvalidArgument {
                reason: format!("unsupported charset {s:?}"),
            }),
        }
    }
}

/// Incremental decoder. Feeding the chunks of a sequence in order and then
/// calling [`Decoder::finish`] yields the same text as [`Charset::decode`] on
/// the concatenated bytes.
#[derive(Debug)]
pub struct Decoder {
    charset: Charset,
    out: String,
    // Bytes of a multi-byte unit split across chunks (at most 3).
    pending: Vec<u8>,
    high_surrogate: Option<u16>,
}

impl Decoder {
    /// Feeds the next chunk of input.
    pub fn push(&mut self, chunk: &[u8]) {
        match self.charset {
            Charset::Ascii => self.out.extend(chunk.iter().map(|&b| ascii_char(b))),
            Charset::Latin1 => self.out.extend(chunk.iter().map(|&b| char::from(b))),
            Charset::Utf8 => {
                if self.pending.is_empty() {
                    self.push_utf8(chunk);
                } else {
                    let mut joined = mem::take(&mut self.pending);
                    joined.extend_from_slice(chunk);
                    self.push_utf8(&joined);
                }
            }
            Charset::Utf16Be | Charset::Utf16Le => self.push_utf16(chunk),
        }
    }

    /// Flushes any truncated trailing unit and returns the decoded text.
    pub fn finish(mut self) -> String {
        if self.high_surrogate.take().is_some() {
            self.out.push(REPLACEMENT);
        }
        if !self.pending.is_empty() {
            self.out.push(REPLACEMENT);
        }
        self.out
    }

    fn push_utf8(&mut self, bytes: &[u8]) {
        let mut pieces = bytes.utf8_chunks().peekable();
        while let Some(piece) = pieces.next() {
            self.out.push_str(piece.valid());
            let invalid = piece.invalid();
            if invalid.is_empty() {
                continue;
            }
            let truncated = pieces.peek().is_none()
                && matches!(core::str::from_utf8(invalid), Err(e) if e.error_len().is_none());
            if truncated {
                self.pending.extend_from_slice(invalid);
            } else {
                self.out.push(REPLACEMENT);
            }
        }
    }

    fn push_utf16(&mut self, mut chunk: &[u8]) {
        if let Some(&first) = self.pending.first() {
            let Some((&second, rest)) = chunk.split_first() else {
                return;
            };
            self.pending.clear();
            self.push_unit(self.charset.unit([first, second]));
            chunk = rest;
        }
        let pairs = chunk.chunks_exact(2);
        self.pending.extend_from_slice(pairs.remainder());
        for pair in pairs {
            self.push_unit(self.charset.unit([pair[0], pair[1]]));
        }
    }

    fn push_unit(&mut self, unit: u16) {
        if let Some(high) = self.high_surrogate.take() {
            if (0xDC00..=0xDFFF).contains(&unit) {
                let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
                self.out.push(char::from_u32(code).unwrap_or(REPLACEMENT));
                return;
            }
            self.out.push(REPLACEMENT);
        }
        match unit {
            0xD800..=0xDBFF => self.high_surrogate = Some(unit),
            0xDC00..=0xDFFF => self.out.push(REPLACEMENT),
            _ => self
                .out
                .push(char::from_u32(u32::from(unit)).unwrap_or(REPLACEMENT)),
        }
    }
}
