// ABOUTME: Big-endian UTF-16 text buffers in the layout libGammu uses for numbers and message text
// ABOUTME: Converts UTF-8 input into native buffers and decides when a message needs Unicode coding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Text in libGammu's "unicode" layout: big-endian UTF-16 code units.
///
/// The native library terminates these buffers with a double NUL. The
/// terminator is not stored here; [`UnicodeString::to_nul_terminated`] adds it
/// when a buffer is handed to C.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct UnicodeString {
    data: Bytes,
}

impl UnicodeString {
    /// Encodes UTF-8 text. Characters outside the BMP become surrogate pairs.
    pub fn encode(text: &str) -> Self {
        let mut buf = BytesMut::with_capacity(text.len() * 2);
        for unit in text.encode_utf16() {
            buf.put_u16(unit);
        }
        Self { data: buf.freeze() }
    }

    /// Builds a string from big-endian UTF-16 bytes as found in native structs.
    ///
    /// Reading stops at the first NUL code unit. A trailing odd byte is ignored.
    pub fn from_be_bytes(raw: &[u8]) -> Self {
        let end = raw
            .chunks_exact(2)
            .position(|pair| pair == [0, 0])
            .map_or(raw.len() & !1, |units| units * 2);
        Self {
            data: Bytes::copy_from_slice(&raw[..end]),
        }
    }

    /// Builds a string from already encoded code units
    pub fn from_units(units: &[u16]) -> Self {
        let mut buf = BytesMut::with_capacity(units.len() * 2);
        for unit in units {
            buf.put_u16(*unit);
        }
        Self { data: buf.freeze() }
    }

    /// Wraps an 8-bit payload as is. NUL bytes are kept.
    pub fn from_raw(raw: &[u8]) -> Self {
        Self {
            data: Bytes::copy_from_slice(raw),
        }
    }

    /// Raw big-endian bytes, without terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copy of the buffer followed by the two-byte NUL terminator
    pub fn to_nul_terminated(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() + 2);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&[0, 0]);
        out
    }

    /// Iterates over the UTF-16 code units
    pub fn units(&self) -> impl Iterator<Item = u16> + '_ {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
    }

    /// Number of UTF-16 code units
    pub fn len(&self) -> usize {
        self.data.len() / 2
    }

    /// Returns true if the string holds no code units
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decodes back to UTF-8, replacing unpaired surrogates
    pub fn to_string_lossy(&self) -> String {
        char::decode_utf16(self.units())
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}

impl From<&str> for UnicodeString {
    fn from(text: &str) -> Self {
        Self::encode(text)
    }
}

impl fmt::Display for UnicodeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for UnicodeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnicodeString({:?})", self.to_string_lossy())
    }
}

/// Returns true if any character lies above 7-bit ASCII.
///
/// Such text has to go out with 16-bit Unicode coding.
pub fn needs_unicode(text: &str) -> bool {
    text.chars().any(|c| u32::from(c) > 0x7F)
}
