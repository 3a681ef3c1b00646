//! Wide-character string bridge.
//!
//! Native HID stacks hand out device strings as NUL-terminated `wchar_t`
//! sequences. This module turns them into host strings and back. Wide
//! characters are treated as UTF-32 code units (the `wchar_t` layout on Linux
//! and macOS); backends on platforms with 16-bit `wchar_t` widen before
//! handing strings over.

use serde::{Deserialize, Serialize};

/// One native wide character.
pub type WideChar = u32;

/// Wide-string terminator.
pub const WIDE_NUL: WideChar = 0;

/// How wide characters are converted to host characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringDecoding {
    /// Each wide character is a Unicode scalar value. Values that are not
    /// (surrogates, out of range) become U+FFFD.
    #[default]
    Unicode,
    /// Keep only the low 8 bits of every character and read them as Latin-1.
    ///
    /// Lossy above U+00FF: U+0141 comes out as `'A'`. Only for callers that
    /// need byte-for-byte compatibility with ASCII-only transliteration.
    Latin1Truncate,
}

/// Stateless wide-string decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StringCodec {
    decoding: StringDecoding,
}

impl StringCodec {
    /// Codec using the given decoding mode.
    #[must_use]
    pub const fn new(decoding: StringDecoding) -> Self {
        Self { decoding }
    }

    /// Decoding mode in use.
    #[must_use]
    pub const fn decoding(&self) -> StringDecoding {
        self.decoding
    }

    /// Decode an optional native string. `None` is an absent string and
    /// decodes to `""`.
    #[must_use]
    pub fn decode(&self, wide: Option<&[WideChar]>) -> String {
        wide.map(|w| self.decode_buffer(w)).unwrap_or_default()
    }

    /// Decode a wide buffer up to its first NUL, or its full length if it
    /// holds none.
    #[must_use]
    pub fn decode_buffer(&self, buf: &[WideChar]) -> String {
        let len = wide_len(buf);
        buf.iter()
            .take(len)
            .map(|&c| self.decode_char(c))
            .collect()
    }

    fn decode_char(&self, c: WideChar) -> char {
        match self.decoding {
            StringDecoding::Unicode => char::from_u32(c).unwrap_or(char::REPLACEMENT_CHARACTER),
            StringDecoding::Latin1Truncate => truncate_to_latin1(c),
        }
    }
}

/// Length of a wide string: index of the first NUL, bounded by the slice.
#[must_use]
pub fn wide_len(buf: &[WideChar]) -> usize {
    buf.iter().position(|&c| c == WIDE_NUL).unwrap_or(buf.len())
}

/// Low 8 bits of `c`, read as a Latin-1 character.
#[must_use]
pub fn truncate_to_latin1(c: WideChar) -> char {
    let [low, ..] = c.to_le_bytes();
    char::from(low)
}

/// Encode a host string as a NUL-terminated wide string.
#[must_use]
pub fn encode_wide(s: &str) -> Vec<WideChar> {
    s.chars()
        .map(WideChar::from)
        .chain(std::iter::once(WIDE_NUL))
        .collect()
}

/// Copy `s` into `buf` as a wide string, truncated to leave room for the
/// terminator. Returns the number of characters written before the NUL.
///
/// An empty `buf` receives nothing.
pub fn encode_wide_into(s: &str, buf: &mut [WideChar]) -> usize {
    let Some((terminator, body)) = buf.split_last_mut() else {
        return 0;
    };
    let mut written = 0;
    for (slot, c) in body.iter_mut().zip(s.chars()) {
        *slot = WideChar::from(c);
        written += 1;
    }
    match body.get_mut(written) {
        Some(slot) => *slot = WIDE_NUL,
        None => *terminator = WIDE_NUL,
    }
    written
}
