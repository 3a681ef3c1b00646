//! Fuzzes wide-string decoding with arbitrary native buffers.
//!
//! Device strings arrive from the native layer as raw `wchar_t` arrays that
//! may hold surrogates, out-of-range values or no terminator at all. Both
//! decoding modes must accept every such buffer.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_wide_decode
#![no_main]
use hidbridge::codec::wide_len;
use hidbridge::{StringCodec, StringDecoding, WideChar};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let wide: Vec<WideChar> = data
        .chunks_exact(4)
        .map(|c| WideChar::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let len = wide_len(&wide);

    let unicode = StringCodec::new(StringDecoding::Unicode).decode_buffer(&wide);
    assert_eq!(unicode.chars().count(), len);

    let latin1 = StringCodec::new(StringDecoding::Latin1Truncate).decode_buffer(&wide);
    assert_eq!(latin1.chars().count(), len);
    assert!(latin1.chars().all(|c| u32::from(c) <= 0xFF));
});
