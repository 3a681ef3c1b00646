//! Fuzzes session reads and writes against scripted native outcomes.
//!
//! Each input byte picks the next native result (data, timeout, error or a
//! short write). The session must map every status without panicking and
//! never return more bytes than requested.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_session_io
#![no_main]
use hidbridge::mock::{MockDevice, MockHidBackend, MockRead, MockWrite};
use hidbridge::{HidContext, HidError, ReadOutcome};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let device = MockDevice::new(0x046D, 0xC24F, "/dev/hidraw0");
    let backend = MockHidBackend::new();
    backend.add_device(device.clone());
    let mut ctx = HidContext::new(backend);
    if ctx.init().is_err() {
        return;
    }
    let Ok(mut session) = ctx.open(0x046D, 0xC24F) else {
        return;
    };

    for (i, &byte) in data.iter().enumerate() {
        let len = usize::from(byte % 64);
        match byte >> 6 {
            0 => {
                let bytes = data.iter().skip(i).take(len).copied().collect();
                device.queue_read(MockRead::Data(bytes));
            }
            1 => device.queue_read(MockRead::Timeout),
            2 => device.queue_read(MockRead::Error(None)),
            _ => device.queue_write(MockWrite::Short(len)),
        }

        if byte >> 6 == 3 {
            let report = vec![byte; 32];
            match session.write(&report) {
                Ok(()) | Err(HidError::ShortWrite { .. }) => {}
                Err(e) => panic!("unexpected write error: {e}"),
            }
        } else {
            let num_bytes = usize::from(byte % 16) + 1;
            if let Ok(ReadOutcome::Data(bytes)) = session.read_timeout(num_bytes, 0) {
                assert!(bytes.len() <= num_bytes);
                assert!(!bytes.is_empty());
            }
        }
    }
    session.close();
});
