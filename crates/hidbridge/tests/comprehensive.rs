//! Comprehensive tests for the hidbridge crate.
//!
//! Covers the library lifecycle, enumeration snapshots, session opening,
//! timed reads, writes, live string queries, error messages and closing,
//! all against the in-memory mock backend.

use hidbridge::codec::encode_wide;
use hidbridge::mock::{MockDevice, MockHidBackend, MockRead, MockWrite};
use hidbridge::prelude::*;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn wheel() -> MockDevice {
    MockDevice::new(0x046D, 0xC24F, "/dev/hidraw0")
        .with_manufacturer("Logitech")
        .with_product("G29 Driving Force Racing Wheel")
        .with_serial("LGT-0001")
        .with_release_number(0x8900)
        .with_usage(0x01, 0x04)
        .with_interface_number(0)
}

fn pedals() -> MockDevice {
    MockDevice::new(0x30B7, 0x1001, "/dev/hidraw1")
        .with_manufacturer("Heusinkveld")
        .with_product("Sprint Pedals")
}

type ReadyContext = (MockHidBackend, HidContext<MockHidBackend>);

fn ready_context(devices: &[MockDevice]) -> Result<ReadyContext, HidError> {
    let backend = MockHidBackend::new();
    for device in devices {
        backend.add_device(device.clone());
    }
    let mut ctx = HidContext::new(backend.clone());
    ctx.init()?;
    Ok((backend, ctx))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn enumerate_before_init_is_programming_error() {
    let backend = MockHidBackend::new();
    backend.add_device(wheel());
    let mut ctx = HidContext::new(backend.clone());

    let err = ctx.enumerate(0, 0);

    assert!(matches!(err, Err(HidError::NotInitialized { .. })));
    assert!(err.is_err_and(|e| e.class() == ErrorClass::Programming));
    assert_eq!(backend.enumerations(), 0);
}

#[test]
fn open_before_init_never_reaches_native_layer() {
    let backend = MockHidBackend::new();
    backend.add_device(wheel());
    let mut ctx = HidContext::new(backend.clone());

    assert!(ctx.open(0x046D, 0xC24F).is_err_and(|e| e.is_programming_error()));
    assert!(ctx.open_path("/dev/hidraw0").is_err_and(|e| e.is_programming_error()));
    assert_eq!(backend.open_calls(), 0);
}

#[test]
fn operations_after_shutdown_fail() -> TestResult {
    let (backend, mut ctx) = ready_context(&[wheel()])?;
    ctx.shutdown();

    assert_eq!(ctx.state(), LifecycleState::ShutDown);
    assert_eq!(backend.exit_calls(), 1);
    assert!(matches!(
        ctx.enumerate(0, 0),
        Err(HidError::AlreadyShutDown { .. })
    ));
    assert!(matches!(
        ctx.open(0x046D, 0xC24F),
        Err(HidError::AlreadyShutDown { .. })
    ));
    assert!(matches!(ctx.init(), Err(HidError::AlreadyShutDown { .. })));
    assert_eq!(backend.init_calls(), 1);
    Ok(())
}

#[test]
fn failed_init_reports_native_reason() {
    let backend = MockHidBackend::new();
    backend.fail_init("libusb unavailable");
    let mut ctx = HidContext::new(backend);

    let err = ctx.init();

    assert_eq!(
        err,
        Err(HidError::InitFailed("libusb unavailable".to_string()))
    );
    assert!(err.is_err_and(|e| e.class() == ErrorClass::Operational));
    assert_eq!(ctx.state(), LifecycleState::Uninitialized);
}

#[test]
fn dropping_ready_context_exits_library() -> TestResult {
    let (backend, ctx) = ready_context(&[])?;
    drop(ctx);
    assert_eq!(backend.exit_calls(), 1);
    Ok(())
}

#[test]
fn sessions_outlive_shutdown() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;
    ctx.shutdown();

    session.write(&[0x00, 0x01])?;
    assert_eq!(device.write_calls(), 1);
    Ok(())
}

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

#[test]
fn enumerate_all_returns_every_device() -> TestResult {
    let (backend, mut ctx) = ready_context(&[wheel(), pedals()])?;

    let devices = ctx.enumerate(0, 0)?;

    assert_eq!(devices.len(), 2);
    let g29 = &devices[0];
    assert_eq!(g29.path(), "/dev/hidraw0");
    assert_eq!(g29.vendor_id(), 0x046D);
    assert_eq!(g29.product_id(), 0xC24F);
    assert_eq!(g29.manufacturer(), "Logitech");
    assert_eq!(g29.product(), "G29 Driving Force Racing Wheel");
    assert_eq!(g29.serial_number(), "LGT-0001");
    assert_eq!(g29.release_number(), 0x8900);
    assert_eq!(g29.usage_page(), 0x01);
    assert_eq!(g29.usage(), 0x04);
    assert_eq!(g29.interface_number(), 0);
    assert_eq!(devices[1].product(), "Sprint Pedals");
    assert_eq!(backend.lists_released(), 1);
    Ok(())
}

#[test]
fn enumerate_with_no_devices_is_empty_not_error() -> TestResult {
    let (backend, mut ctx) = ready_context(&[])?;

    let devices = ctx.enumerate(0, 0)?;

    assert!(devices.is_empty());
    assert_eq!(backend.enumerations(), 1);
    assert_eq!(backend.lists_released(), 1);
    Ok(())
}

#[test]
fn enumerate_filters_by_vendor_and_product() -> TestResult {
    let (_backend, mut ctx) = ready_context(&[wheel(), pedals()])?;

    let by_vendor = ctx.enumerate(0x30B7, 0)?;
    assert_eq!(by_vendor.len(), 1);
    assert_eq!(by_vendor[0].manufacturer(), "Heusinkveld");

    let by_pair = ctx.enumerate(0x046D, 0xC24F)?;
    assert_eq!(by_pair.len(), 1);

    let none = ctx.enumerate(0xDEAD, 0xBEEF)?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn enumerate_failure_is_whole() -> TestResult {
    let (backend, mut ctx) = ready_context(&[wheel()])?;
    backend.fail_enumeration("udev unavailable");

    let err = ctx.enumerate(0, 0);

    assert_eq!(
        err,
        Err(HidError::EnumerationFailed("udev unavailable".to_string()))
    );
    Ok(())
}

#[test]
fn enumerate_returns_fresh_snapshots() -> TestResult {
    let (backend, mut ctx) = ready_context(&[wheel(), pedals()])?;
    let before = ctx.enumerate(0, 0)?;

    backend.remove_device("/dev/hidraw1");
    let after = ctx.enumerate(0, 0)?;

    assert_eq!(before.len(), 2);
    assert_eq!(after.len(), 1);
    assert_eq!(backend.lists_released(), 2);
    Ok(())
}

#[test]
fn missing_path_gets_sentinel_and_cannot_be_opened() -> TestResult {
    let (backend, mut ctx) = ready_context(&[pedals().without_path()])?;

    let devices = ctx.enumerate(0, 0)?;
    assert_eq!(devices[0].path(), "?");
    assert!(!devices[0].has_path());

    let err = ctx.open_descriptor(&devices[0]).map(|_| ());
    assert!(matches!(err, Err(HidError::OpenFailed { .. })));
    assert_eq!(backend.open_calls(), 0);
    Ok(())
}

#[test]
fn custom_missing_path_sentinel() -> TestResult {
    let backend = MockHidBackend::new();
    backend.add_device(pedals().without_path());
    let config = HidConfig::builder().missing_path("<no path>").build()?;
    let mut ctx = HidContext::with_config(backend, config)?;
    ctx.init()?;

    let devices = ctx.enumerate(0, 0)?;
    assert_eq!(devices[0].path(), "<no path>");
    Ok(())
}

#[test]
fn latin1_mode_truncates_device_strings() -> TestResult {
    let backend = MockHidBackend::new();
    backend.add_device(
        MockDevice::new(0x1FC9, 0x804C, "/dev/hidraw2")
            .with_raw_string(StringKind::Manufacturer, encode_wide("Łódź")),
    );
    let config = HidConfig::builder()
        .string_decoding(StringDecoding::Latin1Truncate)
        .build()?;
    let mut ctx = HidContext::with_config(backend, config)?;
    ctx.init()?;

    let devices = ctx.enumerate(0, 0)?;

    // Ł (U+0141) -> 0x41, ó (U+00F3) kept, d kept, ź (U+017A) -> 0x7A
    assert_eq!(devices[0].manufacturer(), "A\u{f3}dz");
    Ok(())
}

#[test]
fn unicode_mode_keeps_device_strings() -> TestResult {
    let device = MockDevice::new(0x1FC9, 0x804C, "/dev/hidraw2").with_manufacturer("Łódź");
    let (_backend, mut ctx) = ready_context(&[device])?;

    let devices = ctx.enumerate(0, 0)?;

    assert_eq!(devices[0].manufacturer(), "Łódź");
    Ok(())
}

// ---------------------------------------------------------------------------
// Opening
// ---------------------------------------------------------------------------

#[test]
fn open_unknown_ids_names_them() -> TestResult {
    let (_backend, mut ctx) = ready_context(&[wheel()])?;

    let err = ctx.open(0xDEAD, 0xBEEF).map(|_| ());

    let Err(err) = err else {
        return Err("open of unknown device succeeded".into());
    };
    assert_eq!(err.class(), ErrorClass::Operational);
    let message = err.to_string();
    assert!(message.contains("vendor 0xDEAD, product 0xBEEF"), "{message}");
    Ok(())
}

#[test]
fn open_path_unknown_names_path() -> TestResult {
    let (_backend, mut ctx) = ready_context(&[wheel()])?;

    let err = ctx.open_path("/dev/hidraw9").map(|_| ());

    assert!(err.is_err_and(|e| e.to_string().contains("path /dev/hidraw9")));
    Ok(())
}

#[test]
fn open_by_descriptor_path() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone(), pedals()])?;

    let devices = ctx.enumerate(0x046D, 0)?;
    let session = ctx.open_descriptor(&devices[0])?;

    assert!(session.is_open());
    assert_eq!(
        session.target(),
        &OpenTarget::Path("/dev/hidraw0".to_string())
    );
    assert_eq!(device.open_handles(), 1);
    Ok(())
}

#[test]
fn open_serial_disambiguates() -> TestResult {
    let first = MockDevice::new(0x0EB7, 0x0020, "/dev/hidraw3").with_serial("FAN-A");
    let second = MockDevice::new(0x0EB7, 0x0020, "/dev/hidraw4").with_serial("FAN-B");
    let (_backend, mut ctx) = ready_context(&[first.clone(), second.clone()])?;

    let _session = ctx.open_serial(0x0EB7, 0x0020, "FAN-B")?;

    assert_eq!(first.open_handles(), 0);
    assert_eq!(second.open_handles(), 1);
    assert!(ctx.open_serial(0x0EB7, 0x0020, "FAN-C").is_err());
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[test]
fn read_distinguishes_timeout_data_and_error() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Timeout);
    device.queue_read(MockRead::Data(vec![0x01, 0x7F, 0x80, 0x00]));
    device.queue_read(MockRead::Error(Some("device disconnected".to_string())));
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(session.read_timeout(64, 10)?, ReadOutcome::TimedOut);
    assert_eq!(
        session.read_timeout(64, 10)?,
        ReadOutcome::Data(vec![0x01, 0x7F, 0x80, 0x00])
    );
    let err = session.read_timeout(64, 10);
    assert_eq!(
        err,
        Err(HidError::ReadFailed("device disconnected".to_string()))
    );
    assert!(err.is_err_and(|e| e.class() == ErrorClass::Operational));
    assert!(session.is_open());
    Ok(())
}

#[test]
fn read_error_without_native_message_uses_fallback() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Error(None));
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(
        session.read_timeout(8, 10),
        Err(HidError::ReadFailed("HID communication problem".to_string()))
    );
    Ok(())
}

#[test]
fn read_never_returns_more_than_requested() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Data(vec![0xAA; 64]));
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    let data = session.read_timeout(8, 10)?.into_data();

    assert_eq!(data, Some(vec![0xAA; 8]));
    Ok(())
}

#[test]
fn session_usable_after_failed_read() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Error(Some("EPIPE".to_string())));
    device.queue_read(MockRead::Data(vec![0x02]));
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert!(session.read_timeout(8, 10).is_err());
    assert_eq!(session.read_timeout(8, 10)?, ReadOutcome::Data(vec![0x02]));
    Ok(())
}

#[test]
fn zero_length_read_is_rejected_before_native_call() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(session.read_timeout(0, 10), Err(HidError::InvalidReadLength));
    assert_eq!(device.read_calls(), 0);
    Ok(())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[test]
fn write_sends_full_report() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    session.write(&[0x00, 0xF8, 0x81, 0x84, 0x03])?;

    assert_eq!(device.write_history(), vec![vec![0x00, 0xF8, 0x81, 0x84, 0x03]]);
    Ok(())
}

#[test]
fn empty_write_is_rejected_without_native_call() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(session.write(&[]), Err(HidError::EmptyReport));
    assert_eq!(device.write_calls(), 0);
    Ok(())
}

#[test]
fn short_write_is_operational_error() -> TestResult {
    let device = wheel();
    device.queue_write(MockWrite::Short(3));
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    let err = session.write(&[0x01; 8]);

    assert!(matches!(
        err,
        Err(HidError::ShortWrite {
            written: 3,
            expected: 8,
            ..
        })
    ));
    assert!(err.is_err_and(|e| e.class() == ErrorClass::Operational));
    // No retry.
    assert_eq!(device.write_calls(), 1);
    Ok(())
}

#[test]
fn write_error_carries_native_message() -> TestResult {
    let device = wheel();
    device.queue_write(MockWrite::Error(Some("Broken pipe".to_string())));
    device.queue_write(MockWrite::Complete);
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(
        session.write(&[0x00, 0x01]),
        Err(HidError::WriteFailed("Broken pipe".to_string()))
    );
    assert_eq!(session.last_error()?, "Broken pipe");
    session.write(&[0x00, 0x01])?;
    Ok(())
}

#[test]
fn short_write_reports_current_error_not_stale_one() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Error(Some("broken pipe".to_string())));
    device.queue_read(MockRead::Data(vec![0x01]));
    device.queue_write(MockWrite::Short(1));
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert!(session.read_timeout(8, 10).is_err());
    assert_eq!(session.read_timeout(8, 10)?, ReadOutcome::Data(vec![0x01]));
    assert_eq!(session.last_error()?, "HID communication problem");

    assert_eq!(
        session.write(&[0x00, 0x01, 0x02]),
        Err(HidError::ShortWrite {
            written: 1,
            expected: 3,
            message: "HID communication problem".to_string(),
        })
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// String queries
// ---------------------------------------------------------------------------

#[test]
fn string_queries_hit_live_device() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let descriptor = ctx.enumerate(0, 0)?.remove(0);
    let mut session = ctx.open_descriptor(&descriptor)?;

    device.set_live_string(StringKind::Product, "G29 (firmware 2)");

    assert_eq!(session.manufacturer()?, "Logitech");
    assert_eq!(session.product()?, "G29 (firmware 2)");
    assert_eq!(session.serial_number()?, "LGT-0001");
    assert_eq!(descriptor.product(), "G29 Driving Force Racing Wheel");
    assert_eq!(device.string_calls(), 3);
    Ok(())
}

#[test]
fn string_query_is_bounded_by_buffer() -> TestResult {
    let backend = MockHidBackend::new();
    let device = MockDevice::new(0x046D, 0xC24F, "/dev/hidraw0").with_product(&"x".repeat(300));
    backend.add_device(device);
    let mut ctx = HidContext::new(backend);
    ctx.init()?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    let product = session.product()?;

    assert!(!product.is_empty());
    assert!(product.len() < 256);
    assert!(product.chars().all(|c| c == 'x'));
    Ok(())
}

#[test]
fn string_query_failure_returns_last_error() -> TestResult {
    let device = wheel();
    device.fail_string(StringKind::SerialNumber, Some("string descriptor stall"));
    device.fail_string(StringKind::Product, None);
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(
        session.serial_number(),
        Err(HidError::StringQueryFailed {
            kind: StringKind::SerialNumber,
            message: "string descriptor stall".to_string(),
        })
    );
    assert_eq!(
        session.product(),
        Err(HidError::StringQueryFailed {
            kind: StringKind::Product,
            message: "HID communication problem".to_string(),
        })
    );
    Ok(())
}

#[test]
fn custom_fallback_message() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Error(None));
    let backend = MockHidBackend::new();
    backend.add_device(device);
    let config = HidConfig::builder()
        .fallback_error_message("device went quiet")
        .build()?;
    let mut ctx = HidContext::with_config(backend, config)?;
    ctx.init()?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    assert_eq!(session.last_error()?, "device went quiet");
    assert_eq!(
        session.read_timeout(8, 10),
        Err(HidError::ReadFailed("device went quiet".to_string()))
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Closing
// ---------------------------------------------------------------------------

#[test]
fn double_close_releases_once() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    session.close();
    session.close();
    drop(session);

    assert_eq!(device.close_count(), 1);
    assert_eq!(device.open_handles(), 0);
    Ok(())
}

#[test]
fn drop_closes_open_session() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    {
        let _session = ctx.open(0x046D, 0xC24F)?;
        assert_eq!(device.open_handles(), 1);
    }
    assert_eq!(device.close_count(), 1);
    Ok(())
}

#[test]
fn operations_after_close_fail_cleanly() -> TestResult {
    let device = wheel();
    let (_backend, mut ctx) = ready_context(&[device.clone()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;
    session.close();

    assert_eq!(session.status(), SessionStatus::Closed);
    assert_eq!(
        session.read_timeout(8, 10),
        Err(HidError::closed(SessionOp::Read))
    );
    assert_eq!(
        session.write(&[0x00]),
        Err(HidError::closed(SessionOp::Write))
    );
    assert_eq!(
        session.last_error(),
        Err(HidError::closed(SessionOp::LastError))
    );
    for result in [session.manufacturer(), session.product(), session.serial_number()] {
        assert!(result.is_err_and(|e| e.is_closed() && e.is_programming_error()));
    }
    assert_eq!(device.read_calls(), 0);
    assert_eq!(device.write_calls(), 0);
    assert_eq!(device.string_calls(), 0);
    Ok(())
}

#[test]
fn closed_read_write_errors_are_operational() -> TestResult {
    let (_backend, mut ctx) = ready_context(&[wheel()])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;
    session.close();

    assert!(session.read_timeout(8, 10).is_err_and(|e| e.class() == ErrorClass::Operational));
    assert!(session.write(&[0x00]).is_err_and(|e| e.class() == ErrorClass::Operational));
    Ok(())
}

#[test]
fn independent_sessions_on_distinct_devices() -> TestResult {
    let g29 = wheel();
    let sprint = pedals();
    let (_backend, mut ctx) = ready_context(&[g29.clone(), sprint.clone()])?;
    let mut a = ctx.open(0x046D, 0xC24F)?;
    let mut b = ctx.open(0x30B7, 0x1001)?;

    a.close();
    b.write(&[0x00, 0x10])?;

    assert_eq!(g29.close_count(), 1);
    assert_eq!(sprint.open_handles(), 1);
    assert_eq!(sprint.write_history(), vec![vec![0x00, 0x10]]);
    Ok(())
}

#[test]
fn session_moves_to_worker_thread() -> TestResult {
    let device = wheel();
    device.queue_read(MockRead::Data(vec![0x05]));
    let (_backend, mut ctx) = ready_context(&[device])?;
    let mut session = ctx.open(0x046D, 0xC24F)?;

    let outcome = std::thread::spawn(move || session.read_timeout(8, 10))
        .join()
        .map_err(|_| "reader thread panicked")??;

    assert_eq!(outcome, ReadOutcome::Data(vec![0x05]));
    Ok(())
}
