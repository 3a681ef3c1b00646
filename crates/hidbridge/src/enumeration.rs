//! Materializing native enumeration lists.

use crate::codec::StringCodec;
use crate::descriptor::DeviceDescriptor;
use crate::native::NativeDeviceRecord;

/// Vendor or product filter value that matches any device.
pub const ANY_ID: u16 = 0;

/// Drain a native device list into descriptors.
///
/// The list is consumed and dropped before this returns, which releases the
/// native snapshot even when it holds no devices.
pub fn collect_descriptors<L>(
    list: L,
    codec: &StringCodec,
    missing_path: &str,
) -> Vec<DeviceDescriptor>
where
    L: Iterator<Item = NativeDeviceRecord>,
{
    list.map(|record| DeviceDescriptor::from_native(&record, codec, missing_path))
        .collect()
}
