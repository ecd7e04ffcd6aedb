//! Fuzz target: MAX31855K frame decoding
//!
//! Any 32-bit frame must decode without panicking. An accepted frame has
//! no fault bits set and a temperature inside the converter's range.
//!
//! cargo fuzz run fuzz_thermo_frame

#![no_main]

use libfuzzer_sys::fuzz_target;
use reflow::sensors::thermocouple::decode;

fuzz_target!(|data: [u8; 4]| {
    let frame = u32::from_be_bytes(data);
    if let Ok(r) = decode(frame) {
        assert_eq!(frame & 0x0001_0007, 0, "fault bits accepted");
        assert!((-2048.0..2048.0).contains(&r.hot_junction_c));
        assert!((-128.0..128.0).contains(&r.cold_junction_c));
    }
});
