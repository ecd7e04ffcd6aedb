//! MAX31855K thermocouple-to-digital converter (K type).
//!
//! The converter streams one 32-bit frame per chip-select:
//!
//! ```text
//!  31      18  17  16  15      4  3   2   1   0
//! ┌──────────┬───┬───┬──────────┬───┬───┬───┬───┐
//! │ HJ (s14) │ 0 │ F │ CJ (s12) │ 0 │SCV│SCG│OC │
//! └──────────┴───┴───┴──────────┴───┴───┴───┴───┘
//!   0.25 °C/LSB       0.0625 °C/LSB
//! ```
//!
//! Decoding is a pure function so it can be unit-tested and fuzzed on the
//! host; the driver only adds the SPI transfer.

use embedded_hal::spi::SpiDevice;

use crate::app::ports::ThermocouplePort;
use crate::error::ThermoFault;

const HJ_RES_C: f32 = 0.25;
const CJ_RES_C: f32 = 0.0625;

const FAULT_FLAG: u32 = 1 << 16;
const SCV_BIT: u32 = 1 << 2;
const SCG_BIT: u32 = 1 << 1;
const OC_BIT: u32 = 1 << 0;

/// One decoded frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermoReading {
    /// Cold-junction compensated thermocouple temperature.
    pub hot_junction_c: f32,
    /// Converter die temperature.
    pub cold_junction_c: f32,
}

/// Decode a raw frame, checking faults first.
///
/// Fault bits are tested individually in priority order (short to VCC,
/// short to GND, open circuit) so a frame with several cause bits set still
/// reports a fault. A frame with only the summary flag set is reported as
/// open circuit.
pub fn decode(frame: u32) -> Result<ThermoReading, ThermoFault> {
    if frame == 0 {
        return Err(ThermoFault::AllZeros);
    }
    if frame & SCV_BIT != 0 {
        return Err(ThermoFault::ShortToVcc);
    }
    if frame & SCG_BIT != 0 {
        return Err(ThermoFault::ShortToGnd);
    }
    if frame & (OC_BIT | FAULT_FLAG) != 0 {
        return Err(ThermoFault::OpenCircuit);
    }

    // Shift the field to the top of an i32 and arithmetic-shift back down
    // to sign-extend.
    let hj_counts = (frame as i32) >> 18;
    let cj_counts = ((frame << 16) as i32) >> 20;

    Ok(ThermoReading {
        hot_junction_c: hj_counts as f32 * HJ_RES_C,
        cold_junction_c: cj_counts as f32 * CJ_RES_C,
    })
}

/// Build a fault-free frame for the given temperatures (simulation and
/// tests). Values are truncated to the converter's resolution.
pub fn encode(hot_junction_c: f32, cold_junction_c: f32) -> u32 {
    let hj = ((hot_junction_c / HJ_RES_C) as i32).clamp(-8192, 8191);
    let cj = ((cold_junction_c / CJ_RES_C) as i32).clamp(-2048, 2047);
    ((hj as u32 & 0x3FFF) << 18) | ((cj as u32 & 0x0FFF) << 4)
}

/// MAX31855K on an SPI bus. The device owns chip-select.
pub struct Max31855<SPI> {
    spi: SPI,
    last: Option<ThermoReading>,
}

impl<SPI: SpiDevice> Max31855<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi, last: None }
    }

    /// Clock one frame out of the converter and decode it.
    pub fn read(&mut self) -> Result<ThermoReading, ThermoFault> {
        let mut raw = [0u8; 4];
        self.spi.read(&mut raw).map_err(|_| ThermoFault::Bus)?;
        let reading = decode(u32::from_be_bytes(raw))?;
        self.last = Some(reading);
        Ok(reading)
    }

    /// Last good reading, if any.
    pub fn last(&self) -> Option<ThermoReading> {
        self.last
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> ThermocouplePort for Max31855<SPI> {
    fn read_celsius(&mut self) -> Result<f32, ThermoFault> {
        self.read().map(|r| r.hot_junction_c)
    }
}
