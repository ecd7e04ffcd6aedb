//! GPIO / peripheral pin assignments for the oven controller board.
//!
//! Single source of truth: the device bring-up in `main` references this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Thermocouple converter (MAX31855K on SPI2)
// ---------------------------------------------------------------------------

pub const TC_SCK_GPIO: i32 = 12;
/// Converter DO → MCU MISO.
pub const TC_MISO_GPIO: i32 = 13;
/// The MAX31855K has no data input; the driver still claims a MOSI pin,
/// left unconnected on the board.
pub const TC_MOSI_NC_GPIO: i32 = 11;
pub const TC_CS_GPIO: i32 = 10;
/// 5 MHz is the converter's maximum SCK.
pub const TC_SPI_FREQ_HZ: u32 = 5_000_000;

// ---------------------------------------------------------------------------
// Heater (zero-cross SSR driven from LEDC)
// ---------------------------------------------------------------------------

pub const HEATER_PWM_GPIO: i32 = 4;
/// Slow enough that a zero-cross SSR sees whole mains half-cycles.
pub const HEATER_PWM_FREQ_HZ: u32 = 10;
