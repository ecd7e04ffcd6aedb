//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements        | Connects to                        |
//! |-------------|-------------------|------------------------------------|
//! | `hardware`  | ThermocouplePort  | MAX31855K over SPI                 |
//! |             | HeaterPort        | SSR on an LEDC PWM channel         |
//! | `sim_oven`  | SpiDevice         | First-order thermal model (host)   |
//! |             | SetDutyCycle      |                                    |

pub mod hardware;
#[cfg(not(target_os = "espidf"))]
pub mod sim_oven;
