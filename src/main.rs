//! Reflow oven controller — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │   HardwareAdapter<SPI, PWM>      console (stdin / UART0)     │
//! │   MAX31855K + SSR heater         CommandRegistry             │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ──────────────────      │
//! │                                                              │
//! │   ┌───────────────────────────────────────────────────┐      │
//! │   │  reflow active object (own thread, mailbox)       │      │
//! │   │  state table · PID · profile                      │      │
//! │   └───────────────────────────────────────────────────┘      │
//! │                                                              │
//! │   heartbeat ─tick─▶ TIME_EVENTS ─post─▶ reflow mailbox       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Boot order: logger, config, hardware, reflow object, heartbeat,
//! console. Every failure before the console starts is fatal.

#![deny(unused_must_use)]

use std::io::{BufRead, Write as _};

use anyhow::{Context, Result};
use log::{error, info, warn};

use reflow::adapters::hardware::HardwareAdapter;
use reflow::cmd::CommandRegistry;
use reflow::config::SystemConfig;
use reflow::diagnostics;
use reflow::drivers::heater::Heater;
use reflow::drivers::hw_timer;
use reflow::reflow::ReflowHandle;
use reflow::sensors::thermocouple::Max31855;
use reflow::time_event::TIME_EVENTS;

#[cfg(not(target_os = "espidf"))]
use reflow::adapters::sim_oven::SimOven;

/// Simulated seconds per real second for the host oven model.
#[cfg(not(target_os = "espidf"))]
const SIM_TIME_SCALE: f32 = 10.0;

fn main() -> Result<()> {
    // ── 1. Platform bootstrap + logging ───────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }
    #[cfg(not(target_os = "espidf"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  Reflow controller v{}            ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    match boot() {
        Ok(handle) => console(handle),
        Err(e) => {
            error!("boot failed: {:#}, halting", e);
            halt(e)
        }
    }
}

#[cfg(target_os = "espidf")]
fn halt(_: anyhow::Error) -> Result<()> {
    // The task watchdog resets the chip.
    #[allow(clippy::empty_loop)]
    loop {}
}

#[cfg(not(target_os = "espidf"))]
fn halt(e: anyhow::Error) -> Result<()> {
    Err(e)
}

fn boot() -> Result<ReflowHandle> {
    // ── 2. Configuration ──────────────────────────────────────
    let config = load_config()?;
    config.validate().map_err(reflow::error::Error::from)?;
    info!(
        "config: Kp={} Ki={} Kd={} Ts={}s, heartbeat {}ms",
        config.pid.kp, config.pid.ki, config.pid.kd, config.pid.ts_secs, config.runtime.heartbeat_ms
    );

    // ── 3. Hardware ───────────────────────────────────────────
    let hw = build_hardware(&config)?;

    // ── 4. Reflow active object + heartbeat ───────────────────
    let handle = reflow::reflow::start(&config, hw, &TIME_EVENTS)?;
    hw_timer::start_heartbeat(&TIME_EVENTS, config.runtime.heartbeat_ms)
        .map_err(reflow::error::Error::from)?;
    info!("{} time events registered", TIME_EVENTS.len());

    Ok(handle)
}

#[cfg(target_os = "espidf")]
fn load_config() -> Result<SystemConfig> {
    Ok(SystemConfig::default())
}

/// Defaults, or a JSON document named by the first argument.
#[cfg(not(target_os = "espidf"))]
fn load_config() -> Result<SystemConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SystemConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = SystemConfig::from_json(&text)
        .map_err(reflow::error::Error::from)
        .with_context(|| format!("loading {path}"))?;
    info!("config loaded from {}", path);
    Ok(config)
}

#[cfg(target_os = "espidf")]
fn build_hardware(
    config: &SystemConfig,
) -> Result<
    HardwareAdapter<
        esp_idf_svc::hal::spi::SpiDeviceDriver<'static, esp_idf_svc::hal::spi::SpiDriver<'static>>,
        esp_idf_svc::hal::ledc::LedcDriver<'static>,
    >,
> {
    use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin};
    use esp_idf_svc::hal::ledc::{LedcDriver, LedcTimerDriver, Resolution, config::TimerConfig};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::spi::{SpiDeviceDriver, SpiDriverConfig, config::Config as SpiConfig};
    use esp_idf_svc::hal::units::Hertz;
    use reflow::pins;

    let p = Peripherals::take()?;

    // SAFETY: pin numbers come from the board map in `pins` and each is
    // claimed exactly once, here.
    let (sclk, sdo, sdi, cs, heater_pin) = unsafe {
        (
            AnyOutputPin::new(pins::TC_SCK_GPIO),
            AnyOutputPin::new(pins::TC_MOSI_NC_GPIO),
            AnyInputPin::new(pins::TC_MISO_GPIO),
            AnyIOPin::new(pins::TC_CS_GPIO),
            AnyOutputPin::new(pins::HEATER_PWM_GPIO),
        )
    };

    let spi = SpiDeviceDriver::new_single(
        p.spi2,
        sclk,
        sdo,
        Some(sdi),
        Some(cs),
        &SpiDriverConfig::new(),
        &SpiConfig::new().baudrate(Hertz(pins::TC_SPI_FREQ_HZ)),
    )?;

    let timer = LedcTimerDriver::new(
        p.ledc.timer0,
        &TimerConfig::new()
            .frequency(Hertz(pins::HEATER_PWM_FREQ_HZ))
            .resolution(Resolution::Bits10),
    )?;
    let pwm = LedcDriver::new(p.ledc.channel0, timer, heater_pin)?;

    info!("hardware: MAX31855K on SPI2, heater on GPIO{}", pins::HEATER_PWM_GPIO);
    Ok(HardwareAdapter::new(
        Max31855::new(spi),
        Heater::new(pwm, config.pid.out_max),
    ))
}

#[cfg(not(target_os = "espidf"))]
fn build_hardware(
    config: &SystemConfig,
) -> Result<HardwareAdapter<reflow::adapters::sim_oven::SimThermocoupleSpi, reflow::adapters::sim_oven::SimHeaterPwm>>
{
    let oven = SimOven::new(25.0).with_time_scale(SIM_TIME_SCALE);
    info!("hardware(sim): oven model at {:.1}°C, {}x speed", oven.temperature(), SIM_TIME_SCALE);
    Ok(HardwareAdapter::new(
        Max31855::new(oven.thermocouple()),
        Heater::new(oven.heater_pwm(), config.pid.out_max),
    ))
}

// ── Console ───────────────────────────────────────────────────

/// Read command lines until the input closes.
fn console(handle: ReflowHandle) -> Result<()> {
    let mut commands = CommandRegistry::new();
    diagnostics::register_all(&mut commands, handle).map_err(reflow::error::Error::from)?;
    info!("console ready, type 'help'");

    let stdin = std::io::stdin();
    let mut line = String::new();
    let mut out = String::new();
    loop {
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            #[cfg(target_os = "espidf")]
            {
                std::thread::sleep(std::time::Duration::from_millis(50));
                continue;
            }
            #[cfg(not(target_os = "espidf"))]
            {
                info!("console closed");
                return Ok(());
            }
        }
        out.clear();
        if let Err(e) = commands.execute(&line, &mut out) {
            warn!("command '{}' failed: {} (code {})", line.trim(), e, e.code());
        }
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(out.as_bytes())?;
        stdout.flush()?;
    }
}
