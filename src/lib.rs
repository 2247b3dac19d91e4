//! DHT22 acquisition core.
//!
//! The sensor speaks a single-wire protocol whose bits are encoded in the
//! length of high pulses, so the driver busy-waits on the data line with a
//! microsecond delay. A background [`Sampler`] reads the sensor every few
//! seconds and publishes good readings into a [`SharedReading`], from where
//! any other task can take a snapshot through [`get_temperature`] and
//! [`get_humidity`].
//!
//! Everything here is written against the `embedded-hal` traits; the
//! firmware binary supplies the ESP32-C3 pin and delay.
#![no_std]

#[macro_use]
mod fmt;

mod dht22;
mod frame;
mod payload;
mod reading;
mod sampler;

#[cfg(test)]
mod sim;

pub use dht22::{DataPin, Dht22};
pub use frame::Frame;
pub use payload::json_payload;
pub use reading::SharedReading;
pub use sampler::{SampleStats, Sampler, SAMPLE_INTERVAL_MS};

/// One decoded measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// Relative humidity in percent, 0.1 resolution.
    pub humidity: f32,
    /// Temperature in degrees Celsius, 0.1 resolution.
    pub temperature: f32,
}

impl Reading {
    /// The value every consumer sees until the first good sample lands.
    pub const ZERO: Reading = Reading {
        humidity: 0.0,
        temperature: 0.0,
    };
}

/// The wait that expired during a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Sensor acknowledgement, low half.
    AckLow,
    /// Sensor acknowledgement, high half.
    AckHigh,
    /// Low segment that opens data bit `n`.
    BitStart(u8),
    /// High segment that carries data bit `n`.
    BitData(u8),
}

impl core::fmt::Display for Phase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Phase::AckLow => write!(f, "ack low"),
            Phase::AckHigh => write!(f, "ack high"),
            Phase::BitStart(n) => write!(f, "bit {n} start"),
            Phase::BitData(n) => write!(f, "bit {n} data"),
        }
    }
}

/// Why a read attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dht22Error<E> {
    /// A level transition did not happen inside its window.
    #[error("sensor timeout at {0}")]
    Timeout(Phase),
    /// All 40 bits arrived but the checksum byte disagrees.
    #[error("checksum mismatch: expected {expected:#04x}, received {received:#04x}")]
    ChecksumMismatch {
        /// Low byte of the sum of the four data bytes.
        expected: u8,
        /// Checksum byte sent by the sensor.
        received: u8,
    },
    /// The GPIO driver failed.
    #[error("pin error: {0:?}")]
    Pin(E),
}

impl<E> From<E> for Dht22Error<E> {
    fn from(e: E) -> Self {
        Dht22Error::Pin(e)
    }
}

/// Last good reading of the on-board sensor, written by the firmware's sampler.
pub static LATEST: SharedReading = SharedReading::new();

/// Latest committed temperature in °C, `0.0` before the first good sample.
pub fn get_temperature() -> f32 {
    LATEST.temperature()
}

/// Latest committed relative humidity in %, `0.0` before the first good sample.
pub fn get_humidity() -> f32 {
    LATEST.humidity()
}
