// src/dht22.rs

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::frame::{Frame, FRAME_BITS};
use crate::{Dht22Error, Phase, Reading};

// Host start signal.
const WAKE_LOW_US: u32 = 3_000;
const WAKE_HIGH_US: u32 = 25;

// Longest time the sensor may hold each level.
const ACK_LEVEL_THRESHOLD: u32 = 85;
const BIT_START_THRESHOLD: u32 = 56;
const BIT_DATA_THRESHOLD: u32 = 75;

// A high segment longer than this is a 1.
const ONE_BIT_THRESHOLD: u32 = 40;

/// A GPIO that can both drive and release the sensor's data line.
///
/// `embedded-hal` has no notion of pin direction, so the driver asks for it
/// explicitly: output to send the start signal, input while the sensor talks.
pub trait DataPin: InputPin + OutputPin {
    /// Let the host drive the line.
    fn set_as_output(&mut self) -> Result<(), Self::Error>;
    /// Release the line to the sensor.
    fn set_as_input(&mut self) -> Result<(), Self::Error>;
}

/// Bit-banged `DHT22` driver.
///
/// `delay` must be a busy-wait with microsecond resolution: bits are told
/// apart by a 40 µs threshold, far below any scheduler tick.
pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: DataPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Dht22 { pin, delay }
    }

    /// Gives the pin and delay back.
    pub fn release(self) -> (P, D) {
        (self.pin, self.delay)
    }

    /// Runs one full read cycle.
    ///
    /// # Errors
    ///
    /// - [`Dht22Error::Timeout`] if any level is held longer than allowed
    /// - [`Dht22Error::ChecksumMismatch`] if the frame fails validation
    /// - [`Dht22Error::Pin`] if the GPIO driver fails
    pub fn read(&mut self) -> Result<Reading, Dht22Error<P::Error>> {
        self.send_start_signal()?;

        let frame = critical_section::with(|_cs| self.read_frame())?;
        trace!("raw frame: {}", frame);

        frame.decode()
    }

    fn send_start_signal(&mut self) -> Result<(), Dht22Error<P::Error>> {
        self.pin.set_as_output()?;
        self.pin.set_low()?;
        self.delay.delay_us(WAKE_LOW_US);

        self.pin.set_high()?;
        self.delay.delay_us(WAKE_HIGH_US);
        self.pin.set_as_input()?;

        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, Dht22Error<P::Error>> {
        // Acknowledgement: ~80 µs low, then ~80 µs high.
        self.wait_while_level(PinState::Low, ACK_LEVEL_THRESHOLD, Phase::AckLow)?;
        self.wait_while_level(PinState::High, ACK_LEVEL_THRESHOLD, Phase::AckHigh)?;

        let mut frame = Frame::default();
        for bit in 0..FRAME_BITS {
            let n = bit as u8;
            self.wait_while_level(PinState::Low, BIT_START_THRESHOLD, Phase::BitStart(n))?;
            let high_us =
                self.wait_while_level(PinState::High, BIT_DATA_THRESHOLD, Phase::BitData(n))?;

            if high_us > ONE_BIT_THRESHOLD {
                frame.set_bit(bit);
            }
        }

        Ok(frame)
    }

    /// Polls the line once per microsecond while it stays at `level`.
    ///
    /// Returns the number of microseconds spent at `level`, which is zero if
    /// the line had already left it. A level held longer than `timeout_us`
    /// fails with `Timeout(phase)`.
    fn wait_while_level(
        &mut self,
        level: PinState,
        timeout_us: u32,
        phase: Phase,
    ) -> Result<u32, Dht22Error<P::Error>> {
        let mut elapsed_us = 0;
        while self.is_at(level)? {
            if elapsed_us >= timeout_us {
                return Err(Dht22Error::Timeout(phase));
            }

            self.delay.delay_us(1);
            elapsed_us += 1;
        }
        Ok(elapsed_us)
    }

    #[inline]
    fn is_at(&mut self, level: PinState) -> Result<bool, P::Error> {
        match level {
            PinState::High => self.pin.is_high(),
            PinState::Low => self.pin.is_low(),
        }
    }
}
