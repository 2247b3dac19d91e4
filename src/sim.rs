//! Simulated data line driven by a simulated microsecond clock.
//!
//! Once the host releases the line, the sensor side replays a [`Script`] of
//! low/high segments. After the script runs out the pull-up keeps the line
//! high.

extern crate std;

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

use crate::DataPin;

const ZERO_HIGH_US: u32 = 26;
const ONE_HIGH_US: u32 = 70;

/// Host-side actions on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Output,
    Input,
    Low,
    High,
}

/// Sensor-side level schedule, counted from the moment the line is released.
#[derive(Debug, Clone, Default)]
pub struct Script {
    segments: Vec<(PinState, u32)>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regular 80 µs low / 80 µs high acknowledgement.
    pub fn ack() -> Self {
        Self::new()
            .segment(PinState::Low, 80)
            .segment(PinState::High, 80)
    }

    /// A complete, well-timed transmission of `bytes`.
    pub fn frame(bytes: [u8; 5]) -> Self {
        Self::ack().bytes(bytes).tail()
    }

    pub fn segment(mut self, level: PinState, us: u32) -> Self {
        self.segments.push((level, us));
        self
    }

    /// One data bit whose high segment lasts `high_us`.
    pub fn bit(self, high_us: u32) -> Self {
        self.segment(PinState::Low, 50).segment(PinState::High, high_us)
    }

    pub fn zero_bits(self, count: usize) -> Self {
        (0..count).fold(self, |script, _| script.bit(ZERO_HIGH_US))
    }

    pub fn bytes(self, bytes: [u8; 5]) -> Self {
        bytes.iter().fold(self, |script, byte| {
            (0..8).rev().fold(script, |script, shift| {
                if (byte >> shift) & 1 == 1 {
                    script.bit(ONE_HIGH_US)
                } else {
                    script.bit(ZERO_HIGH_US)
                }
            })
        })
    }

    /// End-of-transmission low pulse.
    pub fn tail(self) -> Self {
        self.segment(PinState::Low, 50)
    }

    fn level_at(&self, us: u64) -> PinState {
        let mut start = 0u64;
        for &(level, duration) in &self.segments {
            let end = start + u64::from(duration);
            if us < end {
                return level;
            }
            start = end;
        }
        PinState::High
    }
}

#[derive(Debug, Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn now_ns(&self) -> u64 {
        self.0.get()
    }

    fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

/// Busy-wait stand-in: advances the shared clock instead of spinning.
pub struct SimDelay(Clock);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance_ns(u64::from(ns));
    }
}

pub struct SimLine {
    clock: Clock,
    script: Script,
    driven: PinState,
    released_at: Option<u64>,
    events: Rc<RefCell<Vec<(u64, Event)>>>,
}

impl SimLine {
    /// A released, pulled-up line and the delay that moves its clock.
    pub fn new(script: Script) -> (Self, SimDelay) {
        let clock = Clock::default();
        let line = SimLine {
            clock: clock.clone(),
            script,
            driven: PinState::High,
            released_at: None,
            events: Rc::default(),
        };
        (line, SimDelay(clock))
    }

    /// Host actions so far, stamped in microseconds.
    pub fn events(&self) -> Vec<(u64, Event)> {
        self.events.borrow().clone()
    }

    fn record(&self, event: Event) {
        self.events
            .borrow_mut()
            .push((self.clock.now_ns() / 1_000, event));
    }

    fn level(&self) -> PinState {
        match self.released_at {
            Some(at) => self.script.level_at((self.clock.now_ns() - at) / 1_000),
            None => self.driven,
        }
    }
}

impl ErrorType for SimLine {
    type Error = Infallible;
}

impl InputPin for SimLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level() == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.level() == PinState::Low)
    }
}

impl OutputPin for SimLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.driven = PinState::Low;
        self.record(Event::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.driven = PinState::High;
        self.record(Event::High);
        Ok(())
    }
}

impl DataPin for SimLine {
    fn set_as_output(&mut self) -> Result<(), Infallible> {
        self.released_at = None;
        self.record(Event::Output);
        Ok(())
    }

    fn set_as_input(&mut self) -> Result<(), Infallible> {
        self.released_at = Some(self.clock.now_ns());
        self.record(Event::Input);
        Ok(())
    }
}
