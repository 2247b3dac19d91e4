use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::Reading;

/// Last known good [`Reading`], shared between one writer and any number of
/// readers.
///
/// Both fields are swapped under one short critical section, so a reader
/// never sees the humidity of one sample next to the temperature of another.
/// Reads hand out copies.
pub struct SharedReading {
    inner: Mutex<CriticalSectionRawMutex, Cell<Option<Reading>>>,
}

impl SharedReading {
    pub const fn new() -> Self {
        SharedReading {
            inner: Mutex::new(Cell::new(None)),
        }
    }

    /// The committed reading, or [`Reading::ZERO`] before the first one.
    pub fn snapshot(&self) -> Reading {
        self.latest().unwrap_or(Reading::ZERO)
    }

    /// The committed reading, if any sample succeeded yet.
    pub fn latest(&self) -> Option<Reading> {
        self.inner.lock(Cell::get)
    }

    pub fn has_sample(&self) -> bool {
        self.latest().is_some()
    }

    pub fn temperature(&self) -> f32 {
        self.snapshot().temperature
    }

    pub fn humidity(&self) -> f32 {
        self.snapshot().humidity
    }

    pub(crate) fn commit(&self, reading: Reading) {
        self.inner.lock(|cell| cell.set(Some(reading)));
    }
}

impl Default for SharedReading {
    fn default() -> Self {
        Self::new()
    }
}
