use crate::{Dht22Error, Reading};

/// Number of data bits the sensor sends after its acknowledgement.
pub(crate) const FRAME_BITS: usize = 40;

/// The raw 40-bit register: humidity high/low, temperature high/low, checksum.
///
/// Bit 7 of the temperature high byte is the sign; the remaining 15 bits are
/// the magnitude in tenths of a degree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame(pub [u8; 5]);

impl Frame {
    /// Sets data bit `index`, most significant bit of byte 0 first.
    #[inline]
    pub fn set_bit(&mut self, index: usize) {
        self.0[index / 8] |= 1 << (7 - (index % 8));
    }

    /// Relative humidity, raw value divided by ten.
    pub fn humidity(&self) -> f32 {
        f32::from(u16::from_be_bytes([self.0[0], self.0[1]])) / 10.0
    }

    /// Temperature in °C, sign taken from the top bit of byte 2.
    pub fn temperature(&self) -> f32 {
        let magnitude = f32::from(u16::from_be_bytes([self.0[2] & 0x7F, self.0[3]])) / 10.0;
        if self.0[2] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Low byte of the sum of the four data bytes.
    pub fn expected_checksum(&self) -> u8 {
        self.0[..4].iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    /// Checksum byte as sent by the sensor.
    pub fn checksum(&self) -> u8 {
        self.0[4]
    }

    /// Decodes the frame, refusing it when the checksum does not match.
    pub fn decode<E>(&self) -> Result<Reading, Dht22Error<E>> {
        let reading = Reading {
            humidity: self.humidity(),
            temperature: self.temperature(),
        };

        let expected = self.expected_checksum();
        if expected != self.checksum() {
            return Err(Dht22Error::ChecksumMismatch {
                expected,
                received: self.checksum(),
            });
        }

        Ok(reading)
    }
}
