use embedded_hal::delay::DelayNs;
use embedded_hal_async::delay::DelayNs as AsyncDelay;

use crate::{DataPin, Dht22, Dht22Error, Reading, SharedReading};

/// Pause between two reads. The sensor needs at least two seconds.
pub const SAMPLE_INTERVAL_MS: u32 = 4_000;

// Outcome counts are logged once a minute.
const STATS_LOG_EVERY: u32 = 15;

/// Outcome counts since the sampler was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleStats {
    pub ok: u32,
    pub timeouts: u32,
    pub checksum_errors: u32,
    pub pin_errors: u32,
}

impl SampleStats {
    /// Read attempts so far, whatever their outcome.
    pub fn attempts(&self) -> u32 {
        self.ok
            .saturating_add(self.timeouts)
            .saturating_add(self.checksum_errors)
            .saturating_add(self.pin_errors)
    }
}

/// Reads the sensor on a fixed cadence and publishes good readings.
///
/// A failed read leaves the published reading untouched, it is logged and
/// the next attempt happens after the usual pause.
pub struct Sampler<'a, P, D> {
    sensor: Dht22<P, D>,
    reading: &'a SharedReading,
    stats: SampleStats,
}

impl<'a, P, D> Sampler<'a, P, D>
where
    P: DataPin,
    D: DelayNs,
{
    pub fn new(sensor: Dht22<P, D>, reading: &'a SharedReading) -> Self {
        Sampler {
            sensor,
            reading,
            stats: SampleStats::default(),
        }
    }

    pub fn stats(&self) -> SampleStats {
        self.stats
    }

    fn stats_due(&self) -> bool {
        let attempts = self.stats.attempts();
        attempts != 0 && attempts % STATS_LOG_EVERY == 0
    }

    /// One iteration: read, then commit on success.
    pub fn sample(&mut self) -> Result<Reading, Dht22Error<P::Error>> {
        let result = self.sensor.read();

        match &result {
            Ok(reading) => {
                if self.reading.has_sample() {
                    debug!(
                        "DHT22: temperature={} humidity={}",
                        reading.temperature,
                        reading.humidity
                    );
                } else {
                    info!(
                        "DHT22 first reading: temperature={} humidity={}",
                        reading.temperature,
                        reading.humidity
                    );
                }
                self.reading.commit(*reading);
                self.stats.ok = self.stats.ok.saturating_add(1);
            }
            Err(Dht22Error::Timeout(phase)) => {
                warn!("DHT22 timeout at {}", phase);
                self.stats.timeouts = self.stats.timeouts.saturating_add(1);
            }
            Err(Dht22Error::ChecksumMismatch { expected, received }) => {
                warn!(
                    "DHT22 checksum error: expected {=u8:#x}, received {=u8:#x}",
                    *expected,
                    *received
                );
                self.stats.checksum_errors = self.stats.checksum_errors.saturating_add(1);
            }
            Err(Dht22Error::Pin(_)) => {
                error!("DHT22 pin error");
                self.stats.pin_errors = self.stats.pin_errors.saturating_add(1);
            }
        }

        result
    }

    /// Samples forever, sleeping [`SAMPLE_INTERVAL_MS`] between attempts.
    ///
    /// `pause` must yield to the scheduler; it is the only suspension point.
    pub async fn run<T: AsyncDelay>(mut self, mut pause: T) {
        info!("Starting DHT22 sampler");
        loop {
            self.sample().ok();
            if self.stats_due() {
                info!("DHT22 stats: {}", self.stats);
            }
            pause.delay_ms(SAMPLE_INTERVAL_MS).await;
        }
    }
}
