#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use core::convert::Infallible;

use defmt::{error, info, warn};
use dht22_sampler::{
    get_humidity, get_temperature, json_payload, DataPin, Dht22, Sampler, LATEST,
};
use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{DriveMode, Flex, OutputConfig, Pull},
    peripherals::GPIO2,
    timer::systimer::SystemTimer,
};
use {esp_backtrace as _, esp_println as _};

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

const SENSOR_ID: &str = match option_env!("SENSOR_ID") {
    Some(id) => id,
    None => "dht22",
};

// How often the latest reading is rendered and logged.
const REPORT_INTERVAL: Duration = Duration::from_millis(5_000);

type SensorSampler = Sampler<'static, SensorLine, Delay>;

/// The DHT22 data line: open drain with pull-up, so releasing it means
/// turning the output driver off.
struct SensorLine(Flex<'static>);

impl SensorLine {
    fn new(pin: GPIO2<'static>) -> Self {
        let mut flex = Flex::new(pin);
        flex.apply_output_config(
            &OutputConfig::default()
                .with_drive_mode(DriveMode::OpenDrain)
                .with_pull(Pull::Up),
        );
        flex.set_input_enable(true);
        flex.set_high();
        flex.set_output_enable(true);
        SensorLine(flex)
    }
}

impl ErrorType for SensorLine {
    type Error = Infallible;
}

impl InputPin for SensorLine {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.is_low())
    }
}

impl OutputPin for SensorLine {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set_high();
        Ok(())
    }
}

impl DataPin for SensorLine {
    fn set_as_output(&mut self) -> Result<(), Infallible> {
        self.0.set_output_enable(true);
        Ok(())
    }

    fn set_as_input(&mut self) -> Result<(), Infallible> {
        self.0.set_output_enable(false);
        self.0.set_input_enable(true);
        Ok(())
    }
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    info!("Embassy initialized!");

    let sensor = Dht22::new(SensorLine::new(peripherals.GPIO2), Delay::new());
    start_sampling(&spawner, Sampler::new(sensor, &LATEST));

    if spawner.spawn(reporter()).is_err() {
        error!("Failed to spawn reporter task");
    }
}

/// Launches the sampler on its own task.
///
/// The task pool holds a single sampler, so a second call is refused.
fn start_sampling(spawner: &Spawner, sampler: SensorSampler) {
    match spawner.spawn(sampler_task(sampler)) {
        Ok(()) => info!("DHT22 sampling started"),
        Err(_) => error!("DHT22 sampler already running"),
    }
}

#[embassy_executor::task]
async fn sampler_task(sampler: SensorSampler) {
    sampler.run(embassy_time::Delay).await;
}

#[embassy_executor::task]
async fn reporter() {
    loop {
        Timer::after(REPORT_INTERVAL).await;

        if !LATEST.has_sample() {
            info!("No DHT22 reading yet");
            continue;
        }

        match json_payload::<96>(SENSOR_ID, &LATEST.snapshot()) {
            Ok(payload) => info!("{}", payload.as_str()),
            Err(_) => warn!("Payload does not fit"),
        }
        info!(
            "temperature={} humidity={}",
            get_temperature(),
            get_humidity()
        );
    }
}
