use core::fmt::Write;

use heapless::String;

use crate::Reading;

/// Renders `reading` as the JSON object consumers publish, e.g.
/// `{"sensor_id":"dht22","temperature":25.7,"humidity":40.0}`.
///
/// Fails if the payload does not fit in `N` bytes.
pub fn json_payload<const N: usize>(
    sensor_id: &str,
    reading: &Reading,
) -> Result<String<N>, core::fmt::Error> {
    let mut payload = String::new();
    write!(
        payload,
        "{{\"sensor_id\":\"{}\",\"temperature\":{:.1},\"humidity\":{:.1}}}",
        sensor_id, reading.temperature, reading.humidity
    )?;
    Ok(payload)
}
