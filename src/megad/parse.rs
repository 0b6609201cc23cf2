//! Plain-text response decoding
//!
//! The controller answers sensor queries with bare text: a numeric string,
//! a reserved not-ready word, or (for the scd4x) three `label:value` fields
//! separated by `/`. Decoding is fallible and never partial.

use crate::error::ReadError;
use crate::megad::channel::Channel;

/// Reserved response words meaning "no valid reading this cycle"
const NOT_READY: [&str; 3] = ["NA", "NULL", "busy"];

/// Check whether a response body is a not-ready sentinel.
pub fn is_not_ready(body: &str) -> bool {
    NOT_READY.contains(&body)
}

/// Decode a single-value response body into a number.
pub fn decode_value(body: &str) -> Result<f64, ReadError> {
    if is_not_ready(body) {
        return Err(ReadError::NotReady(body.to_string()));
    }
    body.parse::<f64>()
        .map_err(|_| ReadError::Malformed(format!("not a number: {}", body)))
}

/// Decoded combined scd4x reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedReading {
    pub co2: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl CombinedReading {
    /// Value for one of the three carried channels; `None` for lightlevel.
    pub fn value_for(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Co2 => Some(self.co2),
            Channel::Temperature => Some(self.temperature),
            Channel::Humidity => Some(self.humidity),
            Channel::LightLevel => None,
        }
    }
}

/// Decode a combined response body.
///
/// The firmware guarantees field order (CO2, temperature, humidity), so
/// parsing is positional and the labels are ignored. Anything other than
/// exactly three `label:value` fields discards the whole reading.
pub fn decode_combined(body: &str) -> Result<CombinedReading, ReadError> {
    if is_not_ready(body) {
        return Err(ReadError::NotReady(body.to_string()));
    }

    let fields: Vec<&str> = body.split('/').collect();
    if fields.len() != 3 {
        return Err(ReadError::Malformed(format!(
            "expected 3 fields, got {}: {}",
            fields.len(),
            body
        )));
    }

    let mut values = [0f64; 3];
    for (i, field) in fields.iter().enumerate() {
        let raw = field
            .split_once(':')
            .map(|(_, value)| value)
            .ok_or_else(|| ReadError::Malformed(format!("missing ':' in field: {}", field)))?;
        values[i] = raw
            .parse::<f64>()
            .map_err(|_| ReadError::Malformed(format!("not a number: {}", raw)))?;
    }

    Ok(CombinedReading {
        co2: values[0],
        temperature: values[1],
        humidity: values[2],
    })
}
