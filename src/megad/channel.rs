//! Sensor channels and their I2C query descriptors

use serde::{Deserialize, Serialize};

/// Logical sensor endpoint on the wallmount bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Humidity,
    Temperature,
    LightLevel,
    Co2,
}

/// Query descriptor for a single-sensor request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2cQuery {
    /// `i2c_dev` value selecting the sensor driver on the controller
    pub device: &'static str,
    /// Optional `i2c_par` sub-parameter
    pub param: Option<&'static str>,
}

/// Device tag for the combined CO2/temperature/humidity reading
pub const COMBINED_DEVICE: &str = "scd4x";

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Humidity,
        Channel::Temperature,
        Channel::LightLevel,
        Channel::Co2,
    ];

    /// The channel's own single-value query. Temperature is a sub-reading of
    /// the htu21d humidity sensor, selected with `i2c_par=1`.
    pub fn query(&self) -> I2cQuery {
        match self {
            Channel::Humidity => I2cQuery {
                device: "htu21d",
                param: None,
            },
            Channel::Temperature => I2cQuery {
                device: "htu21d",
                param: Some("1"),
            },
            Channel::LightLevel => I2cQuery {
                device: "max44009",
                param: None,
            },
            Channel::Co2 => I2cQuery {
                device: "t67xx",
                param: None,
            },
        }
    }

    /// True for channels carried by the combined scd4x response.
    pub fn in_combined(&self) -> bool {
        !matches!(self, Channel::LightLevel)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Humidity => "humidity",
            Channel::Temperature => "temperature",
            Channel::LightLevel => "lightlevel",
            Channel::Co2 => "co2",
        }
    }
}
