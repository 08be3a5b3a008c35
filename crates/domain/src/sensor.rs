//! Sensor channels — typed readings a hub device reports.
//!
//! A device can expose several channels of the same type at different
//! scales (e.g. power in both W and kWh), so a channel is always addressed
//! by the (type, scale) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of measurement a sensor channel reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Humidity,
    RainRate,
    RainTotal,
    WindDirection,
    WindAverage,
    WindGust,
    Uv,
    Power,
    Luminance,
    DewPoint,
    BarometricPressure,
    GenericMeter,
    Weight,
    Co2,
    Volume,
    Loudness,
    Pm25,
    Co,
    Moisture,
}

/// Power channel scales.
pub mod power_scale {
    pub const KVAH: u8 = 1;
    pub const KWH: u8 = 2;
    pub const WATT: u8 = 3;
    pub const VOLT: u8 = 4;
    pub const AMPERE: u8 = 5;
    pub const POWER_FACTOR: u8 = 6;
}

/// Temperature channel scales.
pub mod temperature_scale {
    pub const CELSIUS: u8 = 0;
    pub const FAHRENHEIT: u8 = 1;
}

/// Luminance channel scales.
pub mod luminance_scale {
    pub const PERCENT: u8 = 0;
    pub const LUX: u8 = 1;
}

impl SensorType {
    /// Short identifier used in entity ids and topic names.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Temperature => "temp",
            Self::Humidity => "humidity",
            Self::RainRate => "rrate",
            Self::RainTotal => "rtot",
            Self::WindDirection => "wdir",
            Self::WindAverage => "wavg",
            Self::WindGust => "wgust",
            Self::Uv => "uv",
            Self::Power => "power",
            Self::Luminance => "lum",
            Self::DewPoint => "dewp",
            Self::BarometricPressure => "barpress",
            Self::GenericMeter => "genmeter",
            Self::Weight => "weight",
            Self::Co2 => "co2",
            Self::Volume => "volume",
            Self::Loudness => "loudness",
            Self::Pm25 => "pm25",
            Self::Co => "co",
            Self::Moisture => "moisture",
        }
    }

    /// Human-readable label for entity names, refined per scale where the
    /// type alone is ambiguous (power channels).
    #[must_use]
    pub fn label(self, scale: u8) -> &'static str {
        match self {
            Self::Power => match scale {
                power_scale::KVAH => "apparent energy",
                power_scale::KWH => "energy",
                power_scale::WATT => "power",
                power_scale::VOLT => "volt",
                power_scale::AMPERE => "current",
                power_scale::POWER_FACTOR => "power factor",
                _ => "unknown",
            },
            Self::Temperature => "temp",
            Self::Humidity => "humidity",
            Self::RainRate => "rrate",
            Self::RainTotal => "rtot",
            Self::WindDirection => "wdir",
            Self::WindAverage => "wavg",
            Self::WindGust => "wgust",
            Self::Uv => "uv",
            Self::Luminance => "lum",
            Self::DewPoint => "dewp",
            Self::BarometricPressure => "barpress",
            Self::GenericMeter => "genmeter",
            Self::Weight => "weight",
            Self::Co2 => "co2",
            Self::Volume => "volume",
            Self::Loudness => "loudness",
            Self::Pm25 => "pm25",
            Self::Co => "co",
            Self::Moisture => "moisture",
        }
    }

    /// Unit of measurement for the given scale, empty when unknown.
    #[must_use]
    pub fn unit(self, scale: u8) -> &'static str {
        match self {
            Self::Power => match scale {
                power_scale::KVAH => "kVAh",
                power_scale::KWH => "kWh",
                power_scale::WATT => "W",
                power_scale::VOLT => "V",
                power_scale::AMPERE => "A",
                power_scale::POWER_FACTOR => "PF",
                _ => "",
            },
            Self::Temperature => match scale {
                temperature_scale::CELSIUS => "°C",
                temperature_scale::FAHRENHEIT => "°F",
                _ => "",
            },
            Self::Humidity | Self::Moisture => "%",
            Self::RainRate => "mm/h",
            Self::RainTotal => "mm",
            Self::WindAverage | Self::WindGust => "m/s",
            Self::Luminance => match scale {
                luminance_scale::PERCENT => "%",
                luminance_scale::LUX => "lux",
                _ => "",
            },
            Self::BarometricPressure => "kPa",
            _ => "",
        }
    }

    /// Home Assistant `device_class` for the given scale, if one applies.
    #[must_use]
    pub fn device_class(self, scale: u8) -> Option<&'static str> {
        match self {
            Self::Power => match scale {
                power_scale::KWH => Some("energy"),
                power_scale::WATT => Some("power"),
                power_scale::VOLT => Some("voltage"),
                power_scale::AMPERE => Some("current"),
                power_scale::POWER_FACTOR => Some("power_factor"),
                _ => None,
            },
            Self::Temperature => Some("temperature"),
            Self::Humidity => Some("humidity"),
            Self::Luminance => Some("illuminance"),
            Self::BarometricPressure => Some("pressure"),
            Self::Co2 => Some("carbon_dioxide"),
            Self::Volume => Some("gas"),
            Self::Loudness => Some("signal_strength"),
            Self::Pm25 => Some("pm25"),
            Self::Co => Some("carbon_monoxide"),
            Self::Moisture => Some("moisture"),
            _ => None,
        }
    }

    /// Home Assistant `state_class` for the given scale.
    ///
    /// Accumulating counters are `total_increasing`, everything else is a
    /// plain `measurement`.
    #[must_use]
    pub fn state_class(self, scale: u8) -> &'static str {
        match self {
            Self::RainTotal => "total_increasing",
            Self::Power if scale == power_scale::KWH => "total_increasing",
            _ => "measurement",
        }
    }
}

/// A single reading on one sensor channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// What this channel measures.
    pub sensor_type: SensorType,
    /// Scale discriminator within the type (hub protocol value).
    pub scale: u8,
    /// Most recent value.
    pub value: f64,
    /// When the hub last refreshed the value.
    pub last_updated: Option<DateTime<Utc>>,
}

impl SensorReading {
    /// Create a reading without a last-updated timestamp.
    #[must_use]
    pub fn new(sensor_type: SensorType, scale: u8, value: f64) -> Self {
        Self {
            sensor_type,
            scale,
            value,
            last_updated: None,
        }
    }
}
