//! Device classification
//!
//! The candidate generator needs to know what kind of device the process is
//! running on: an Android emulator reaches its host through `10.0.2.2`, while
//! web, desktop, and the iOS simulator all reach it through loopback.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The class of device the client is running on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Web,
    Android,
    Ios,
    Desktop,
}

#[derive(Error, Debug)]
#[error("Unknown device class '{0}' (expected web, android, ios, or desktop)")]
pub struct UnknownDeviceClass(String);

impl DeviceClass {
    /// Classify from the compile target. Wasm builds count as web; anything
    /// that is not android or ios counts as desktop.
    pub fn detect() -> Self {
        if cfg!(target_arch = "wasm32") {
            DeviceClass::Web
        } else if cfg!(target_os = "android") {
            DeviceClass::Android
        } else if cfg!(target_os = "ios") {
            DeviceClass::Ios
        } else {
            DeviceClass::Desktop
        }
    }
}

impl FromStr for DeviceClass {
    type Err = UnknownDeviceClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(DeviceClass::Web),
            "android" => Ok(DeviceClass::Android),
            "ios" => Ok(DeviceClass::Ios),
            "desktop" => Ok(DeviceClass::Desktop),
            other => Err(UnknownDeviceClass(other.to_string())),
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceClass::Web => "web",
            DeviceClass::Android => "android",
            DeviceClass::Ios => "ios",
            DeviceClass::Desktop => "desktop",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_roundtrip() {
        for class in [
            DeviceClass::Web,
            DeviceClass::Android,
            DeviceClass::Ios,
            DeviceClass::Desktop,
        ] {
            assert_eq!(class.to_string().parse::<DeviceClass>().unwrap(), class);
        }
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("Android".parse::<DeviceClass>().unwrap(), DeviceClass::Android);
        assert!("watch".parse::<DeviceClass>().is_err());
    }
}
