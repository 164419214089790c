use std::{fmt, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A marketplace provider supported by the bot. Each platform carries its own
/// wire format, status vocabulary and transition rules; the enum is the key
/// under which clients, parsers and dedup sets are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Yandex,
    Ozon,
}

#[derive(Debug, Clone, Error)]
#[error("Unsupported marketplace platform: {0}")]
pub struct UnsupportedPlatform(pub String);

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Yandex => "yandex",
            Platform::Ozon => "ozon",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnsupportedPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yandex" => Ok(Platform::Yandex),
            "ozon" => Ok(Platform::Ozon),
            other => Err(UnsupportedPlatform(other.to_string())),
        }
    }
}
