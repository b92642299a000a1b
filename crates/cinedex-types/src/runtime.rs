use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const UNIT: &str = "mins";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid runtime format")]
    InvalidFormat,
}

/// Movie running time in whole minutes.
///
/// In JSON it is always a string of form `"<minutes> mins"`, e.g. `"102 mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(i32);

impl Runtime {
    pub const fn new(minutes: i32) -> Self {
        Runtime(minutes)
    }

    pub const fn minutes(self) -> i32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for Runtime {
    fn from(value: i32) -> Self {
        Runtime(value)
    }
}

impl From<Runtime> for i32 {
    fn from(value: Runtime) -> Self {
        value.0
    }
}

impl Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, UNIT)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(' ').collect::<Vec<_>>();
        match parts.as_slice() {
            [value, UNIT] => value
                .parse::<i32>()
                .map(Runtime)
                .map_err(|_| RuntimeError::InvalidFormat),
            _ => Err(RuntimeError::InvalidFormat),
        }
    }
}

impl Serialize for Runtime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Any JSON value is accepted here, so that a number or object fails
        // with the runtime error rather than a generic type error
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => s.parse().map_err(de::Error::custom),
            _ => Err(de::Error::custom(RuntimeError::InvalidFormat)),
        }
    }
}
