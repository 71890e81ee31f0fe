use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// A single configuration value as it travels over the wire
///
/// Values that are neither numbers nor strings end up in `Other`, so an odd
/// field type from the device never rejects the whole configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 formatting drops the fraction of integral values: 80.0 is "80"
            FieldValue::Number(number) if number.is_f64() => match number.as_f64() {
                Some(value) => write!(f, "{value}"),
                None => write!(f, "{number}"),
            },
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Other(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! field_value_from_number {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(value: $ty) -> Self {
                    FieldValue::Number(value.into())
                }
            }
        )+
    };
}

field_value_from_number!(u8, u16, u32, u64, i32, i64);

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value)
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::Text(value.to_string()))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Device configuration as reported by `/api/config`
///
/// Only the fields bound to the form are typed. Everything else the device
/// reports is kept verbatim in `extra`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_format_string: Option<FieldValue>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
