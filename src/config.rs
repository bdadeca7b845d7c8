use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Knobs for the request and form layers. Every field has a default, so a settings
/// file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Most bytes read from an urlencoded or JSON body.
    pub body_limit: usize,
    /// Key a failed action nests its form state under.
    pub transport_key: String,
    /// HTTP status of a failed action.
    pub failure_status: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            body_limit: 2 * 1024 * 1024,
            transport_key: "_forms".to_string(),
            failure_status: 400,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        crate::path_de::from_slice_with_path(&bytes)
    }
}

impl FromStr for Settings {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_keep_defaults() {
        let settings: Settings = r#"{"failure-status": 422}"#.parse().unwrap();
        assert_eq!(settings.failure_status, 422);
        assert_eq!(settings.transport_key, "_forms");
        assert_eq!(settings.body_limit, Settings::default().body_limit);
    }

    #[test]
    fn bad_values_report_their_path_and_unknown_keys_fail() {
        let err = "{\"body-limit\": \"big\"}".parse::<Settings>().unwrap_err();
        match err {
            Error::Decode { path, .. } => assert_eq!(path, "body-limit"),
            other => panic!("unexpected {other:?}"),
        }
        assert!("{\"colour\": 1}".parse::<Settings>().is_err());
    }
}
