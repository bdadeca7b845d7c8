use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    from_slice_with_path(src.as_bytes())
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| Error::Decode {
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Outer {
        inner: Vec<Inner>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Inner {
        limit: usize,
    }

    #[test]
    fn error_names_the_failing_path() {
        let err = from_str_with_path::<Outer>(r#"{"inner": [{"limit": 1}, {"limit": "x"}]}"#)
            .unwrap_err();
        match err {
            Error::Decode { path, .. } => assert_eq!(path, "inner[1].limit"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
