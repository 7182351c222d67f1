//! Plain-string encoding for the simple `rename_all` enums used as `TEXT`
//! columns, and JSON encoding for the structured policy fields.

use ratchet_errors::Error;
use serde::{de::DeserializeOwned, Serialize};

pub fn enc<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .expect("enum serialization is infallible")
        .trim_matches('"')
        .to_string()
}

pub fn dec<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    serde_json::from_str(&format!("\"{raw}\"")).map_err(|e| {
        Error::internal(format!("invalid stored enum value {raw:?}: {e}"))
    })
}

pub fn enc_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).expect("JSON serialization is infallible")
}

pub fn dec_json<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    serde_json::from_str(raw).map_err(|e| Error::internal(format!("invalid stored JSON: {e}")))
}
