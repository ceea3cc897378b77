use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T> {
    let mut de = serde_json::Deserializer::from_str(src);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_parse_error)?;
    de.end().map_err(syntax_error)?;
    Ok(value)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_parse_error)?;
    de.end().map_err(syntax_error)?;
    Ok(value)
}

pub fn from_reader_with_path<T: DeserializeOwned, R: std::io::Read>(reader: R) -> Result<T> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(into_parse_error)?;
    de.end().map_err(syntax_error)?;
    Ok(value)
}

fn into_parse_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err.path().to_string();
    let inner = err.into_inner();
    if path.is_empty() || path == "?" || path == "." {
        return syntax_error(inner);
    }
    Error::Parse { path, message: inner.to_string() }
}

fn syntax_error(err: serde_json::Error) -> Error {
    Error::Syntax { message: err.to_string() }
}
