//! Reads single config files into [`ConfigValue`]s.
//!
//! The syntax is chosen from the file extension. JSON is strict; JSON5, YAML
//! and TOML all accept comments.

mod error;

pub use error::{FormatError, ParseError};

use std::path::Path;

use crate::source::SourceError;
use crate::value::{ConfigValue, Mapping};
use crate::Error;

/// A supported config file syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Json5,
    Yaml,
    Toml,
}

impl Format {
    /// Maps a file extension (without the dot, any case) to its syntax.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "json5" => Some(Format::Json5),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn supports_comments(self) -> bool {
        !matches!(self, Format::Json)
    }

    /// Parses decoded text in this syntax.
    pub fn parse(self, text: &str) -> Result<ConfigValue, FormatError> {
        match self {
            Format::Json => Ok(serde_json::from_str(text)?),
            Format::Json5 => Ok(json5::from_str(text)?),
            Format::Yaml => Ok(serde_yaml::from_str(text)?),
            Format::Toml => {
                let table: toml::Table = toml::from_str(text)?;
                let mut path = Vec::new();
                from_toml_table(table, &mut path)
            }
        }
    }
}

/// Parses raw file contents in `format`. `path` only labels errors.
///
/// A leading UTF-8 byte-order mark is ignored; any other invalid UTF-8 is an error.
pub fn load_bytes(format: Format, path: &Path, bytes: &[u8]) -> Result<ConfigValue, ParseError> {
    let fail = |source| ParseError {
        path: path.to_path_buf(),
        source,
    };

    let text = std::str::from_utf8(bytes).map_err(|e| fail(e.into()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    format.parse(text).map_err(fail)
}

/// Reads and parses a config file from disk, picking the syntax from its extension.
pub fn load_file(path: impl AsRef<Path>) -> Result<ConfigValue, Error> {
    let path = path.as_ref();
    let Some(format) = Format::from_path(path) else {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Err(ParseError {
            path: path.to_path_buf(),
            source: FormatError::Unsupported(extension),
        }
        .into());
    };
    let bytes = std::fs::read(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(load_bytes(format, path, &bytes)?)
}

fn from_toml_table(table: toml::Table, path: &mut Vec<String>) -> Result<ConfigValue, FormatError> {
    let mut mapping = Mapping::new();
    for (key, value) in table {
        path.push(key.clone());
        let converted = from_toml(value, path)?;
        path.pop();
        mapping.insert(key, converted);
    }
    Ok(ConfigValue::Mapping(mapping))
}

fn from_toml(value: toml::Value, path: &mut Vec<String>) -> Result<ConfigValue, FormatError> {
    Ok(match value {
        toml::Value::String(s) => ConfigValue::String(s),
        toml::Value::Integer(i) => ConfigValue::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(ConfigValue::Number)
            .ok_or_else(|| FormatError::NonFiniteNumber(path.join(".")))?,
        toml::Value::Boolean(b) => ConfigValue::Bool(b),
        toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
        toml::Value::Array(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                path.push(index.to_string());
                converted.push(from_toml(item, path)?);
                path.pop();
            }
            ConfigValue::Sequence(converted)
        }
        toml::Value::Table(table) => from_toml_table(table, path)?,
    })
}
