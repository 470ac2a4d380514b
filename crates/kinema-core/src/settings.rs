//! Line-oriented settings streams.
//!
//! Every stage persists its configuration as a short text block: a header
//! line identifying the concrete type, followed by `key: value` scalar
//! fields in a fixed order. Blocks are read back in the order they were
//! written. Buffered history and learned weights are never persisted;
//! loading re-initializes a stage the same way `init` does.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::{Error, Result};

/// Tag opening every per-stage settings block.
pub const MODULE_HEADER_TAG: &str = "kinema-module";

/// Tag opening a whole-pipeline settings stream.
pub const PIPELINE_HEADER_TAG: &str = "kinema-pipeline";

const FORMAT_VERSION: &str = "v1";

/// Writes the stage header line for `type_name`.
pub fn write_header(sink: &mut dyn Write, type_name: &str) -> Result<()> {
    writeln!(sink, "{} {} {}", MODULE_HEADER_TAG, type_name, FORMAT_VERSION)?;
    Ok(())
}

/// Reads a stage header and checks it against the loading type.
///
/// A malformed header is a `Format` error; a well-formed header naming a
/// different type is a `TypeMismatch`.
pub fn read_header(source: &mut dyn BufRead, expected_type: &str) -> Result<()> {
    let line = read_line(source)?;
    let mut parts = line.split_whitespace();
    let tag = parts.next();
    let name = parts.next();
    let version = parts.next();

    if tag != Some(MODULE_HEADER_TAG) || version != Some(FORMAT_VERSION) || parts.next().is_some() {
        return Err(Error::Format(format!("bad module header: {:?}", line)));
    }
    // tag/version matched above, so the name token is present
    let name = name.unwrap_or_default();
    if name != expected_type {
        return Err(Error::TypeMismatch {
            expected: expected_type.to_string(),
            actual: name.to_string(),
        });
    }
    Ok(())
}

/// Writes the pipeline header line.
pub fn write_pipeline_header(sink: &mut dyn Write) -> Result<()> {
    writeln!(sink, "{} {}", PIPELINE_HEADER_TAG, FORMAT_VERSION)?;
    Ok(())
}

/// Reads and validates the pipeline header line.
pub fn read_pipeline_header(source: &mut dyn BufRead) -> Result<()> {
    let line = read_line(source)?;
    if line.trim() != format!("{} {}", PIPELINE_HEADER_TAG, FORMAT_VERSION) {
        return Err(Error::Format(format!("bad pipeline header: {:?}", line)));
    }
    Ok(())
}

/// Writes one `key: value` field line.
pub fn write_field(sink: &mut dyn Write, key: &str, value: impl Display) -> Result<()> {
    writeln!(sink, "{}: {}", key, value)?;
    Ok(())
}

/// Reads one field line and parses its value.
///
/// The key must match exactly: fields are order-sensitive, not a lookup
/// table.
pub fn read_field<T: FromStr>(source: &mut dyn BufRead, key: &str) -> Result<T> {
    let line = read_line(source)?;
    let (found_key, value) = line
        .split_once(':')
        .ok_or_else(|| Error::Format(format!("expected `{}` field, got {:?}", key, line)))?;
    if found_key.trim() != key {
        return Err(Error::Format(format!(
            "expected `{}` field, got `{}`",
            key,
            found_key.trim()
        )));
    }
    value
        .trim()
        .parse()
        .map_err(|_| Error::Format(format!("invalid value for `{}`: {:?}", key, value.trim())))
}

fn read_line(source: &mut dyn BufRead) -> Result<String> {
    let mut line = String::new();
    let bytes = source.read_line(&mut line)?;
    if bytes == 0 {
        return Err(Error::Format("unexpected end of stream".to_string()));
    }
    Ok(line.trim_end().to_string())
}
