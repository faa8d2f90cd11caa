// Dotted-path access into data dictionaries
//
// Menu components bind to a shared `serde_json::Value` model addressed by
// paths like "tavern.supplies.ale". A numeric segment indexes into an array
// ("stock.2.selected"), which is how list items address their own row. A
// missing segment is a named error, never a silent default, so a typo in a
// menu description fails at bind time.

use crate::error::PathError;
use serde_json::Value;

/// Resolve `path` ("a.b.c") against a nested value, returning the value at
/// the final segment.
pub fn read_path<'a>(data: &'a Value, path: &str) -> Result<&'a Value, PathError> {
    let mut current = data;
    for key in path.split('.') {
        let missing = || PathError::MissingKey {
            path: path.to_string(),
            key: key.to_string(),
        };
        let wrong_shape = || PathError::NotAnObject {
            path: path.to_string(),
            key: key.to_string(),
        };
        current = match current {
            Value::Object(map) => map.get(key).ok_or_else(missing)?,
            Value::Array(items) => {
                let index: usize = key.parse().map_err(|_| wrong_shape())?;
                items.get(index).ok_or_else(missing)?
            }
            _ => return Err(wrong_shape()),
        };
    }
    Ok(current)
}

/// Write `value` at `path`, replacing whatever the final segment held.
/// Every segment but the last must already exist; a final object key may be
/// new (the write creates it), a final array index must be in bounds.
pub fn write_path(data: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    let mut current = data;
    let mut segments = path.split('.').peekable();
    while let Some(key) = segments.next() {
        let last = segments.peek().is_none();
        let missing = || PathError::MissingKey {
            path: path.to_string(),
            key: key.to_string(),
        };
        let wrong_shape = || PathError::NotAnObject {
            path: path.to_string(),
            key: key.to_string(),
        };
        match current {
            Value::Object(map) => {
                if last {
                    map.insert(key.to_string(), value);
                    return Ok(());
                }
                current = map.get_mut(key).ok_or_else(missing)?;
            }
            Value::Array(items) => {
                let index: usize = key.parse().map_err(|_| wrong_shape())?;
                let slot = items.get_mut(index).ok_or_else(missing)?;
                if last {
                    *slot = value;
                    return Ok(());
                }
                current = slot;
            }
            _ => return Err(wrong_shape()),
        }
    }
    Ok(())
}
