use std::io::{self, Write};

use serde::Serialize;
use serde_json::{json, Value};
use sonar_core::MarketStatusView;

use crate::error::CliError;

pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{payload}");
    Ok(())
}

/// Write one reply chunk and flush so it appears immediately.
pub fn write_chunk(out: &mut impl Write, chunk: &str) -> io::Result<()> {
    out.write_all(chunk.as_bytes())?;
    out.flush()
}

/// JSON shape of a poller view.
pub fn status_view(view: &MarketStatusView) -> Result<Value, CliError> {
    let snapshot = match view.snapshot.as_deref() {
        Some(snapshot) => serde_json::to_value(snapshot)?,
        None => Value::Null,
    };
    Ok(json!({
        "snapshot": snapshot,
        "error": view.error,
        "last_success": view.last_success,
        "attempts": view.attempts,
        "stale": view.is_stale(),
    }))
}
