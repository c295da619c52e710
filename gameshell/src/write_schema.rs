use common::ops::Frame;
use schemars::schema_for;

/// Dump the wire types for the UI build. `Frame` pulls in every push
/// message and snapshot type transitively.
pub fn write_types() {
    let schema = schema_for!(Frame);
    let out: String = serde_json::to_string_pretty(&schema).unwrap();
    let _ = std::fs::write("ui/rust_types.json", out);
}
