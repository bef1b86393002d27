//! Constants shared across the call-tree builder.

/// Separator used to compose call-site and log-site keys.
///
/// A call site is keyed `filename||functionName`; a log site nested under it
/// is keyed `filename||functionName||lineNumber`. The instrumentation side
/// never emits `||` inside a path or identifier.
pub const KEY_SEPARATOR: &str = "||";

/// Default horizontal indentation per tree depth level, in pixels.
///
/// Used by drag-projection when the embedding UI does not supply its own.
pub const DEFAULT_INDENTATION_WIDTH: f64 = 50.0;

/// Compose the call-site key for a (filename, functionName) pair.
pub fn call_site_key(filename: &str, function_name: &str) -> String {
    format!("{}{}{}", filename, KEY_SEPARATOR, function_name)
}

/// Compose the log-site key for a console line within a call site.
pub fn log_site_key(call_site_key: &str, line_number: u32) -> String {
    format!("{}{}{}", call_site_key, KEY_SEPARATOR, line_number)
}
