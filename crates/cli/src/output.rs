//! Terminal output.
//!
//! Results go to stdout; logs go to stderr through `tracing`.

use serde::Serialize;

/// Print a line of text.
#[allow(clippy::print_stdout)]
pub fn line(text: impl std::fmt::Display) {
    println!("{text}");
}

/// Ask for input on stderr so stdout stays clean for results.
#[allow(clippy::print_stderr)]
pub fn prompt(label: &str) {
    eprint!("{label}: ");
}

/// Print `value` as pretty JSON.
///
/// # Errors
///
/// Returns an error if `value` cannot be encoded.
#[allow(clippy::print_stdout)]
pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
