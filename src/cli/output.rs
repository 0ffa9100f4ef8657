//! Output-mode helpers shared by all subcommands.
//!
//! Global flags are exported as environment variables by `main` so every
//! module can check them without threading the CLI struct through.

/// Whether `--json` was passed.
pub fn is_json() -> bool {
    std::env::var("CARDPROBE_JSON").is_ok()
}

/// Whether `--quiet` was passed.
pub fn is_quiet() -> bool {
    std::env::var("CARDPROBE_QUIET").is_ok()
}

/// Print a JSON value to stdout, pretty-printed.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(_) => println!("{value}"),
    }
}
