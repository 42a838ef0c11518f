//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Description                                               |
//! |------|-----------------------------------------------------------|
//! | 0    | Success, every key matched on both sides                  |
//! | 1    | Rows differ or are missing on one side (like `diff(1)`)   |
//! | 2    | CLI usage error (bad args, unknown column on the CLI)     |
//! | 3    | Invalid config (parse/validation, unknown mapped column)  |
//! | 4    | Input read or CSV parse failure                           |
//! | 5    | Output write or serialization failure                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

/// Success - reconciliation clean, or validation passed.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found: at least one Different, MissingInCompare or
/// MissingInSource row.
pub const EXIT_DIFFERENCES: u8 = 1;

/// Usage error - bad arguments, malformed `--map` pair.
pub const EXIT_USAGE: u8 = 2;

/// Config file could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An input file could not be read or decoded as CSV.
pub const EXIT_INPUT: u8 = 4;

/// The report could not be serialized or written.
pub const EXIT_OUTPUT: u8 = 5;
