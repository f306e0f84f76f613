//! Down-direction padding
//!
//! The down block of a migration is analyzed on its own, but its diagnostics
//! must point at lines of the whole file. Prefixing it with a blanked-out copy
//! of the up block keeps every byte offset, and so every line number, equal to
//! its position in the original file.

/// Terminator placed in the padding so it parses as an empty statement.
const STATEMENT_TERMINATOR: char = ';';

/// Build the text an analyzer scans for the down direction.
///
/// The result starts with a copy of `up` in which every newline is kept, the
/// last non-newline byte becomes `;` and every other byte becomes a space.
/// `down` follows unmodified. For the usual `up` ending in `"...;\n"` this is
/// "second-to-last byte is `;`, last byte is a newline".
///
/// The padding has exactly `up.len()` bytes and the same newlines as `up`, so
/// any offset at or past `up.len()` resolves to the same line in the result as
/// in `up + down`. An `up` with no non-newline bytes gets no terminator.
pub fn pad_down_migration(up: &str, down: &str) -> String {
    let terminator_at = up.bytes().rposition(|byte| byte != b'\n');

    let mut padded = String::with_capacity(up.len() + down.len());
    for (index, byte) in up.bytes().enumerate() {
        let replacement = if byte == b'\n' {
            '\n'
        } else if Some(index) == terminator_at {
            STATEMENT_TERMINATOR
        } else {
            ' '
        };
        padded.push(replacement);
    }
    padded.push_str(down);
    padded
}
