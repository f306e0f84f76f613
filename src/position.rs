//! Byte offset to editor coordinate resolution
//!
//! pg_query reports each statement as a raw byte offset into the text it was
//! given. That offset usually points at the newline following the previous
//! statement's terminator, or at a comment preceding the statement. The
//! functions here skip that leading trivia and turn the result into a
//! `(line, character)` pair the way a code editor displays it.
//!
//! All offsets are byte offsets. Character positions are byte columns.

/// Marker that starts a SQL line comment.
pub const COMMENT_PREFIX: &str = "--";

/// A 1-indexed `(line, character)` coordinate.
///
/// `line_position` 0 is valid and means "the newline right before the start
/// of the line". Renderers map it to column 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextLocation {
    pub line_number: i64,
    pub line_position: i64,
}

impl TextLocation {
    /// Sentinel for "no specific source position applies".
    pub const UNKNOWN: TextLocation = TextLocation {
        line_number: -1,
        line_position: -1,
    };

    pub fn new(line_number: i64, line_position: i64) -> Self {
        Self {
            line_number,
            line_position,
        }
    }
}

fn is_newline(text: &str, position: usize) -> bool {
    text.as_bytes().get(position) == Some(&b'\n')
}

/// Advance past spaces and tabs. Newlines are never consumed.
pub fn skip_space(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let mut offset = offset;
    while offset < bytes.len() && matches!(bytes[offset], b' ' | b'\t') {
        offset += 1;
    }
    offset
}

/// True iff the two bytes at `position` are the comment prefix.
pub fn is_comment_start(text: &str, position: usize) -> bool {
    position
        .checked_add(COMMENT_PREFIX.len())
        .and_then(|end| text.as_bytes().get(position..end))
        == Some(COMMENT_PREFIX.as_bytes())
}

/// Advance until a newline or the end of the text.
pub fn skip_to_line_end(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    let mut offset = offset;
    while offset < bytes.len() && bytes[offset] != b'\n' {
        offset += 1;
    }
    offset
}

/// Skip a line comment starting at `offset`.
///
/// A comment is recognised in two places:
/// 1. `offset` is a newline immediately followed by a comment (pg_query puts
///    statement locations at such positions), or
/// 2. `offset` is directly on a comment.
///
/// In both cases the result is the newline ending the comment (or the end of
/// the text). Anything else is returned unchanged.
pub fn skip_trivia(text: &str, offset: usize) -> usize {
    let mut offset = offset;
    if is_newline(text, offset) && is_comment_start(text, offset + 1) {
        offset += 1;
    }
    if is_comment_start(text, offset) {
        offset = skip_to_line_end(text, offset);
    }
    offset
}

/// Skip any run of whitespace, line comments and newlines.
///
/// Each iteration skips spaces, then a comment, then exactly one newline, and
/// the loop stops once an iteration makes no progress. If spaces or a comment
/// run through the end of the text, the index of the last byte is returned.
/// Consuming a final trailing newline yields `text.len()`.
///
/// The position never decreases and every iteration either advances or
/// terminates the loop, so this is linear in the length of `text`.
pub fn skip_leading_trivia_and_newlines(text: &str, offset: usize) -> usize {
    let len = text.len();
    let mut position = offset;
    while position < len {
        let starting_position = position;

        position = skip_space(text, position);
        if position >= len {
            return len - 1;
        }

        position = skip_trivia(text, position);
        if position >= len {
            return len - 1;
        }

        if is_newline(text, position) {
            position += 1;
        }

        if position == starting_position {
            break;
        }
    }
    position
}

/// Resolve a byte offset into a [`TextLocation`].
///
/// Offsets outside `[0, text.len())` resolve to [`TextLocation::UNKNOWN`].
///
/// A newline belongs to the start of the line it opens: for `"hello\nworld"`
/// offset 5 resolves to `(2, 0)`, not `(1, 6)`.
pub fn resolve(text: &str, byte_offset: usize) -> TextLocation {
    let bytes = text.as_bytes();
    if byte_offset >= bytes.len() {
        return TextLocation::UNKNOWN;
    }

    let mut line_number: i64 = 1;
    // Byte offset of the newline preceding the current line; line 1 has a
    // virtual one at -1.
    let mut preceding_newline: i64 = -1;
    for (offset, byte) in bytes[..=byte_offset].iter().enumerate() {
        if *byte == b'\n' {
            line_number += 1;
            preceding_newline = offset as i64;
        }
    }

    TextLocation {
        line_number,
        line_position: byte_offset as i64 - preceding_newline,
    }
}

/// Location of the first meaningful character of a statement whose raw
/// location (as reported by the parser) is `statement_offset`.
pub fn locate_statement(text: &str, statement_offset: usize) -> TextLocation {
    resolve(text, skip_leading_trivia_and_newlines(text, statement_offset))
}
