//! Utilities (PDF extraction, unicode cleaning, terminal input).

pub mod pdf;
pub mod unicode;

use std::io::{self, BufRead};

/// Read one line of user input as raw bytes and clean it.
///
/// Returns `None` at end of input. The trailing newline is removed.
pub fn read_input_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    let line = unicode::clean_utf8(&buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
