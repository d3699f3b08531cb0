use core::fmt::Write;

use heapless::String;

pub const LINE_CAPACITY: usize = 64;
/// Longest accepted line; the last slot of the buffer stays free.
const MAX_CHARS: usize = LINE_CAPACITY - 1;

pub type Line = String<LINE_CAPACITY>;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;
const BELL: u8 = 0x07;

/// Single-character line editor fed from the UART, one byte per call.
pub struct LineReader {
    buf: Line,
}

impl LineReader {
    pub const fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Consumes one input byte, echoing to `echo`.
    ///
    /// Returns the finished line when `byte` is a terminator; the internal
    /// buffer is empty again afterwards.
    pub fn feed<W: Write>(&mut self, byte: u8, echo: &mut W) -> Option<Line> {
        match byte {
            DELETE | BACKSPACE => {
                if self.buf.pop().is_some() {
                    echo.write_str("\x08 \x08").ok();
                }
                None
            }
            BELL => None,
            b'\r' | b'\n' => {
                echo.write_str("\n").ok();
                Some(core::mem::take(&mut self.buf))
            }
            b if b.is_ascii() => {
                if self.buf.len() < MAX_CHARS {
                    let c = b as char;
                    // Cannot fail, the length was checked above
                    self.buf.push(c).ok();
                    echo.write_char(c).ok();
                }
                None
            }
            _ => None,
        }
    }

    pub fn pending(&self) -> &str {
        &self.buf
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String as StdString;

    fn feed_all(reader: &mut LineReader, bytes: &[u8], echo: &mut StdString) -> Vec<Line> {
        bytes.iter().filter_map(|b| reader.feed(*b, echo)).collect()
    }

    #[test]
    fn returns_line_once_on_terminator() {
        let mut reader = LineReader::new();
        let mut echo = StdString::new();
        let lines = feed_all(&mut reader, b"hi\r", &mut echo);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_str(), "hi");
        assert_eq!(reader.pending(), "");
        assert_eq!(echo, "hi\n");
    }

    #[test]
    fn backspace_erases_last_char() {
        let mut reader = LineReader::new();
        let mut echo = StdString::new();
        let lines = feed_all(&mut reader, b"a\x7f\n", &mut echo);
        assert_eq!(lines[0].as_str(), "");
        assert_eq!(echo, "a\x08 \x08\n");

        let lines = feed_all(&mut reader, b"ab\x08c\r", &mut echo);
        assert_eq!(lines[0].as_str(), "ac");
    }

    #[test]
    fn backspace_on_empty_buffer_is_silent() {
        let mut reader = LineReader::new();
        let mut echo = StdString::new();
        assert!(reader.feed(DELETE, &mut echo).is_none());
        assert_eq!(echo, "");
    }

    #[test]
    fn bell_is_ignored() {
        let mut reader = LineReader::new();
        let mut echo = StdString::new();
        let lines = feed_all(&mut reader, b"x\x07y\r", &mut echo);
        assert_eq!(lines[0].as_str(), "xy");
        assert_eq!(echo, "xy\n");
    }

    #[test]
    fn overflow_drops_input_until_terminator() {
        let mut reader = LineReader::new();
        let mut echo = StdString::new();
        let input = [b'z'; 80];
        assert!(feed_all(&mut reader, &input, &mut echo).is_empty());
        assert_eq!(reader.pending().len(), MAX_CHARS);

        // Room again after a backspace
        reader.feed(DELETE, &mut echo);
        reader.feed(b'q', &mut echo);
        let line = reader.feed(b'\r', &mut echo).unwrap();
        assert_eq!(line.len(), MAX_CHARS);
        assert!(line.ends_with('q'));
    }

    #[test]
    fn non_ascii_is_dropped() {
        let mut reader = LineReader::new();
        let mut echo = StdString::new();
        let lines = feed_all(&mut reader, &[b'a', 0xc3, 0xa9, b'\n'], &mut echo);
        assert_eq!(lines[0].as_str(), "a");
    }
}
