// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

use std::fmt::{Display, Formatter};
use std::io::{BufReader, ErrorKind, Read};

// Note on UTF-8 encoding
//
//                         |     (hexa)    |                 UTF-8                  |
//     Codepoint Value     |   min    max  | 1st byte  2nd byte  3rd byte  4th byte |
// ------------------------+---------------+----------------------------------------+
//       00000000_0xxxxxxx |   0000   007F | 0xxxxxxx                               |
//       00000yyy_yyxxxxxx |   0080   07FF | 110yyyyy  10xxxxxx                     |
//       zzzzyyyy_yyxxxxxx |   0800   FFFF | 1110zzzz  10yyyyyy  10xxxxxx           |
// uuuuu_zzzzyyyy_yyxxxxxx | 010000 10FFFF | 11110uuu  10uuzzzz  10yyyyyy  10xxxxxx |
//
// Valid codepoint values:
//
// 000000 - 00d7ff
// --------------------------
// 00d800 - 00dfff: forbidden
// --------------------------
// 00e000 - 10ffff

pub const UTF8_MIN: u32      =        0;
pub const UTF8_LOW_MAX: u32  =   0xd7ff;
pub const UTF8_GAP_MIN: u32  =   0xd800;
pub const UTF8_GAP_MAX: u32  =   0xdfff;
pub const UTF8_HIGH_MIN: u32 =   0xe000;
pub const UTF8_MAX: u32      = 0x10ffff;

const UTF8_LENGTH: [u8; 256] = [
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,1,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,
    0,0,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,2,
    3,3,3,3,3,3,3,3,3,3,3,3,3,3,3,3,
    4,4,4,4,4,0,0,0,0,0,0,0,0,0,0,0,
];

#[inline]
/// Determines the number of bytes required to encode a UTF-8 character from its first byte.
pub fn utf8_len(byte: u8) -> usize {
    UTF8_LENGTH[byte as usize] as usize
}

// ---------------------------------------------------------------------------------------------
// Stream contract

/// Character input used by the lexer.
///
/// The stream keeps the window of characters read since the last [begin_token](CharStream::begin_token),
/// so that the lexer can read ahead of the longest match and push back what it doesn't use.
pub trait CharStream {
    /// Reads the next character, or `None` at the end of the stream.
    ///
    /// Once the source has failed, every following read returns the same error.
    fn read_char(&mut self) -> Result<Option<char>, CharReaderError>;

    /// Pushes back the last `n` characters read since the beginning of the token, so they're read again.
    fn backup(&mut self, n: usize) -> Result<(), CharReaderError>;

    /// Starts a new token at the next character.
    fn begin_token(&mut self);

    /// Text read since the last [begin_token](CharStream::begin_token).
    fn get_image(&self) -> String;
}

#[derive(Debug, PartialEq, Clone, Default)]
pub enum CharReaderStatus {
    #[default]
    Reading,
    Error(String),
    Closed
}

#[derive(Clone, Debug, PartialEq)]
pub enum CharReaderError {
    /// `backup(requested)` while only `available` characters were read in the current token
    NoRoomToBackup { requested: usize, available: usize },
    /// invalid UTF-8 sequence at byte `offset`
    Encoding { offset: u64 },
    /// I/O error of the source
    Io(String),
}

impl Display for CharReaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CharReaderError::NoRoomToBackup { requested, available } =>
                write!(f, "can't back up {requested} character(s), only {available} read in the current token"),
            CharReaderError::Encoding { offset } => write!(f, "UTF-8 encoding error at offset {offset}"),
            CharReaderError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for CharReaderError {}

/// UTF-8 character reader implementing [CharStream] on any [Read] source.
pub struct CharReader<R> {
    reader: BufReader<R>,
    /// offset of next character, in bytes
    offset: u64,
    status: CharReaderStatus,
    failure: Option<CharReaderError>,
    /// characters of the current token, including those pushed back
    window: Vec<char>,
    /// number of characters of `window` currently consumed
    cursor: usize,
}

impl<R: Read> CharReader<R> {
    pub fn new(source: R) -> Self {
        CharReader {
            reader: BufReader::new(source),
            offset: 0,
            status: CharReaderStatus::Reading,
            failure: None,
            window: Vec::new(),
            cursor: 0,
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.status, CharReaderStatus::Reading) || self.cursor < self.window.len()
    }

    pub fn get_offset(&self) -> u64 {
        self.offset
    }

    pub fn get_status(&self) -> &CharReaderStatus {
        &self.status
    }

    fn fail(&mut self, error: CharReaderError) -> Result<Option<char>, CharReaderError> {
        self.status = CharReaderStatus::Error(error.to_string());
        self.failure = Some(error.clone());
        Err(error)
    }

    fn decode_char(&mut self) -> Result<Option<char>, CharReaderError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if self.status != CharReaderStatus::Reading {
            return Ok(None);
        }
        let mut buffer = [0; 4];
        match self.reader.read(&mut buffer[0..1]) {
            Ok(0) => {
                self.status = CharReaderStatus::Closed;
                Ok(None)
            }
            Ok(_) => {
                let len = utf8_len(buffer[0]);
                if len == 0 {
                    return self.fail(CharReaderError::Encoding { offset: self.offset });
                }
                if len > 1 {
                    if let Err(e) = self.reader.read_exact(&mut buffer[1..len]) {
                        return match e.kind() {
                            ErrorKind::UnexpectedEof => self.fail(CharReaderError::Encoding { offset: self.offset }),
                            _ => self.fail(CharReaderError::Io(e.to_string())),
                        };
                    }
                }
                match std::str::from_utf8(&buffer[..len]).ok().and_then(|s| s.chars().next()) {
                    Some(c) => Ok(Some(c)),
                    None => self.fail(CharReaderError::Encoding { offset: self.offset }),
                }
            }
            Err(e) => self.fail(CharReaderError::Io(e.to_string())),
        }
    }
}

impl<R: Read> CharStream for CharReader<R> {
    fn read_char(&mut self) -> Result<Option<char>, CharReaderError> {
        let c = if self.cursor < self.window.len() {
            self.window[self.cursor]
        } else {
            let Some(c) = self.decode_char()? else {
                return Ok(None);
            };
            self.window.push(c);
            c
        };
        self.cursor += 1;
        self.offset += c.len_utf8() as u64;
        Ok(Some(c))
    }

    fn backup(&mut self, n: usize) -> Result<(), CharReaderError> {
        if n > self.cursor {
            return Err(CharReaderError::NoRoomToBackup { requested: n, available: self.cursor });
        }
        let bytes: usize = self.window[self.cursor - n..self.cursor].iter().map(|c| c.len_utf8()).sum();
        self.cursor -= n;
        self.offset -= bytes as u64;
        Ok(())
    }

    fn begin_token(&mut self) {
        self.window.drain(..self.cursor);
        self.cursor = 0;
    }

    fn get_image(&self) -> String {
        self.window[..self.cursor].iter().collect()
    }
}

// ---------------------------------------------------------------------------------------------
// Helpers

pub fn escape_char(c: char) -> String {
    match c {
              '\u{0}' => "MIN".to_string(),
           '\u{d7ff}' => "LOW_MAX".to_string(),
           '\u{e000}' => "HIGH_MIN".to_string(),
         '\u{10ffff}' => "MAX".to_string(),
        _ => c.escape_debug().to_string(),
    }
}

pub fn escape_string(s: &str) -> String {
    s.chars().map(escape_char).collect::<String>()
}

// ---------------------------------------------------------------------------------------------
// Macros

pub mod macros {
    /// Replaces a few identifiers by their codepoint value, and casts character / integer literals to `u32`.
    #[macro_export]
    macro_rules! utf8 {
        ( MIN )        => { 0_u32 };
        ( LOW_MAX )    => { 0xd7ff_u32 };
        ( GAP_MIN )    => { 0xd800_u32 };
        ( GAP_MAX )    => { 0xdfff_u32 };
        ( HIGH_MIN )   => { 0xe000_u32 };
        ( MAX )        => { 0x10ffff_u32 };
        ( $a:literal ) => { $a as u32 }
    }
}

// ---------------------------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------------------------
