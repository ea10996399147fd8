//! Byte-to-text decoding with an ordered encoding fallback list
//!
//! Uploaded text files carry no reliable charset declaration, so each
//! candidate encoding is tried in turn as a strict, pure attempt. The first
//! attempt that succeeds wins. When none does, the bytes are read as UTF-8
//! with invalid sequences dropped, so decoding as a whole never fails.

use thiserror::Error;

/// Encodings tried by [`decode_text`], in this order
pub const FALLBACK_ORDER: [TextEncoding; 6] = [
    TextEncoding::Utf8,
    TextEncoding::Utf16,
    TextEncoding::Utf16Le,
    TextEncoding::Utf16Be,
    TextEncoding::Latin1,
    TextEncoding::Windows1252,
];

/// A text encoding the decoder knows how to attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-16 with a byte-order mark
    Utf16,
    Utf16Le,
    Utf16Be,
    Latin1,
    Windows1252,
}

/// Why a single decoding attempt rejected the input
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid {encoding} sequence at byte {offset}")]
    InvalidSequence {
        encoding: &'static str,
        offset: usize,
    },

    #[error("{0} input has odd length")]
    OddLength(&'static str),

    #[error("missing byte-order mark")]
    MissingBom,

    #[error("byte layout is implausible for {0}")]
    Implausible(&'static str),

    #[error("byte 0x{byte:02X} is not defined in {encoding}")]
    UndefinedByte { encoding: &'static str, byte: u8 },

    #[error("text contains NUL characters")]
    ContainsNul,
}

/// Result of decoding a byte buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// The encoding that succeeded, or `None` when the lossy fallback was used
    pub encoding: Option<TextEncoding>,
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf16Le => "utf-16-le",
            TextEncoding::Utf16Be => "utf-16-be",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
        }
    }

    /// Strictly decode `bytes` under this encoding
    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            TextEncoding::Utf8 => decode_utf8(bytes),
            TextEncoding::Utf16 => decode_utf16_bom(bytes),
            TextEncoding::Utf16Le => decode_utf16_plain(bytes, Endian::Little),
            TextEncoding::Utf16Be => decode_utf16_plain(bytes, Endian::Big),
            TextEncoding::Latin1 => decode_latin1(bytes),
            TextEncoding::Windows1252 => decode_cp1252(bytes),
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode bytes to text, trying every encoding in [`FALLBACK_ORDER`]
pub fn decode_text(bytes: &[u8]) -> Decoded {
    for encoding in FALLBACK_ORDER {
        match encoding.decode(bytes) {
            Ok(text) => {
                tracing::debug!("Decoded {} bytes as {}", bytes.len(), encoding);
                return Decoded {
                    text: canonicalize(text),
                    encoding: Some(encoding),
                };
            }
            Err(e) => tracing::trace!("{} attempt rejected: {}", encoding, e),
        }
    }

    tracing::debug!(
        "No encoding matched {} bytes, dropping invalid sequences",
        bytes.len()
    );
    Decoded {
        text: canonicalize(decode_lossy(bytes)),
        encoding: None,
    }
}

/// UTF-8 read that drops invalid sequences instead of replacing them
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

// A `String` cannot hold unrepresentable characters, so only the BOM needs removing.
fn canonicalize(text: String) -> String {
    match text.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::InvalidSequence {
        encoding: "utf-8",
        offset: e.valid_up_to(),
    })?;
    if text.contains('\0') {
        return Err(DecodeError::ContainsNul);
    }
    Ok(text.to_string())
}

#[derive(Clone, Copy)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn name(self) -> &'static str {
        match self {
            Endian::Little => "utf-16-le",
            Endian::Big => "utf-16-be",
        }
    }

    fn unit(self, pair: &[u8]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes([pair[0], pair[1]]),
            Endian::Big => u16::from_be_bytes([pair[0], pair[1]]),
        }
    }
}

fn decode_utf16_bom(bytes: &[u8]) -> Result<String, DecodeError> {
    // The BOM is kept in the output and stripped by canonicalize.
    match bytes {
        [0xFF, 0xFE, ..] => decode_utf16_units(bytes, Endian::Little),
        [0xFE, 0xFF, ..] => decode_utf16_units(bytes, Endian::Big),
        _ => Err(DecodeError::MissingBom),
    }
}

fn decode_utf16_plain(bytes: &[u8], endian: Endian) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength(endian.name()));
    }

    // For mostly-ASCII text the high byte of each unit is zero. Require that
    // pattern to favor this byte order over the opposite one.
    let (mut high_zeros, mut low_zeros) = (0usize, 0usize);
    for pair in bytes.chunks_exact(2) {
        let (low, high) = match endian {
            Endian::Little => (pair[0], pair[1]),
            Endian::Big => (pair[1], pair[0]),
        };
        if high == 0 {
            high_zeros += 1;
        }
        if low == 0 {
            low_zeros += 1;
        }
    }
    if high_zeros == 0 || high_zeros <= low_zeros {
        return Err(DecodeError::Implausible(endian.name()));
    }

    decode_utf16_units(bytes, endian)
}

fn decode_utf16_units(bytes: &[u8], endian: Endian) -> Result<String, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength(endian.name()));
    }

    let units = bytes.chunks_exact(2).map(|pair| endian.unit(pair));
    let mut text = String::with_capacity(bytes.len() / 2);
    for (index, decoded) in char::decode_utf16(units).enumerate() {
        match decoded {
            Ok(c) => text.push(c),
            Err(_) => {
                return Err(DecodeError::InvalidSequence {
                    encoding: endian.name(),
                    offset: index * 2,
                });
            }
        }
    }
    Ok(text)
}

fn decode_latin1(bytes: &[u8]) -> Result<String, DecodeError> {
    if let Some(&byte) = bytes.iter().find(|b| (0x80..=0x9F).contains(*b)) {
        return Err(DecodeError::UndefinedByte {
            encoding: "latin-1",
            byte,
        });
    }
    Ok(bytes.iter().map(|&b| char::from(b)).collect())
}

fn decode_cp1252(bytes: &[u8]) -> Result<String, DecodeError> {
    bytes
        .iter()
        .map(|&byte| {
            cp1252_char(byte).ok_or(DecodeError::UndefinedByte {
                encoding: "cp1252",
                byte,
            })
        })
        .collect()
}

fn cp1252_char(byte: u8) -> Option<char> {
    let c = match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        0x81 | 0x8D | 0x8F | 0x90 | 0x9D => return None,
        other => char::from(other),
    };
    Some(c)
}
