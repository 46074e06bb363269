use crate::json::is_whitespace;
use crate::{Error, ErrorKind};
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Where a chart is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
    /// Standard input
    Stdin,

    /// JSON given in place of a file name
    Inline(&'a str),

    /// A file on disk
    File(&'a Path),
}

impl<'a> Source<'a> {
    /// `-` denotes standard input, text starting with `{` is the document
    /// itself, anything else is a path
    pub fn parse(source: &'a str) -> Source<'a> {
        if source == "-" {
            Source::Stdin
        } else if first_significant_byte(source.as_bytes()) == Some(b'{') {
            Source::Inline(source)
        } else {
            Source::File(Path::new(source))
        }
    }

    /// Reads the whole source into memory
    pub fn read(&self) -> Result<Cow<'a, [u8]>, Error> {
        match *self {
            Source::Stdin => {
                let mut data = Vec::new();
                std::io::stdin().lock().read_to_end(&mut data)?;
                Ok(Cow::Owned(data))
            }
            Source::Inline(x) => Ok(Cow::Borrowed(x.as_bytes())),
            Source::File(path) => Ok(Cow::Owned(std::fs::read(path)?)),
        }
    }
}

pub(crate) fn first_significant_byte(data: &[u8]) -> Option<u8> {
    data.iter().copied().find(|&x| !is_whitespace(x))
}

/// Compression recognized from the leading bytes of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Codec {
    Gzip,
    Xz,
}

pub(crate) fn sniff_codec(data: &[u8]) -> Option<Codec> {
    if data.starts_with(&GZIP_MAGIC) {
        Some(Codec::Gzip)
    } else if data.starts_with(&XZ_MAGIC) {
        Some(Codec::Xz)
    } else {
        None
    }
}

/// Inflates xz and gzip data. Other data, and codecs whose feature is
/// disabled, are returned as is.
pub(crate) fn decompress(data: &[u8]) -> Result<Cow<'_, [u8]>, Error> {
    match sniff_codec(data) {
        #[cfg(feature = "gzip")]
        Some(Codec::Gzip) => inflate(flate2::read::MultiGzDecoder::new(data), data.len()),
        #[cfg(feature = "xz")]
        Some(Codec::Xz) => inflate(xz2::read::XzDecoder::new_multi_decoder(data), data.len()),
        _ => Ok(Cow::Borrowed(data)),
    }
}

#[cfg(any(feature = "gzip", feature = "xz"))]
fn inflate<'a, R: Read>(mut reader: R, len: usize) -> Result<Cow<'a, [u8]>, Error> {
    let mut out = Vec::with_capacity(len * 8);
    reader.read_to_end(&mut out)?;
    Ok(Cow::Owned(out))
}

/// Charts are JSON objects, anything else is not worth tokenizing
pub(crate) fn ensure_object(data: &[u8]) -> Result<(), Error> {
    match first_significant_byte(data) {
        Some(b'{') => Ok(()),
        _ => Err(Error::new(ErrorKind::UnrecognizedFormat)),
    }
}
