//! Reading and writing charts in the ACE format
//!
//! An ACE file is a JSON object wrapping the chart in an envelope that
//! carries the format version:
//!
//! ```json
//! {"_": "-*- js-indent-level: 1 -*-", "  version": "acmacs-ace-v1", "c": {...}}
//! ```
//!
//! The chart object uses single letter keys. Files are commonly xz or gzip
//! compressed, which is detected from the content rather than the file name.
//!
//! ```
//! use acechart::ace;
//!
//! let data = br#"{"  version": "acmacs-ace-v1", "c": {"a": [{"N": "A/X/1/2020"}]}}"#;
//! let chart = ace::read_chart(data)?;
//! assert_eq!(chart.number_of_antigens(), 1);
//! assert_eq!(chart.antigens[0].name, "A/X/1/2020");
//! # Ok::<(), acechart::Error>(())
//! ```

pub mod schemas;
mod source;
mod writer;

pub use self::source::Source;
pub use self::writer::{export_chart, write_chart, Compression, EncodeOptions};

use crate::importer::{Importer, DEFAULT_MAX_DEPTH};
use crate::{Chart, Error, ErrorKind};
use tracing::debug;

/// The only version of the format that is understood
pub const ACE_VERSION: &str = "acmacs-ace-v1";

/// Indentation hint written into the `_` field
pub const INDENTATION_HINT: &str = "-*- js-indent-level: 1 -*-";

/// The top level object of an ACE document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Editor hint, stored but not interpreted
    pub indentation: String,

    /// Set once a recognized version is seen
    pub version: Option<String>,
    pub chart: Chart,
}

/// Customizes how charts are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    max_depth: usize,
    decompress: bool,
    check: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            decompress: true,
            check: true,
        }
    }
}

impl DecodeOptions {
    /// Creates the structure with default options
    pub fn new() -> Self {
        DecodeOptions::default()
    }

    /// Sets how deeply the document may nest before decoding is aborted
    pub fn with_max_depth(mut self, max_depth: usize) -> DecodeOptions {
        self.max_depth = max_depth;
        self
    }

    /// Sets if xz or gzip compressed input is inflated before decoding
    pub fn with_decompression(mut self, decompress: bool) -> DecodeOptions {
        self.decompress = decompress;
        self
    }

    /// Sets if the decoded chart is checked for consistency
    pub fn with_consistency_check(mut self, check: bool) -> DecodeOptions {
        self.check = check;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

/// Decodes an ACE document held in memory with the default options
pub fn read_chart(data: &[u8]) -> Result<Chart, Error> {
    read_chart_with(data, &DecodeOptions::default())
}

/// Decodes an ACE document held in memory
pub fn read_chart_with(data: &[u8], options: &DecodeOptions) -> Result<Chart, Error> {
    let envelope = read_envelope_with(data, options)?;
    Ok(envelope.chart)
}

/// Decodes an ACE document along with its envelope fields
pub fn read_envelope_with(data: &[u8], options: &DecodeOptions) -> Result<Envelope, Error> {
    let data = if options.decompress {
        source::decompress(data)?
    } else {
        std::borrow::Cow::Borrowed(data)
    };

    source::ensure_object(&data)?;
    debug!(bytes = data.len(), "decoding chart");

    let envelope = Importer::new()
        .with_max_depth(options.max_depth)
        .import(&data, schemas::envelope())?;

    if envelope.version.is_none() {
        return Err(Error::new(ErrorKind::VersionMismatch { found: None }));
    }

    let chart = &envelope.chart;
    if options.check {
        chart.check()?;
    }

    debug!(
        antigens = chart.number_of_antigens(),
        sera = chart.number_of_sera(),
        projections = chart.number_of_projections(),
        "decoded chart"
    );

    Ok(envelope)
}

/// Decodes a chart from standard input (`-`), inline JSON or a file path
/// with the default options
pub fn import_chart(source: &str) -> Result<Chart, Error> {
    import_chart_with(source, &DecodeOptions::default())
}

/// Decodes a chart from standard input (`-`), inline JSON or a file path
pub fn import_chart_with(source: &str, options: &DecodeOptions) -> Result<Chart, Error> {
    let source = Source::parse(source);
    debug!(source = ?source, "importing chart");
    let data = source.read()?;
    read_chart_with(&data, options)
}
