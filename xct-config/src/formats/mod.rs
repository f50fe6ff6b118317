//! Vendor configuration formats.
//!
//! Every format goes through a codec-private struct: export builds it from a
//! complete canonical configuration and renders it as text, import parses the
//! text into it and translates it back into a canonical subset.

pub mod canonical;
pub mod fields;
pub mod gvxr;
pub mod scandocu;
pub mod xtekct;

use std::fmt;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::{ConfigFull, ConfigSubset, ExportOptions, MaterialLibrary};

pub use canonical::CanonicalJson;
pub use gvxr::{spectral_lines, GvxrConfig};
pub use scandocu::{downsample_binning, ScanDocuConfig};
pub use xtekct::XtekCtConfig;

/// Non-fatal signal raised while translating an imported file.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportWarning {
    /// The detector was binned down to keep the simulation tractable
    DetectorBinned { vertical_pixels: u32, binning: u32 },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportWarning::DetectorBinned {
                vertical_pixels,
                binning,
            } => write!(
                f,
                "Detector has {vertical_pixels} vertical pixels, binning by {binning}"
            ),
        }
    }
}

/// Text under format detection.
///
/// JSON based formats need the parsed object to recognise a file, so it is
/// parsed once here and shared by every candidate.
#[derive(Debug)]
pub struct SniffInput<'a> {
    raw: &'a str,
    json: Option<Map<String, Value>>,
}

impl<'a> SniffInput<'a> {
    pub fn new(raw: &'a str) -> Self {
        let json = if raw.trim_start().starts_with('{') {
            serde_json::from_str(raw).ok()
        } else {
            None
        };
        Self { raw, json }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Top level object, when the text is a JSON object
    pub fn json_object(&self) -> Option<&Map<String, Value>> {
        self.json.as_ref()
    }
}

/// Capabilities shared by every vendor format.
pub trait FormatCodec: Sized {
    /// Short format name used in errors and logs
    const NAME: &'static str;

    /// Build the vendor struct from a complete canonical configuration.
    fn from_canonical(
        config: &ConfigFull,
        options: &ExportOptions,
        library: &MaterialLibrary,
    ) -> Result<Self>;

    /// Parse native text. Unknown keys are ignored and absent keys stay unset.
    fn from_text(raw: &str) -> Result<Self>;

    /// Render native text
    fn to_text(&self) -> Result<String>;

    /// Translate into the canonical model, leaving out sections the file does not describe.
    fn to_canonical_subset(&self) -> ConfigSubset;

    /// Cheap syntactic check for whether `raw` looks like this format.
    fn sniff(raw: &str) -> bool;

    /// Non-fatal signals raised by [`FormatCodec::to_canonical_subset`]
    fn import_warnings(&self) -> Vec<ImportWarning> {
        Vec::new()
    }
}

/// Export a complete configuration straight to a format's text.
pub fn render<C: FormatCodec>(
    config: &ConfigFull,
    options: &ExportOptions,
    library: &MaterialLibrary,
) -> Result<String> {
    C::from_canonical(config, options, library)?.to_text()
}

/// Parse a format's text into a canonical subset plus warnings.
pub fn ingest<C: FormatCodec>(raw: &str) -> Result<(ConfigSubset, Vec<ImportWarning>)> {
    let parsed = C::from_text(raw)?;
    let subset = parsed.to_canonical_subset();
    Ok((subset, parsed.import_warnings()))
}
