//! Format detection and import dispatch.
//!
//! Candidates are tried in a fixed order and the first one whose sniff accepts
//! the text wins. The order runs from the most specific check to the least:
//! XTEKCT has a literal header at offset zero, ScanDocu a literal on its second
//! line, GVXR a set of required JSON keys, and canonical JSON is the fallback
//! for any object made only of canonical sections.

use log::info;
use strum::{Display, EnumIter, EnumString};

use crate::error::{CodecError, Result};
use crate::formats::{
    ingest, CanonicalJson, FormatCodec, GvxrConfig, ImportWarning, ScanDocuConfig, SniffInput,
    XtekCtConfig,
};
use crate::model::ConfigSubset;

/// Every format the registry can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FormatKind {
    Xtekct,
    #[strum(serialize = "scandocu")]
    ScanDocu,
    Gvxr,
    Canonical,
}

/// Detection order
pub const CANDIDATES: [FormatKind; 4] = [
    FormatKind::Xtekct,
    FormatKind::ScanDocu,
    FormatKind::Gvxr,
    FormatKind::Canonical,
];

/// Result of importing a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedConfig {
    pub format: FormatKind,
    pub subset: ConfigSubset,
    pub warnings: Vec<ImportWarning>,
}

impl FormatKind {
    /// Display name of the codec
    pub fn codec_name(self) -> &'static str {
        match self {
            FormatKind::Xtekct => XtekCtConfig::NAME,
            FormatKind::ScanDocu => ScanDocuConfig::NAME,
            FormatKind::Gvxr => GvxrConfig::NAME,
            FormatKind::Canonical => CanonicalJson::NAME,
        }
    }

    pub fn sniff(self, raw: &str) -> bool {
        self.matches(&SniffInput::new(raw))
    }

    /// Sniff against text whose JSON form, if any, is already parsed.
    pub fn matches(self, input: &SniffInput<'_>) -> bool {
        match self {
            FormatKind::Xtekct => XtekCtConfig::sniff(input.raw()),
            FormatKind::ScanDocu => ScanDocuConfig::sniff(input.raw()),
            FormatKind::Gvxr => input.json_object().is_some_and(GvxrConfig::sniff_object),
            FormatKind::Canonical => input.json_object().is_some_and(CanonicalJson::sniff_object),
        }
    }

    /// Parse `raw` as this format and translate it to a canonical subset.
    pub fn import(self, raw: &str) -> Result<ImportedConfig> {
        let (subset, warnings) = match self {
            FormatKind::Xtekct => ingest::<XtekCtConfig>(raw)?,
            FormatKind::ScanDocu => ingest::<ScanDocuConfig>(raw)?,
            FormatKind::Gvxr => ingest::<GvxrConfig>(raw)?,
            FormatKind::Canonical => ingest::<CanonicalJson>(raw)?,
        };
        Ok(ImportedConfig {
            format: self,
            subset,
            warnings,
        })
    }
}

/// Return the first candidate that recognises `raw`.
pub fn detect(raw: &str) -> Result<FormatKind> {
    let input = SniffInput::new(raw);
    let kind = CANDIDATES
        .into_iter()
        .find(|kind| kind.matches(&input))
        .ok_or(CodecError::UnrecognizedFormat)?;
    info!("Detected {} configuration", kind.codec_name());
    Ok(kind)
}

/// Detect, parse and translate `raw` in one step.
pub fn import(raw: &str) -> Result<ImportedConfig> {
    detect(raw)?.import(raw)
}
