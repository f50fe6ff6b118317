//! X-ray CT scan configuration and vendor format codecs.
//!
//! A scan is described once in the canonical model ([`model`]) and translated
//! to and from the formats other CT toolchains read:
//!
//! - gVirtualXray JSON (export only), see [`formats::gvxr`]
//! - Nikon XTEKCT, see [`formats::xtekct`]
//! - ScanDocu XML, see [`formats::scandocu`]
//! - the canonical JSON itself, see [`formats::canonical`]
//!
//! [`registry`] detects which format a file is in, [`export`] renders the
//! live scan state for download, and [`script`] wraps the GVXR export in a
//! standalone Python simulation script.

pub mod error;
pub mod export;
pub mod formats;
pub mod model;
pub mod registry;
pub mod script;
pub mod settings;

pub use error::{CodecError, Result};
pub use export::{complete_for, convert, export, render_full, ExportFormat};
pub use formats::{FormatCodec, ImportWarning};
pub use model::{ConfigFull, ConfigKeys, ConfigSubset, ExportOptions, MaterialLibrary, ScanState};
pub use registry::{detect, import, FormatKind, ImportedConfig};
pub use script::{generate_script, ModelAssets, ModelDirectory};
pub use settings::{ConverterSettings, SettingsStore};
