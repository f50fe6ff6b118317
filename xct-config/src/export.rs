//! Single entry point for every download the application offers.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Result;
use crate::formats::{render, CanonicalJson, FormatCodec, GvxrConfig, ScanDocuConfig, XtekCtConfig};
use crate::model::{
    collect, inline_materials, ConfigFull, ConfigKeys, ConfigSubset, ExportOptions,
    MaterialLibrary, ReconstructionParams, ScanState,
};
use crate::script::{generate_script, ModelAssets};

/// Download targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// The application's own configuration
    Json,
    Gvxr,
    /// Nikon XTEKCT
    Xtek,
    /// Standalone Python simulation script
    Python,
    /// Diondo ScanDocu XML
    Diondo,
}

impl ExportFormat {
    /// File name offered for the download
    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "Config-WebCT.json",
            ExportFormat::Gvxr => "Config-GVXR.json",
            ExportFormat::Xtek => "Config-XTEK.xtek",
            ExportFormat::Python => "simulate.py",
            ExportFormat::Diondo => "Config-Diondo.xml",
        }
    }

    /// Vendor formats can only be built from a complete configuration, so they
    /// ignore the caller's section selection.
    pub fn requires_full_config(self) -> bool {
        !matches!(self, ExportFormat::Json)
    }

    /// Whether the rendered output carries the sample list
    pub fn reads_samples(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::Gvxr | ExportFormat::Python)
    }

    /// Whether the rendered output carries reconstruction settings
    pub fn reads_recon(self, options: &ExportOptions) -> bool {
        match self {
            ExportFormat::Json => true,
            ExportFormat::Python => options.include_reconstruction,
            ExportFormat::Gvxr | ExportFormat::Xtek | ExportFormat::Diondo => false,
        }
    }
}

/// Turn an imported subset into a complete configuration for `format`.
///
/// Samples and reconstruction settings are filled in only when `format`
/// never reads them. Any other absent section is a `MissingSection` error.
pub fn complete_for(
    format: ExportFormat,
    mut subset: ConfigSubset,
    options: &ExportOptions,
) -> Result<ConfigFull> {
    if subset.samples.is_none() && !format.reads_samples() {
        debug!("{format} output has no samples, leaving the list empty");
        subset.samples = Some(Vec::new());
    }
    if subset.recon.is_none() && !format.reads_recon(options) {
        debug!("{format} output has no reconstruction, using the default");
        subset.recon = Some(ReconstructionParams::default());
    }
    ConfigFull::try_from(subset)
}

/// Re-export an imported subset as `format`.
///
/// The canonical JSON keeps exactly the imported sections, with library
/// materials inlined unless `options.materials_as_id` is set. Other formats
/// go through [`complete_for`] and [`render_full`].
pub fn convert(
    format: ExportFormat,
    mut subset: ConfigSubset,
    options: &ExportOptions,
    library: &MaterialLibrary,
    assets: &dyn ModelAssets,
) -> Result<String> {
    info!("Converting to {format}");
    if format.requires_full_config() {
        let config = complete_for(format, subset, options)?;
        return render_full(format, &config, options, library, assets);
    }

    if !options.materials_as_id {
        if let Some(samples) = subset.samples.as_mut() {
            inline_materials(samples, library)?;
        }
    }
    CanonicalJson::from(subset).to_text()
}

fn full_state<S: ScanState + ?Sized>(state: &S) -> ConfigFull {
    ConfigFull {
        beam: state.beam(),
        detector: state.detector(),
        samples: state.samples(),
        capture: state.capture(),
        recon: state.recon(),
    }
}

/// Render a complete configuration as `format`.
pub fn render_full(
    format: ExportFormat,
    config: &ConfigFull,
    options: &ExportOptions,
    library: &MaterialLibrary,
    assets: &dyn ModelAssets,
) -> Result<String> {
    config.validate()?;
    match format {
        ExportFormat::Json => render::<CanonicalJson>(config, options, library),
        ExportFormat::Gvxr => render::<GvxrConfig>(config, options, library),
        ExportFormat::Xtek => render::<XtekCtConfig>(config, options, library),
        ExportFormat::Diondo => render::<ScanDocuConfig>(config, options, library),
        ExportFormat::Python => generate_script(config, options, library, assets),
    }
}

/// Export the live state as `format`.
///
/// `keys` selects sections for the canonical JSON export only. `assets` is
/// consulted when generating the Python script.
pub fn export<S: ScanState + ?Sized>(
    format: ExportFormat,
    state: &S,
    keys: ConfigKeys,
    options: &ExportOptions,
    library: &MaterialLibrary,
    assets: &dyn ModelAssets,
) -> Result<String> {
    info!("Exporting {format} ({})", format.default_file_name());

    if format.requires_full_config() {
        render_full(format, &full_state(state), options, library, assets)
    } else {
        let subset = collect(state, keys, options, library)?;
        CanonicalJson::from(subset).to_text()
    }
}
