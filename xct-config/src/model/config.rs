//! Canonical configuration in its partial ([`ConfigSubset`]) and complete
//! ([`ConfigFull`]) shapes, plus the bridge to the live scan state.
//!
//! A subset's sections are all optional and absence is meaningful: an absent
//! section is never rewritten when the subset is applied, and it is never
//! invented when the subset is re-exported.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    BeamProperties, CaptureProperties, DetectorProperties, MaterialLibrary, MaterialSource,
    ReconstructionParams, SampleProperties,
};
use crate::error::{CodecError, Result};

/// Which sections of a configuration are present (or requested).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigKeys {
    pub beam: bool,
    pub detector: bool,
    pub samples: bool,
    pub capture: bool,
    pub recon: bool,
}

impl ConfigKeys {
    /// Every section
    pub const ALL: ConfigKeys = ConfigKeys {
        beam: true,
        detector: true,
        samples: true,
        capture: true,
        recon: true,
    };

    /// No section
    pub const NONE: ConfigKeys = ConfigKeys {
        beam: false,
        detector: false,
        samples: false,
        capture: false,
        recon: false,
    };
}

/// Options controlling how a configuration is exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Keep library references as `materialID` instead of inlining materials
    pub materials_as_id: bool,
    /// Output folder for simulated projections
    pub projection_folder: String,
    /// Output folder for reconstructed volumes
    pub reconstruction_folder: String,
    /// Include the scan plan / simulation stage
    pub include_scan: bool,
    /// Include the reconstruction stage
    pub include_reconstruction: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            materials_as_id: false,
            projection_folder: "projections".to_string(),
            reconstruction_folder: "reconstruction".to_string(),
            include_scan: true,
            include_reconstruction: false,
        }
    }
}

/// Partial configuration; the wire shape exchanged with the rest of the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSubset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beam: Option<BeamProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detector: Option<DetectorProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<SampleProperties>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<CaptureProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recon: Option<ReconstructionParams>,
}

impl ConfigSubset {
    /// Presence map of the populated sections
    pub fn keys(&self) -> ConfigKeys {
        ConfigKeys {
            beam: self.beam.is_some(),
            detector: self.detector.is_some(),
            samples: self.samples.is_some(),
            capture: self.capture.is_some(),
            recon: self.recon.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys() == ConfigKeys::NONE
    }

    /// Serialize to the canonical JSON text (four space indent)
    pub fn to_json_string(&self) -> Result<String> {
        to_pretty_json(self)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Pretty JSON with the four space indent used by every exported file.
pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(out).map_err(|e| CodecError::invalid("json", e.to_string()))
}

/// Complete configuration required at the translation boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFull {
    pub beam: BeamProperties,
    pub detector: DetectorProperties,
    pub samples: Vec<SampleProperties>,
    pub capture: CaptureProperties,
    pub recon: ReconstructionParams,
}

impl ConfigFull {
    /// Check every section against the model's invariants
    pub fn validate(&self) -> Result<()> {
        self.beam.validate()?;
        self.detector.validate()?;
        self.capture.validate()?;
        self.recon.validate()
    }
}

impl TryFrom<ConfigSubset> for ConfigFull {
    type Error = CodecError;

    fn try_from(subset: ConfigSubset) -> Result<Self> {
        Ok(Self {
            beam: subset.beam.ok_or(CodecError::MissingSection("beam"))?,
            detector: subset.detector.ok_or(CodecError::MissingSection("detector"))?,
            samples: subset.samples.ok_or(CodecError::MissingSection("samples"))?,
            capture: subset.capture.ok_or(CodecError::MissingSection("capture"))?,
            recon: subset.recon.ok_or(CodecError::MissingSection("recon"))?,
        })
    }
}

impl From<ConfigFull> for ConfigSubset {
    fn from(full: ConfigFull) -> Self {
        Self {
            beam: Some(full.beam),
            detector: Some(full.detector),
            samples: Some(full.samples),
            capture: Some(full.capture),
            recon: Some(full.recon),
        }
    }
}

/// Live scan state owned by the surrounding application.
///
/// The codec layer only reads it in [`collect`] and writes it in [`apply`].
pub trait ScanState {
    fn beam(&self) -> BeamProperties;
    fn detector(&self) -> DetectorProperties;
    fn samples(&self) -> Vec<SampleProperties>;
    fn capture(&self) -> CaptureProperties;
    fn recon(&self) -> ReconstructionParams;

    fn set_beam(&mut self, beam: BeamProperties);
    fn set_detector(&mut self, detector: DetectorProperties);
    fn set_samples(&mut self, samples: Vec<SampleProperties>);
    fn set_capture(&mut self, capture: CaptureProperties);
    fn set_recon(&mut self, recon: ReconstructionParams);
}

impl ScanState for ConfigFull {
    fn beam(&self) -> BeamProperties {
        self.beam.clone()
    }

    fn detector(&self) -> DetectorProperties {
        self.detector.clone()
    }

    fn samples(&self) -> Vec<SampleProperties> {
        self.samples.clone()
    }

    fn capture(&self) -> CaptureProperties {
        self.capture.clone()
    }

    fn recon(&self) -> ReconstructionParams {
        self.recon.clone()
    }

    fn set_beam(&mut self, beam: BeamProperties) {
        self.beam = beam;
    }

    fn set_detector(&mut self, detector: DetectorProperties) {
        self.detector = detector;
    }

    fn set_samples(&mut self, samples: Vec<SampleProperties>) {
        self.samples = samples;
    }

    fn set_capture(&mut self, capture: CaptureProperties) {
        self.capture = capture;
    }

    fn set_recon(&mut self, recon: ReconstructionParams) {
        self.recon = recon;
    }
}

/// Read the requested sections from the live state.
///
/// Unless `options.materials_as_id` is set, library references are resolved
/// into inline materials so the result no longer depends on the library.
pub fn collect<S: ScanState + ?Sized>(
    state: &S,
    keys: ConfigKeys,
    options: &ExportOptions,
    library: &MaterialLibrary,
) -> Result<ConfigSubset> {
    let samples = if keys.samples {
        let mut samples = state.samples();
        if !options.materials_as_id {
            inline_materials(&mut samples, library)?;
        }
        Some(samples)
    } else {
        None
    };

    Ok(ConfigSubset {
        beam: keys.beam.then(|| state.beam()),
        detector: keys.detector.then(|| state.detector()),
        samples,
        capture: keys.capture.then(|| state.capture()),
        recon: keys.recon.then(|| state.recon()),
    })
}

/// Replace library references with the materials they name.
pub fn inline_materials(samples: &mut [SampleProperties], library: &MaterialLibrary) -> Result<()> {
    for sample in samples {
        if let MaterialSource::Library(id) = &sample.material {
            debug!("Inlining material {id} for sample {}", sample.label);
            sample.material = MaterialSource::Inline(library.resolve(id)?.clone());
        }
    }
    Ok(())
}

/// Write the present sections of `subset` into the live state.
///
/// Returns the presence map of what was written.
pub fn apply<S: ScanState + ?Sized>(state: &mut S, subset: &ConfigSubset) -> ConfigKeys {
    if let Some(beam) = &subset.beam {
        state.set_beam(beam.clone());
    }
    if let Some(detector) = &subset.detector {
        state.set_detector(detector.clone());
    }
    if let Some(samples) = &subset.samples {
        state.set_samples(samples.clone());
    }
    if let Some(capture) = &subset.capture {
        state.set_capture(capture.clone());
    }
    if let Some(recon) = &subset.recon {
        state.set_recon(recon.clone());
    }
    subset.keys()
}
