//! gVirtualXray JSON configuration.
//!
//! Export only: the JSON drives the simulation runtime, so positions are
//! written in millimeters with an explicit unit and sample materials are
//! always inlined. Importing GVXR files is not supported; [`GvxrConfig::from_text`]
//! yields an empty configuration that translates to an empty subset.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::{FormatCodec, SniffInput};
use crate::error::{CodecError, Result};
use crate::model::config::to_pretty_json;
use crate::model::{
    BeamSource, ConfigFull, ConfigSubset, ExportOptions, MaterialComposition, MaterialLibrary,
    SynchrotronBeam, Vec3,
};

/// Fraction of the synchrotron flux in the fundamental and the 2nd/3rd harmonics
pub const HARMONIC_FRACTIONS: [f64; 3] = [0.96, 0.03, 0.01];

/// Detector "up" direction in scanner coordinates
pub const DETECTOR_UP: [f64; 3] = [0.0, 0.0, -1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum DistanceUnit {
    #[serde(rename = "m")]
    #[strum(serialize = "m")]
    Meter,
    #[serde(rename = "cm")]
    #[strum(serialize = "cm")]
    Centimeter,
    #[default]
    #[serde(rename = "mm")]
    #[strum(serialize = "mm")]
    Millimeter,
    #[serde(rename = "um")]
    #[strum(serialize = "um")]
    Micrometer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "eV")]
    ElectronVolt,
    #[default]
    #[serde(rename = "keV")]
    KiloElectronVolt,
    #[serde(rename = "MeV")]
    MegaElectronVolt,
}

/// `[x, y, z, unit]`
pub type Position = (f64, f64, f64, DistanceUnit);

fn position(v: Vec3) -> Position {
    (v[0], v[1], v[2], DistanceUnit::Millimeter)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GvxrScintillator {
    pub material: String,
    pub thickness: f64,
    pub unit: DistanceUnit,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GvxrDetector {
    pub position: Position,
    pub up_vector: [f64; 3],
    /// Binned pixel counts `[x, y]`
    pub number_of_pixels: [u32; 2],
    /// Binned pixel pitch `[x, y, unit]`
    pub spacing: (f64, f64, DistanceUnit),
    #[serde(rename = "LSF")]
    pub lsf: Vec<f64>,
    pub scintillator: GvxrScintillator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeamShape {
    /// Cone beam from a tube focal spot
    #[default]
    PointSource,
    #[serde(alias = "ParallelBeam")]
    Parallel,
}

/// One discrete line of a spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpectralLine {
    pub energy: f64,
    pub unit: EnergyUnit,
    /// Photon count
    pub count: f64,
}

/// Tube spectrum, generated by the runtime from the peak voltage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubeSpectrum {
    pub kvp: f64,
    #[serde(rename = "tube angle")]
    pub tube_angle: f64,
    /// `[symbol, thickness_mm]` pairs in beam order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GvxrBeam {
    Lines(Vec<SpectralLine>),
    Tube(TubeSpectrum),
}

impl Default for GvxrBeam {
    fn default() -> Self {
        GvxrBeam::Lines(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GvxrSource {
    pub position: Position,
    pub shape: BeamShape,
    pub beam: GvxrBeam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GvxrSample {
    pub label: String,
    pub path: String,
    pub material: MaterialComposition,
    /// g/cm³
    pub density: f64,
    pub unit: DistanceUnit,
}

/// Scan plan consumed by the runtime's CT acquisition helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GvxrScan {
    pub number_of_projections: u32,
    pub final_angle: f64,
    pub include_final_angle: bool,
    pub center_of_rotation: Position,
    pub out_folder: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GvxrConfig {
    pub detector: GvxrDetector,
    pub source: GvxrSource,
    pub samples: Vec<GvxrSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<GvxrScan>,
}

/// Discrete approximation of a synchrotron spectrum.
///
/// The total photon count is `exposure × intensity`. With harmonics enabled it
/// is split over the fundamental and the 2nd and 3rd harmonics.
pub fn spectral_lines(beam: &SynchrotronBeam) -> Vec<SpectralLine> {
    let total = beam.exposure * beam.intensity;
    let line = |order: f64, fraction: f64| SpectralLine {
        energy: beam.energy * order,
        unit: EnergyUnit::KiloElectronVolt,
        count: total * fraction,
    };

    if beam.harmonics {
        HARMONIC_FRACTIONS
            .iter()
            .enumerate()
            .map(|(i, fraction)| line((i + 1) as f64, *fraction))
            .collect()
    } else {
        vec![line(1.0, 1.0)]
    }
}

fn source_beam(config: &ConfigFull) -> (BeamShape, GvxrBeam) {
    let filters = config
        .beam
        .filters
        .iter()
        .map(|f| (f.material.clone(), f.thickness))
        .collect();

    match &config.beam.source {
        BeamSource::Synchrotron(synch) => (
            BeamShape::Parallel,
            GvxrBeam::Lines(spectral_lines(synch)),
        ),
        BeamSource::Lab(lab) => (
            BeamShape::PointSource,
            GvxrBeam::Tube(TubeSpectrum {
                kvp: lab.voltage,
                tube_angle: lab.anode_angle,
                filter: filters,
            }),
        ),
        BeamSource::Medical(med) => (
            BeamShape::PointSource,
            GvxrBeam::Tube(TubeSpectrum {
                kvp: med.voltage,
                tube_angle: med.anode_angle,
                filter: filters,
            }),
        ),
    }
}

impl FormatCodec for GvxrConfig {
    const NAME: &'static str = "GVXR";

    fn from_canonical(
        config: &ConfigFull,
        options: &ExportOptions,
        library: &MaterialLibrary,
    ) -> Result<Self> {
        let det = &config.detector;
        let binning = det.binning.max(1);
        let lsf = det
            .lsf
            .normalized()
            .map(|lsf| lsf.values)
            .unwrap_or_else(|_| det.lsf.values.clone());

        let detector = GvxrDetector {
            position: position(config.capture.detector_position),
            up_vector: DETECTOR_UP,
            number_of_pixels: [det.pixels_x() / binning, det.pixels_y() / binning],
            spacing: (
                det.pixel_size * binning as f64,
                det.pixel_size * binning as f64,
                DistanceUnit::Millimeter,
            ),
            lsf,
            scintillator: GvxrScintillator {
                material: det.scintillator.material.clone(),
                thickness: det.scintillator.thickness,
                unit: DistanceUnit::Millimeter,
            },
        };

        let (shape, beam) = source_beam(config);
        let source = GvxrSource {
            position: position(config.capture.beam_position),
            shape,
            beam,
        };

        let mut samples = Vec::with_capacity(config.samples.len());
        for sample in &config.samples {
            let material = sample.resolve_material(library)?;
            if material.material.is_placeholder() {
                warn!(
                    "Dropping sample '{}': '{}' has no simulated material",
                    sample.label, material.label
                );
                continue;
            }
            let unit = sample.size_unit.parse::<DistanceUnit>().map_err(|_| {
                CodecError::invalid(
                    "samples.sizeUnit",
                    format!("unknown unit '{}'", sample.size_unit),
                )
            })?;
            samples.push(GvxrSample {
                label: sample.label.clone(),
                path: sample.model_path.clone(),
                material: material.material,
                density: material.density,
                unit,
            });
        }

        let scan = options.include_scan.then(|| GvxrScan {
            number_of_projections: config.capture.num_projections,
            final_angle: config.capture.total_angle.degrees(),
            include_final_angle: false,
            center_of_rotation: (0.0, 0.0, 0.0, DistanceUnit::Millimeter),
            out_folder: options.projection_folder.clone(),
        });

        Ok(Self {
            detector,
            source,
            samples,
            scan,
        })
    }

    fn from_text(raw: &str) -> Result<Self> {
        warn!("GVXR import is not supported, ignoring {} bytes", raw.len());
        Ok(Self::default())
    }

    fn to_text(&self) -> Result<String> {
        to_pretty_json(self)
    }

    fn to_canonical_subset(&self) -> ConfigSubset {
        ConfigSubset::default()
    }

    fn sniff(raw: &str) -> bool {
        SniffInput::new(raw)
            .json_object()
            .is_some_and(Self::sniff_object)
    }
}

impl GvxrConfig {
    /// Structural check on an already parsed top level object.
    pub fn sniff_object(obj: &Map<String, Value>) -> bool {
        let found = obj.contains_key("Samples")
            && obj.get("Source").and_then(|s| s.get("Shape")).is_some()
            && obj.get("Detector").and_then(|d| d.get("Position")).is_some();
        debug!("GVXR structural check: {found}");
        found
    }
}
