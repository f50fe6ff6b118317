//! Nikon XTEKCT ini-style configuration.
//!
//! The file is four bracketed sections of `Key=Value` lines. Only the fields
//! the canonical model can express are kept in [`XtekCtConfig`]; the rest of
//! the schema is written with the fixed values in [`defaults`].

use log::{debug, warn};

use super::fields::{assign_field, field, FieldKind, FieldSpec};
use super::FormatCodec;
use crate::error::{CodecError, Result};
use crate::model::{
    BeamProperties, BeamSource, CaptureProperties, ConfigFull, ConfigSubset, DetectorProperties,
    ExportOptions, Filter, LabBeam, LineSpreadFunction, MaterialLibrary, ScanArc, Scintillator,
};

/// Literal every XTEKCT file starts with
pub const HEADER: &str = "[XTekCT]";

/// Values written for schema fields the canonical model does not carry.
pub mod defaults {
    /// Scan name when none was imported
    pub const NAME: &str = "xct_scan";
    /// Reconstruction volume size along each axis
    pub const VOXELS: u32 = 2000;
    pub const FILTER_TYPE: u32 = 0;
    pub const CUT_OFF_FREQUENCY: f64 = 2.0;
    pub const EXPONENT: f64 = 1.0;
    pub const NORMALISATION: f64 = 1.0;
    pub const INTERPOLATION_TYPE: u32 = 1;
    pub const SCALING: f64 = 1000.0;
    pub const OUTPUT_UNITS: u32 = 0;
    pub const WHITE_LEVEL: u32 = 60000;
    /// Beam hardening polynomial `CoefX4..CoefX0`, the identity
    pub const BEAM_HARDENING: [f64; 5] = [0.0, 0.0, 0.0, 1.0, 0.0];
    pub const LOWER_PERCENTILE: f64 = 0.01;
    pub const UPPER_PERCENTILE: f64 = 99.99;
    /// Written as the filter material when the beam is unfiltered
    pub const NO_FILTER: &str = "None";
    /// Filter material assumed when a file gives a thickness but no material
    pub const FILTER_MATERIAL: &str = "Cu";
    /// Projection count assumed when a file omits `Projections`
    pub const PROJECTIONS: u32 = 360;
}

/// Fields of an XTEKCT file that map onto the canonical model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XtekCtConfig {
    pub name: Option<String>,
    pub projections: Option<u32>,
    pub white_level: Option<u32>,
    pub detector_pixels_x: Option<u32>,
    pub detector_pixels_y: Option<u32>,
    /// Pixel pitch in mm
    pub detector_pixel_size_x: Option<f64>,
    pub detector_pixel_size_y: Option<f64>,
    pub detector_offset_x: Option<f64>,
    pub detector_offset_y: Option<f64>,
    /// Source to rotation centre in mm
    pub src_to_object: Option<f64>,
    /// Source to detector in mm
    pub src_to_detector: Option<f64>,
    pub voxel_size: Option<f64>,
    pub initial_angle: Option<f64>,
    /// Degrees between projections
    pub angular_step: Option<f64>,
    pub xray_kv: Option<f64>,
    pub xray_ua: Option<f64>,
    pub filter_thickness_mm: Option<f64>,
    pub filter_material: Option<String>,
}

const XTEKCT_FIELDS: &[FieldSpec<XtekCtConfig>] = &[
    field("Name", FieldKind::Text, |c, v| c.name = Some(v.into_text())),
    field("Projections", FieldKind::Integer, |c, v| c.projections = Some(v.as_u32())),
    field("WhiteLevel", FieldKind::Integer, |c, v| c.white_level = Some(v.as_u32())),
    field("DetectorPixelsX", FieldKind::Integer, |c, v| c.detector_pixels_x = Some(v.as_u32())),
    field("DetectorPixelsY", FieldKind::Integer, |c, v| c.detector_pixels_y = Some(v.as_u32())),
    field("DetectorPixelSizeX", FieldKind::Float, |c, v| {
        c.detector_pixel_size_x = Some(v.as_f64())
    }),
    field("DetectorPixelSizeY", FieldKind::Float, |c, v| {
        c.detector_pixel_size_y = Some(v.as_f64())
    }),
    field("DetectorOffsetX", FieldKind::Float, |c, v| c.detector_offset_x = Some(v.as_f64())),
    field("DetectorOffsetY", FieldKind::Float, |c, v| c.detector_offset_y = Some(v.as_f64())),
    field("SrcToObject", FieldKind::Float, |c, v| c.src_to_object = Some(v.as_f64())),
    field("SrcToDetector", FieldKind::Float, |c, v| c.src_to_detector = Some(v.as_f64())),
    field("VoxelSizeX", FieldKind::Float, |c, v| c.voxel_size = Some(v.as_f64())),
    field("InitialAngle", FieldKind::Float, |c, v| c.initial_angle = Some(v.as_f64())),
    field("AngularStep", FieldKind::Float, |c, v| c.angular_step = Some(v.as_f64())),
    field("XraykV", FieldKind::Float, |c, v| c.xray_kv = Some(v.as_f64())),
    field("XrayuA", FieldKind::Float, |c, v| c.xray_ua = Some(v.as_f64())),
    field("Filter_ThicknessMM", FieldKind::Float, |c, v| c.filter_thickness_mm = Some(v.as_f64())),
    field("Filter_Material", FieldKind::Text, |c, v| c.filter_material = Some(v.into_text())),
];

impl XtekCtConfig {
    fn beam(&self) -> Option<BeamProperties> {
        let (kv, ua) = (self.xray_kv?, self.xray_ua?);
        let filters = match self.filter_thickness_mm {
            Some(thickness) if thickness > 0.0 => {
                let material = self
                    .filter_material
                    .as_deref()
                    .filter(|m| !m.is_empty() && *m != defaults::NO_FILTER)
                    .unwrap_or(defaults::FILTER_MATERIAL);
                vec![Filter::new(material, thickness)]
            }
            _ => Vec::new(),
        };
        // XTEKCT carries no exposure time
        Some(BeamProperties::new(
            BeamSource::Lab(LabBeam::tungsten(kv, ua, 1.0)),
            filters,
        ))
    }

    fn detector(&self) -> Option<DetectorProperties> {
        let pixel_size = self.detector_pixel_size_x?;
        let (pixels_x, pixels_y) = (self.detector_pixels_x?, self.detector_pixels_y?);
        Some(DetectorProperties {
            pane_width: pixels_x as f64 * pixel_size,
            pane_height: pixels_y as f64 * pixel_size,
            pixel_size,
            binning: 1,
            scintillator: Scintillator::unknown(),
            lsf: LineSpreadFunction::flat(),
        })
    }

    fn capture(&self) -> Option<CaptureProperties> {
        let (sod, sdd) = (self.src_to_object?, self.src_to_detector?);
        let projections = self.projections.unwrap_or(defaults::PROJECTIONS);
        let arc = self
            .angular_step
            .map(|step| ScanArc::infer(step, projections))
            .unwrap_or(ScanArc::Full);
        Some(CaptureProperties::on_axis(sod, sdd - sod, projections, arc))
    }
}

impl FormatCodec for XtekCtConfig {
    const NAME: &'static str = "XTEKCT";

    fn from_canonical(
        config: &ConfigFull,
        _options: &ExportOptions,
        _library: &MaterialLibrary,
    ) -> Result<Self> {
        if config.beam.is_synchrotron() {
            return Err(CodecError::synchrotron_unsupported(Self::NAME));
        }

        let capture = &config.capture;
        let detector = &config.detector;
        let sod = capture.source_to_object();
        let sdd = capture.source_to_detector();
        if sdd <= 0.0 {
            return Err(CodecError::invalid(
                "capture.detectorPosition",
                "source to detector distance must be positive",
            ));
        }

        let filter = config.beam.primary_filter();
        Ok(Self {
            name: None,
            projections: Some(capture.num_projections),
            white_level: None,
            detector_pixels_x: Some(detector.pixels_x()),
            detector_pixels_y: Some(detector.pixels_y()),
            detector_pixel_size_x: Some(detector.pixel_size),
            detector_pixel_size_y: Some(detector.pixel_size),
            detector_offset_x: None,
            detector_offset_y: None,
            src_to_object: Some(sod),
            src_to_detector: Some(sdd),
            voxel_size: Some(sod / sdd * detector.pixel_size),
            initial_angle: Some(0.0),
            angular_step: Some(capture.angular_step()),
            xray_kv: config.beam.tube_voltage(),
            xray_ua: config.beam.tube_current_ua(),
            filter_thickness_mm: Some(filter.map_or(0.0, |f| f.thickness)),
            filter_material: Some(
                filter.map_or_else(|| defaults::NO_FILTER.to_string(), |f| f.material.clone()),
            ),
        })
    }

    fn from_text(raw: &str) -> Result<Self> {
        let mut config = Self::default();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('[') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    assign_field(XTEKCT_FIELDS, &mut config, key, value)?;
                }
                None => debug!("Skipping XTEKCT line without '=': {line}"),
            }
        }
        Ok(config)
    }

    fn to_text(&self) -> Result<String> {
        let voxel = num(self.voxel_size);
        let pixel_x = num(self.detector_pixel_size_x);
        let pixel_y = num(self.detector_pixel_size_y.or(self.detector_pixel_size_x));
        let [x4, x3, x2, x1, x0] = defaults::BEAM_HARDENING;

        let xtekct: Vec<(&str, String)> = vec![
            ("Name", self.name.clone().unwrap_or_else(|| defaults::NAME.to_string())),
            ("VoxelsX", defaults::VOXELS.to_string()),
            ("VoxelSizeX", voxel.clone()),
            ("VoxelsY", defaults::VOXELS.to_string()),
            ("VoxelSizeY", voxel.clone()),
            ("VoxelsZ", defaults::VOXELS.to_string()),
            ("VoxelSizeZ", voxel),
            ("OffsetX", "0".to_string()),
            ("OffsetY", "0".to_string()),
            ("OffsetZ", "0".to_string()),
            ("SrcToObject", num(self.src_to_object)),
            ("SrcToDetector", num(self.src_to_detector)),
            ("MaskRadius", "0".to_string()),
            ("DetectorPixelsX", count(self.detector_pixels_x)),
            ("DetectorPixelsY", count(self.detector_pixels_y)),
            ("DetectorPixelSizeX", pixel_x),
            ("DetectorPixelSizeY", pixel_y),
            ("DetectorOffsetX", num(self.detector_offset_x)),
            ("DetectorOffsetY", num(self.detector_offset_y)),
            ("Projections", count(self.projections.or(Some(defaults::PROJECTIONS)))),
            ("InitialAngle", num(self.initial_angle)),
            ("AngularStep", num(self.angular_step)),
            ("FilterType", defaults::FILTER_TYPE.to_string()),
            ("CutOffFrequency", defaults::CUT_OFF_FREQUENCY.to_string()),
            ("Exponent", defaults::EXPONENT.to_string()),
            ("Normalisation", defaults::NORMALISATION.to_string()),
            ("InterpolationType", defaults::INTERPOLATION_TYPE.to_string()),
            ("Scaling", defaults::SCALING.to_string()),
            ("OutputUnits", defaults::OUTPUT_UNITS.to_string()),
            ("WhiteLevel", self.white_level.unwrap_or(defaults::WHITE_LEVEL).to_string()),
            ("CoefX4", x4.to_string()),
            ("CoefX3", x3.to_string()),
            ("CoefX2", x2.to_string()),
            ("CoefX1", x1.to_string()),
            ("CoefX0", x0.to_string()),
        ];
        let xrays = vec![("XraykV", num(self.xray_kv)), ("XrayuA", num(self.xray_ua))];
        let ctpro = vec![
            ("Filter_ThicknessMM", num(self.filter_thickness_mm)),
            (
                "Filter_Material",
                self.filter_material
                    .clone()
                    .unwrap_or_else(|| defaults::NO_FILTER.to_string()),
            ),
            ("LowerPercentile", defaults::LOWER_PERCENTILE.to_string()),
            ("UpperPercentile", defaults::UPPER_PERCENTILE.to_string()),
        ];
        let dicom = vec![("DICOMTags", "0".to_string())];

        let mut lines = Vec::new();
        for (section, entries) in [
            (HEADER, xtekct),
            ("[Xrays]", xrays),
            ("[CTPro]", ctpro),
            ("[DICOM]", dicom),
        ] {
            lines.push(section.to_string());
            lines.extend(entries.into_iter().map(|(key, value)| format!("{key}={value}")));
        }
        lines.push(String::new());
        Ok(lines.join("\n"))
    }

    fn to_canonical_subset(&self) -> ConfigSubset {
        if self.xray_kv.is_some() && self.xray_ua.is_none() {
            warn!("XTEKCT file has XraykV but no XrayuA, beam not imported");
        }
        ConfigSubset {
            beam: self.beam(),
            detector: self.detector(),
            capture: self.capture(),
            ..Default::default()
        }
    }

    fn sniff(raw: &str) -> bool {
        raw.starts_with(HEADER)
    }
}

/// Render an optional float, zero when unset
fn num(value: Option<f64>) -> String {
    value.unwrap_or(0.0).to_string()
}

fn count(value: Option<u32>) -> String {
    value.unwrap_or(0).to_string()
}
