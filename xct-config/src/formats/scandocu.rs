//! ScanDocu tag-per-line XML configuration.
//!
//! Only the flat `<Key>Value</Key>` lines are interpreted; group tags and the
//! XML declaration are skipped. Keys fall into three groups that mirror the
//! file's own `<Geometrie>`, `<Recon>` and `<ScanParameter>` blocks.

use log::{debug, warn};

use super::fields::{assign_field, field, FieldKind, FieldSpec};
use super::{FormatCodec, ImportWarning};
use crate::error::{CodecError, Result};
use crate::model::{
    BeamProperties, BeamSource, CaptureProperties, ConfigFull, ConfigSubset, DetectorProperties,
    ExportOptions, LabBeam, LineSpreadFunction, MaterialLibrary, ScanArc, Scintillator,
};

/// Prefix of the document's root element, expected on the second line
pub const ROOT_PREFIX: &str = "<ScanDocuPara";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const ROOT: &str = "ScanDocuParameter";
const RECONSTRUCTION_MODE: &str = "NormalCt-VerticalFov";

/// Vertical pixel count above which imports are binned down
pub const BINNING_THRESHOLD: u32 = 2000;

/// Source / object / detector geometry, distances in mm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub source_detector_dist: Option<f64>,
    pub source_object_dist: Option<f64>,
    pub object_detector_dist: Option<f64>,
    pub magnification: Option<f64>,
}

/// Reconstruction block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recon {
    pub reconstruction_mode: Option<String>,
    pub projection_count: Option<u32>,
    /// Projections a full rotation would take at the same angular step
    pub projection_count_per_360deg: Option<u32>,
    pub projection_dim_x: Option<u32>,
    pub projection_dim_y: Option<u32>,
    pub projection_pixel_size_x: Option<f64>,
    pub projection_pixel_size_y: Option<f64>,
}

/// Tube and detector acquisition settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanParameter {
    /// kV
    pub voltage: Option<f64>,
    /// µA
    pub current: Option<f64>,
    /// W
    pub power: Option<f64>,
    pub pixel_binning: Option<u32>,
    pub detector_pixel_x: Option<u32>,
    pub detector_pixel_y: Option<u32>,
    /// Per-frame integration time in ms
    pub integration_time: Option<f64>,
    /// Frames averaged per projection
    pub frame_binning: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanDocuConfig {
    pub geometry: Geometry,
    pub recon: Recon,
    pub scan: ScanParameter,
}

const SCANDOCU_FIELDS: &[FieldSpec<ScanDocuConfig>] = &[
    field("SourceDetectorDist", FieldKind::Float, |c, v| {
        c.geometry.source_detector_dist = Some(v.as_f64())
    }),
    field("SourceObjectDist", FieldKind::Float, |c, v| {
        c.geometry.source_object_dist = Some(v.as_f64())
    }),
    field("ObjectDetectorDist", FieldKind::Float, |c, v| {
        c.geometry.object_detector_dist = Some(v.as_f64())
    }),
    field("Magnification", FieldKind::Float, |c, v| c.geometry.magnification = Some(v.as_f64())),
    field("ReconstructionMode", FieldKind::Text, |c, v| {
        c.recon.reconstruction_mode = Some(v.into_text())
    }),
    field("ProjectionCount", FieldKind::Integer, |c, v| {
        c.recon.projection_count = Some(v.as_u32())
    }),
    field("ProjectionCountPer360deg", FieldKind::Integer, |c, v| {
        c.recon.projection_count_per_360deg = Some(v.as_u32())
    }),
    field("ProjectionDimX", FieldKind::Integer, |c, v| c.recon.projection_dim_x = Some(v.as_u32())),
    field("ProjectionDimY", FieldKind::Integer, |c, v| c.recon.projection_dim_y = Some(v.as_u32())),
    field("ProjectionPixelSizeX", FieldKind::Float, |c, v| {
        c.recon.projection_pixel_size_x = Some(v.as_f64())
    }),
    field("ProjectionPixelSizeY", FieldKind::Float, |c, v| {
        c.recon.projection_pixel_size_y = Some(v.as_f64())
    }),
    field("Voltage", FieldKind::Float, |c, v| c.scan.voltage = Some(v.as_f64())),
    field("Current", FieldKind::Float, |c, v| c.scan.current = Some(v.as_f64())),
    field("Power", FieldKind::Float, |c, v| c.scan.power = Some(v.as_f64())),
    field("Pixelbinning", FieldKind::Integer, |c, v| c.scan.pixel_binning = Some(v.as_u32())),
    field("DetectorPixelX", FieldKind::Integer, |c, v| c.scan.detector_pixel_x = Some(v.as_u32())),
    field("DetectorPixelY", FieldKind::Integer, |c, v| c.scan.detector_pixel_y = Some(v.as_u32())),
    field("IntegrationTime", FieldKind::Float, |c, v| c.scan.integration_time = Some(v.as_f64())),
    field("Framebinning", FieldKind::Integer, |c, v| c.scan.frame_binning = Some(v.as_u32())),
];

/// Binning applied to an imported detector with `vertical_pixels` rows.
///
/// Detectors taller than [`BINNING_THRESHOLD`] are binned to roughly a
/// thousand rows.
pub fn downsample_binning(vertical_pixels: u32) -> u32 {
    if vertical_pixels > BINNING_THRESHOLD {
        vertical_pixels / 1000 + 1
    } else {
        1
    }
}

/// Split `<Key>Value</Key>` into key and value.
fn split_tag(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('<')?;
    let (key, rest) = rest.split_once('>')?;
    let (value, close) = rest.split_once('<')?;
    close.starts_with('/').then_some((key, value))
}

impl ScanDocuConfig {
    fn beam(&self) -> Option<BeamProperties> {
        let (kv, ua) = (self.scan.voltage?, self.scan.current?);
        let frames = self.scan.frame_binning.unwrap_or(1) as f64;
        let exposure = self
            .scan
            .integration_time
            .map_or(1.0, |ms| ms / 1000.0 * frames);
        Some(BeamProperties::new(
            BeamSource::Lab(LabBeam::tungsten(kv, ua, exposure)),
            Vec::new(),
        ))
    }

    fn detector(&self) -> Option<DetectorProperties> {
        let pixel_size = self.recon.projection_pixel_size_x?;
        let (pixels_x, pixels_y) = (self.scan.detector_pixel_x?, self.scan.detector_pixel_y?);
        Some(DetectorProperties {
            pane_width: pixels_x as f64 * pixel_size,
            pane_height: pixels_y as f64 * pixel_size,
            pixel_size,
            binning: downsample_binning(pixels_y),
            scintillator: Scintillator::unknown(),
            lsf: LineSpreadFunction::flat(),
        })
    }

    fn capture(&self) -> Option<CaptureProperties> {
        let sod = self.geometry.source_object_dist?;
        let odd = self
            .geometry
            .object_detector_dist
            .or_else(|| self.geometry.source_detector_dist.map(|sdd| sdd - sod))?;
        let projections = self
            .recon
            .projection_count_per_360deg
            .or(self.recon.projection_count)
            .unwrap_or(360);
        Some(CaptureProperties::on_axis(sod, odd, projections, ScanArc::Full))
    }
}

impl FormatCodec for ScanDocuConfig {
    const NAME: &'static str = "ScanDocu";

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
        let odd = capture.object_to_detector();
        let sdd = capture.source_to_detector();
        let projections = capture.num_projections;
        let per_360 = (projections as f64 * 360.0 / capture.total_angle.degrees()).round() as u32;

        let kv = config.beam.tube_voltage();
        let ua = config.beam.tube_current_ua();
        let power = kv.zip(ua).map(|(kv, ua)| kv * ua / 1000.0);

        Ok(Self {
            geometry: Geometry {
                source_detector_dist: Some(sdd),
                source_object_dist: Some(sod),
                object_detector_dist: Some(odd),
                magnification: Some(sdd / sod),
            },
            recon: Recon {
                reconstruction_mode: Some(RECONSTRUCTION_MODE.to_string()),
                projection_count: Some(projections),
                projection_count_per_360deg: Some(per_360),
                projection_dim_x: Some(detector.pixels_x()),
                projection_dim_y: Some(detector.pixels_y()),
                projection_pixel_size_x: Some(detector.pixel_size),
                projection_pixel_size_y: Some(detector.pixel_size),
            },
            scan: ScanParameter {
                voltage: kv,
                current: ua,
                power,
                pixel_binning: Some(detector.binning),
                detector_pixel_x: Some(detector.pixels_x()),
                detector_pixel_y: Some(detector.pixels_y()),
                integration_time: Some(config.beam.exposure_s() * 1000.0),
                frame_binning: Some(1),
            },
        })
    }

    fn from_text(raw: &str) -> Result<Self> {
        let mut config = Self::default();
        for line in raw.lines() {
            let line = line.trim();
            if !line.starts_with('<') {
                continue;
            }
            match split_tag(line) {
                Some((key, value)) => {
                    assign_field(SCANDOCU_FIELDS, &mut config, key, value)?;
                }
                None => debug!("Skipping ScanDocu line without a value: {line}"),
            }
        }
        Ok(config)
    }

    fn to_text(&self) -> Result<String> {
        let g = &self.geometry;
        let r = &self.recon;
        let s = &self.scan;

        let groups: [(&str, Vec<(&str, Option<String>)>); 3] = [
            (
                "Geometrie",
                vec![
                    ("SourceDetectorDist", g.source_detector_dist.map(|v| v.to_string())),
                    ("SourceObjectDist", g.source_object_dist.map(|v| v.to_string())),
                    ("ObjectDetectorDist", g.object_detector_dist.map(|v| v.to_string())),
                    ("Magnification", g.magnification.map(|v| v.to_string())),
                ],
            ),
            (
                "Recon",
                vec![
                    ("ReconstructionMode", r.reconstruction_mode.clone()),
                    ("ProjectionCount", r.projection_count.map(|v| v.to_string())),
                    (
                        "ProjectionCountPer360deg",
                        r.projection_count_per_360deg.map(|v| v.to_string()),
                    ),
                    ("ProjectionDimX", r.projection_dim_x.map(|v| v.to_string())),
                    ("ProjectionDimY", r.projection_dim_y.map(|v| v.to_string())),
                    ("ProjectionPixelSizeX", r.projection_pixel_size_x.map(|v| v.to_string())),
                    ("ProjectionPixelSizeY", r.projection_pixel_size_y.map(|v| v.to_string())),
                ],
            ),
            (
                "ScanParameter",
                vec![
                    ("Voltage", s.voltage.map(|v| v.to_string())),
                    ("Current", s.current.map(|v| v.to_string())),
                    ("Power", s.power.map(|v| v.to_string())),
                    ("Pixelbinning", s.pixel_binning.map(|v| v.to_string())),
                    ("DetectorPixelX", s.detector_pixel_x.map(|v| v.to_string())),
                    ("DetectorPixelY", s.detector_pixel_y.map(|v| v.to_string())),
                    ("IntegrationTime", s.integration_time.map(|v| v.to_string())),
                    ("Framebinning", s.frame_binning.map(|v| v.to_string())),
                ],
            ),
        ];

        let mut lines = vec![XML_DECLARATION.to_string(), format!("<{ROOT}>")];
        for (group, entries) in groups {
            lines.push(format!("<{group}>"));
            lines.extend(entries.into_iter().filter_map(|(key, value)| {
                value.map(|value| format!("<{key}>{value}</{key}>"))
            }));
            lines.push(format!("</{group}>"));
        }
        lines.push(format!("</{ROOT}>"));
        lines.push(String::new());
        Ok(lines.join("\n"))
    }

    fn to_canonical_subset(&self) -> ConfigSubset {
        for warning in self.import_warnings() {
            warn!("{warning}");
        }
        ConfigSubset {
            beam: self.beam(),
            detector: self.detector(),
            capture: self.capture(),
            ..Default::default()
        }
    }

    fn sniff(raw: &str) -> bool {
        raw.lines()
            .nth(1)
            .is_some_and(|line| line.starts_with(ROOT_PREFIX))
    }

    fn import_warnings(&self) -> Vec<ImportWarning> {
        match self.scan.detector_pixel_y {
            Some(vertical_pixels) if vertical_pixels > BINNING_THRESHOLD => {
                vec![ImportWarning::DetectorBinned {
                    vertical_pixels,
                    binning: downsample_binning(vertical_pixels),
                }]
            }
            _ => Vec::new(),
        }
    }
}
