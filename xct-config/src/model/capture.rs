//! Capture geometry and scan plan.
//!
//! Positions are in millimeters relative to the sample origin. The beam sits at a
//! negative offset along the Y axis and the detector at a positive one.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Three component vector (mm for positions, degrees for rotations)
pub type Vec3 = [f64; 3];

/// Index of the source/detector axis within a [`Vec3`]
pub const BEAM_AXIS: usize = 1;

/// Largest projection count accepted by the simulation backend
pub const MAX_PROJECTIONS: u32 = 10_000;

/// Total rotation of the sample during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ScanArc {
    /// 180 degree half scan
    Half,
    /// 360 degree full scan
    Full,
}

impl ScanArc {
    pub fn degrees(self) -> f64 {
        match self {
            ScanArc::Half => 180.0,
            ScanArc::Full => 360.0,
        }
    }

    /// Infer the arc from an angular increment and projection count.
    ///
    /// Anything covering less than 270 degrees is treated as a half scan.
    pub fn infer(angular_step: f64, projections: u32) -> Self {
        if angular_step * (projections as f64) < 270.0 {
            ScanArc::Half
        } else {
            ScanArc::Full
        }
    }
}

impl TryFrom<u32> for ScanArc {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            180 => Ok(ScanArc::Half),
            360 => Ok(ScanArc::Full),
            other => Err(format!(
                "total angle must be 180 or 360 degrees, got {other}"
            )),
        }
    }
}

impl From<ScanArc> for u32 {
    fn from(arc: ScanArc) -> Self {
        match arc {
            ScanArc::Half => 180,
            ScanArc::Full => 360,
        }
    }
}

/// Scan plan and source/detector geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureProperties {
    /// Number of equally spaced projections
    pub num_projections: u32,
    pub total_angle: ScanArc,
    pub beam_position: Vec3,
    pub detector_position: Vec3,
    /// Sample rotation in degrees
    pub sample_rotation: Vec3,
    /// Detector rotation in degrees. Configurations saved before this field
    /// existed load with a zero rotation.
    #[serde(default)]
    pub detector_rotation: Vec3,
    /// Rotate around the sample's own axis instead of the scanner axis.
    /// Missing in older configurations, where it loads as `false`.
    #[serde(default)]
    pub laminography_mode: bool,
}

impl CaptureProperties {
    /// Source to object (rotation centre) distance in millimeters
    pub fn source_to_object(&self) -> f64 {
        -self.beam_position[BEAM_AXIS]
    }

    /// Object to detector distance in millimeters
    pub fn object_to_detector(&self) -> f64 {
        self.detector_position[BEAM_AXIS]
    }

    /// Source to detector distance in millimeters
    pub fn source_to_detector(&self) -> f64 {
        self.source_to_object() + self.object_to_detector()
    }

    /// Angle between consecutive projections in degrees
    pub fn angular_step(&self) -> f64 {
        self.total_angle.degrees() / self.num_projections as f64
    }

    /// Geometry with both positions on the beam axis.
    pub fn on_axis(
        source_to_object: f64,
        object_to_detector: f64,
        projections: u32,
        arc: ScanArc,
    ) -> Self {
        Self {
            num_projections: projections,
            total_angle: arc,
            beam_position: [0.0, -source_to_object, 0.0],
            detector_position: [0.0, object_to_detector, 0.0],
            sample_rotation: [0.0; 3],
            detector_rotation: [0.0; 3],
            laminography_mode: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_projections < 2 {
            return Err(CodecError::invalid(
                "capture.numProjections",
                "must be 2 or larger",
            ));
        }
        if self.num_projections > MAX_PROJECTIONS {
            return Err(CodecError::invalid(
                "capture.numProjections",
                format!("must not exceed {MAX_PROJECTIONS}"),
            ));
        }
        if self.source_to_object() <= 0.0 {
            return Err(CodecError::invalid(
                "capture.beamPosition",
                "beam must sit at a negative offset along the beam axis",
            ));
        }
        Ok(())
    }
}
