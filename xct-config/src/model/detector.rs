//! Detector pane, scintillator and line-spread function.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Scintillator layer in front of the detector pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scintillator {
    /// Scintillator material name, empty when no scintillator is modelled
    pub material: String,
    /// Thickness in millimeters
    pub thickness: f64,
}

impl Scintillator {
    /// Placeholder used when a format carries no scintillator information.
    pub fn unknown() -> Self {
        Self {
            material: String::new(),
            thickness: 100.0,
        }
    }
}

/// Detector blur kernel as pixel-offset / weight pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpreadFunction {
    /// Pixel offsets from the kernel centre
    pub pixels: Vec<f64>,
    /// Weights for each offset
    pub values: Vec<f64>,
}

impl LineSpreadFunction {
    /// Flat kernel that leaves the image untouched.
    ///
    /// Used as the placeholder for formats that do not describe detector blur;
    /// it is not a measured response.
    pub fn flat() -> Self {
        Self {
            pixels: vec![-1.0, 0.0, 1.0],
            values: vec![0.0, 1.0, 0.0],
        }
    }

    /// Build a kernel from weights, centring the offsets on the middle sample.
    pub fn from_values(values: Vec<f64>) -> Self {
        let half = (values.len() / 2) as f64;
        let pixels = (0..values.len()).map(|i| i as f64 - half).collect();
        Self { pixels, values }
    }

    /// Return a copy whose weights sum to one.
    pub fn normalized(&self) -> Result<Self> {
        let sum: f64 = self.values.iter().sum();
        if sum <= 0.0 {
            return Err(CodecError::invalid(
                "detector.lsf",
                "weights must have a positive sum",
            ));
        }
        Ok(Self {
            pixels: self.pixels.clone(),
            values: self.values.iter().map(|v| v / sum).collect(),
        })
    }

    pub fn is_flat(&self) -> bool {
        *self == Self::flat()
    }
}

/// X-ray detector properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorProperties {
    /// Detector pane width in millimeters
    pub pane_width: f64,
    /// Detector pane height in millimeters
    pub pane_height: f64,
    /// Pixel pitch in millimeters
    pub pixel_size: f64,
    /// Pixel binning factor
    #[serde(default = "default_binning")]
    pub binning: u32,
    pub scintillator: Scintillator,
    pub lsf: LineSpreadFunction,
}

fn default_binning() -> u32 {
    1
}

impl DetectorProperties {
    /// Number of pixels across the pane width
    pub fn pixels_x(&self) -> u32 {
        (self.pane_width / self.pixel_size).round() as u32
    }

    /// Number of pixels across the pane height
    pub fn pixels_y(&self) -> u32 {
        (self.pane_height / self.pixel_size).round() as u32
    }

    pub fn validate(&self) -> Result<()> {
        if self.pixel_size <= 0.0 {
            return Err(CodecError::invalid(
                "detector.pixelSize",
                format!("{} mm must be positive", self.pixel_size),
            ));
        }
        if self.pane_width <= 0.0 || self.pane_height <= 0.0 {
            return Err(CodecError::invalid(
                "detector.pane",
                format!(
                    "{} x {} mm must be positive",
                    self.pane_width, self.pane_height
                ),
            ));
        }
        if self.binning < 1 {
            return Err(CodecError::invalid("detector.binning", "must be at least 1"));
        }
        if self.lsf.pixels.len() != self.lsf.values.len() {
            return Err(CodecError::invalid(
                "detector.lsf",
                "offsets and weights differ in length",
            ));
        }
        Ok(())
    }
}
