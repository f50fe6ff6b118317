//! X-ray source configuration.
//!
//! A beam is either a lab tube, a medical tube, or a synchrotron. The `method`
//! tag in the wire format selects the variant; filters are shared by all three.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Single-element filter placed in the beam path after generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Chemical symbol of the filter material (e.g. "Cu")
    pub material: String,
    /// Filter thickness in millimeters
    pub thickness: f64,
}

impl Filter {
    pub fn new(material: impl Into<String>, thickness: f64) -> Self {
        Self {
            material: material.into(),
            thickness,
        }
    }
}

/// Spectrum generation algorithm used for tube sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamGenerator {
    #[default]
    Spekpy,
    Xpecgen,
}

/// Laboratory X-ray tube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabBeam {
    /// Tube voltage in kV
    pub voltage: f64,
    /// Exposure time in seconds
    pub exposure: f64,
    /// Tube current in µA
    pub intensity: f64,
    /// Focal spot size in millimeters
    pub spot_size: f64,
    /// Anode angle in degrees
    pub anode_angle: f64,
    /// Chemical symbol of the anode target
    pub anode_material: String,
    pub generator: BeamGenerator,
}

/// Medical X-ray tube, driven by tube charge instead of current and exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalBeam {
    /// Tube voltage in kV
    pub voltage: f64,
    /// Tube charge in mAs
    pub mas: f64,
    /// Focal spot size in millimeters
    pub spot_size: f64,
    /// Anode angle in degrees
    pub anode_angle: f64,
    pub anode_material: String,
    pub generator: BeamGenerator,
}

/// Monochromatic parallel synchrotron beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchrotronBeam {
    /// Beam energy in keV
    pub energy: f64,
    /// Exposure time in seconds
    pub exposure: f64,
    /// Photon flux
    pub intensity: f64,
    /// Include second and third harmonics in the exported spectrum
    pub harmonics: bool,
}

/// Source variant, discriminated by `method` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum BeamSource {
    #[serde(rename = "lab")]
    Lab(LabBeam),
    #[serde(rename = "med")]
    Medical(MedicalBeam),
    #[serde(rename = "synch")]
    Synchrotron(SynchrotronBeam),
}

/// Complete beam description: the source plus its filter stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamProperties {
    #[serde(flatten)]
    pub source: BeamSource,
    /// Filters in beam order
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl BeamProperties {
    pub fn new(source: BeamSource, filters: Vec<Filter>) -> Self {
        Self { source, filters }
    }

    /// Wire name of the source variant
    pub fn method(&self) -> &'static str {
        match self.source {
            BeamSource::Lab(_) => "lab",
            BeamSource::Medical(_) => "med",
            BeamSource::Synchrotron(_) => "synch",
        }
    }

    pub fn is_synchrotron(&self) -> bool {
        matches!(self.source, BeamSource::Synchrotron(_))
    }

    /// Tube voltage in kV, `None` for synchrotron sources
    pub fn tube_voltage(&self) -> Option<f64> {
        match &self.source {
            BeamSource::Lab(lab) => Some(lab.voltage),
            BeamSource::Medical(med) => Some(med.voltage),
            BeamSource::Synchrotron(_) => None,
        }
    }

    /// Anode angle in degrees, `None` for synchrotron sources
    pub fn anode_angle(&self) -> Option<f64> {
        match &self.source {
            BeamSource::Lab(lab) => Some(lab.anode_angle),
            BeamSource::Medical(med) => Some(med.anode_angle),
            BeamSource::Synchrotron(_) => None,
        }
    }

    /// Tube current in µA.
    ///
    /// Medical tubes only carry a charge, which is reported as the current
    /// of an equivalent one second exposure.
    pub fn tube_current_ua(&self) -> Option<f64> {
        match &self.source {
            BeamSource::Lab(lab) => Some(lab.intensity),
            BeamSource::Medical(med) => Some(med.mas * 1000.0),
            BeamSource::Synchrotron(_) => None,
        }
    }

    /// Exposure time in seconds (one second for medical tubes)
    pub fn exposure_s(&self) -> f64 {
        match &self.source {
            BeamSource::Lab(lab) => lab.exposure,
            BeamSource::Medical(_) => 1.0,
            BeamSource::Synchrotron(synch) => synch.exposure,
        }
    }

    /// First filter in the stack, if any
    pub fn primary_filter(&self) -> Option<&Filter> {
        self.filters.first()
    }

    pub fn validate(&self) -> Result<()> {
        for filter in &self.filters {
            if filter.thickness < 0.0 {
                return Err(CodecError::invalid(
                    "beam.filters",
                    format!("thickness {} mm is negative", filter.thickness),
                ));
            }
        }

        match &self.source {
            BeamSource::Lab(LabBeam { voltage, .. })
            | BeamSource::Medical(MedicalBeam { voltage, .. })
                if *voltage <= 0.0 =>
            {
                Err(CodecError::invalid(
                    "beam.voltage",
                    format!("{voltage} kV must be positive"),
                ))
            }
            BeamSource::Synchrotron(synch) if synch.energy <= 0.0 => Err(CodecError::invalid(
                "beam.energy",
                format!("{} keV must be positive", synch.energy),
            )),
            _ => Ok(()),
        }
    }
}

impl LabBeam {
    /// Tungsten tube with the defaults used when a vendor format only carries
    /// voltage and current.
    pub fn tungsten(voltage: f64, intensity: f64, exposure: f64) -> Self {
        Self {
            voltage,
            exposure,
            intensity,
            spot_size: 0.0,
            anode_angle: 12.0,
            anode_material: "W".to_string(),
            generator: BeamGenerator::Spekpy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lab_beam_wire_shape() {
        let beam = BeamProperties::new(
            BeamSource::Lab(LabBeam::tungsten(120.0, 50.0, 1.0)),
            vec![Filter::new("Cu", 0.5)],
        );

        let json = serde_json::to_value(&beam).unwrap();
        assert_eq!(json["method"], "lab");
        assert_eq!(json["voltage"], 120.0);
        assert_eq!(json["anodeAngle"], 12.0);
        assert_eq!(json["anodeMaterial"], "W");
        assert_eq!(json["generator"], "spekpy");
        assert_eq!(json["filters"][0]["material"], "Cu");

        let back: BeamProperties = serde_json::from_value(json).unwrap();
        assert_eq!(back, beam);
    }

    #[test]
    fn test_synchrotron_from_json() {
        let json =
            r#"{"method":"synch","energy":40,"exposure":1.5,"intensity":3,"harmonics":true}"#;
        let beam: BeamProperties = serde_json::from_str(json).unwrap();

        assert!(beam.is_synchrotron());
        assert_eq!(beam.method(), "synch");
        assert!(beam.filters.is_empty());
        assert_eq!(beam.tube_voltage(), None);
        assert_relative_eq!(beam.exposure_s(), 1.5);
    }

    #[test]
    fn test_medical_current_equivalent() {
        let beam = BeamProperties::new(
            BeamSource::Medical(MedicalBeam {
                voltage: 80.0,
                mas: 0.2,
                spot_size: 0.6,
                anode_angle: 10.0,
                anode_material: "W".to_string(),
                generator: BeamGenerator::Xpecgen,
            }),
            Vec::new(),
        );

        assert_relative_eq!(beam.tube_current_ua().unwrap(), 200.0);
        assert_relative_eq!(beam.anode_angle().unwrap(), 10.0);
    }

    #[test]
    fn test_validate_rejects_negative_filter() {
        let beam = BeamProperties::new(
            BeamSource::Lab(LabBeam::tungsten(100.0, 10.0, 1.0)),
            vec![Filter::new("Al", -1.0)],
        );
        assert!(matches!(
            beam.validate(),
            Err(CodecError::InvalidValue { field: "beam.filters", .. })
        ));
    }
}
