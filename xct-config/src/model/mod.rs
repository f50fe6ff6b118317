//! Canonical, format-agnostic scan configuration model.

pub mod beam;
pub mod capture;
pub mod config;
pub mod detector;
pub mod recon;
pub mod sample;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use beam::{
    BeamGenerator, BeamProperties, BeamSource, Filter, LabBeam, MedicalBeam, SynchrotronBeam,
};
pub use capture::{CaptureProperties, ScanArc, Vec3, BEAM_AXIS};
pub use config::{
    apply, collect, inline_materials, ConfigFull, ConfigKeys, ConfigSubset, ExportOptions,
    ScanState,
};
pub use detector::{DetectorProperties, LineSpreadFunction, Scintillator};
pub use recon::ReconstructionParams;
pub use sample::{Material, MaterialComposition, MaterialLibrary, MaterialSource, SampleProperties};
