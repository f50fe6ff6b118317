//! Shared configurations for unit tests.

use super::*;

pub(crate) fn titanium() -> Material {
    Material {
        label: "Ti-6Al-4V".to_string(),
        description: "Titanium alloy".to_string(),
        density: 4.43,
        material: MaterialComposition::Mixture(vec![
            ("Ti".to_string(), 0.9),
            ("Al".to_string(), 0.06),
            ("V".to_string(), 0.04),
        ]),
    }
}

pub(crate) fn air() -> Material {
    Material {
        label: "Air".to_string(),
        description: "Empty space".to_string(),
        density: 0.0012,
        material: MaterialComposition::Special("air".to_string()),
    }
}

pub(crate) fn titanium_library() -> MaterialLibrary {
    let mut library = MaterialLibrary::new();
    library.insert("metals", "ti64", titanium());
    library.insert("special", "air", air());
    library
}

pub(crate) fn lab_beam() -> BeamProperties {
    BeamProperties::new(
        BeamSource::Lab(LabBeam {
            voltage: 160.0,
            exposure: 0.5,
            intensity: 100.0,
            spot_size: 0.05,
            anode_angle: 12.0,
            anode_material: "W".to_string(),
            generator: BeamGenerator::Spekpy,
        }),
        vec![Filter::new("Cu", 1.0)],
    )
}

pub(crate) fn synchrotron_beam(harmonics: bool) -> BeamProperties {
    BeamProperties::new(
        BeamSource::Synchrotron(SynchrotronBeam {
            energy: 80.0,
            exposure: 2.0,
            intensity: 5.0,
            harmonics,
        }),
        Vec::new(),
    )
}

/// Lab scan: 500 mm source to object, 1000 mm source to detector, 0.2 mm pixels.
pub(crate) fn lab_config() -> ConfigFull {
    ConfigFull {
        beam: lab_beam(),
        detector: DetectorProperties {
            pane_width: 400.0,
            pane_height: 300.0,
            pixel_size: 0.2,
            binning: 1,
            scintillator: Scintillator {
                material: "CsI".to_string(),
                thickness: 0.5,
            },
            lsf: LineSpreadFunction::from_values(vec![0.1, 0.8, 0.1]),
        },
        samples: vec![SampleProperties {
            label: "Bolt".to_string(),
            model_path: "bolt.stl".to_string(),
            size_unit: "mm".to_string(),
            material: MaterialSource::Library("metals/ti64".to_string()),
        }],
        capture: CaptureProperties::on_axis(500.0, 500.0, 720, ScanArc::Full),
        recon: ReconstructionParams::default(),
    }
}

pub(crate) fn synchrotron_config(harmonics: bool) -> ConfigFull {
    ConfigFull {
        beam: synchrotron_beam(harmonics),
        ..lab_config()
    }
}
