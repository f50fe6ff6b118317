//! Importing vendor fixtures into the canonical model and re-exporting them.

use approx::assert_relative_eq;
use test_helpers::read_fixture;
use xct_config::formats::{FormatCodec, ScanDocuConfig, XtekCtConfig};
use xct_config::model::{apply, ReconstructionParams, ScanArc};
use xct_config::{
    complete_for, import, render_full, ConfigFull, ConfigKeys, ConfigSubset, ExportFormat,
    ExportOptions, FormatKind, ImportWarning, MaterialLibrary,
};

fn complete(format: ExportFormat, subset: ConfigSubset) -> ConfigFull {
    complete_for(format, subset, &ExportOptions::default()).unwrap()
}

#[test]
fn test_xtekct_fixture() {
    let imported = import(&read_fixture("scan.xtekct").unwrap()).unwrap();
    assert_eq!(imported.format, FormatKind::Xtekct);
    assert!(imported.warnings.is_empty());

    let subset = imported.subset;
    assert_eq!(
        subset.keys(),
        ConfigKeys {
            beam: true,
            detector: true,
            capture: true,
            ..ConfigKeys::NONE
        }
    );

    let capture = subset.capture.unwrap();
    assert_relative_eq!(capture.source_to_object(), 250.5);
    assert_relative_eq!(capture.source_to_detector(), 1100.2, epsilon = 1e-9);
    assert_eq!(capture.num_projections, 1571);
    assert_eq!(capture.total_angle, ScanArc::Full);

    let beam = subset.beam.unwrap();
    assert_relative_eq!(beam.tube_voltage().unwrap(), 180.0);
    assert_relative_eq!(beam.tube_current_ua().unwrap(), 120.0);
    let filter = beam.primary_filter().unwrap();
    assert_eq!(filter.material, "Cu");
    assert_relative_eq!(filter.thickness, 0.5);

    let detector = subset.detector.unwrap();
    assert_relative_eq!(detector.pane_width, 400.0, epsilon = 1e-9);
    assert_eq!(detector.binning, 1);
}

#[test]
fn test_scandocu_fixture_binned() {
    let imported = import(&read_fixture("scan_docu.xml").unwrap()).unwrap();
    assert_eq!(imported.format, FormatKind::ScanDocu);
    assert_eq!(
        imported.warnings,
        vec![ImportWarning::DetectorBinned {
            vertical_pixels: 3072,
            binning: 4
        }]
    );

    let subset = imported.subset;
    let detector = subset.detector.unwrap();
    assert_eq!(detector.binning, 4);
    assert_relative_eq!(detector.pane_height, 427.008, epsilon = 1e-9);
    assert!(detector.lsf.is_flat());

    let beam = subset.beam.unwrap();
    assert_relative_eq!(beam.exposure_s(), 1.0);
    assert!(beam.filters.is_empty());

    let capture = subset.capture.unwrap();
    assert_relative_eq!(capture.source_to_object(), 300.0);
    assert_relative_eq!(capture.object_to_detector(), 900.0);
    assert_eq!(capture.num_projections, 1800);
}

#[test]
fn test_xtekct_to_scandocu_keeps_geometry() {
    let imported = import(&read_fixture("scan.xtekct").unwrap()).unwrap();
    let config = complete(ExportFormat::Diondo, imported.subset);
    let library = MaterialLibrary::new();

    let options = ExportOptions::default();
    let docu = ScanDocuConfig::from_canonical(&config, &options, &library).unwrap();
    let text = docu.to_text().unwrap();
    let back = import(&text).unwrap();
    assert_eq!(back.format, FormatKind::ScanDocu);

    let capture = back.subset.capture.unwrap();
    assert_relative_eq!(capture.source_to_object(), 250.5);
    assert_relative_eq!(capture.object_to_detector(), 849.7, epsilon = 1e-9);
    assert_relative_eq!(
        back.subset.beam.unwrap().tube_voltage().unwrap(),
        180.0
    );
}

#[test]
fn test_xtekct_text_round_trip() {
    let raw = read_fixture("scan.xtekct").unwrap();
    let config = complete(ExportFormat::Xtek, import(&raw).unwrap().subset);

    let text = render_full(
        ExportFormat::Xtek,
        &config,
        &ExportOptions::default(),
        &MaterialLibrary::new(),
        &std::collections::BTreeSet::<String>::new(),
    )
    .unwrap();
    let reparsed = XtekCtConfig::from_text(&text).unwrap();
    let original = XtekCtConfig::from_text(&raw).unwrap();

    assert_eq!(reparsed.projections, original.projections);
    assert_eq!(reparsed.detector_pixels_x, original.detector_pixels_x);
    assert_relative_eq!(reparsed.src_to_object.unwrap(), original.src_to_object.unwrap());
    assert_relative_eq!(
        reparsed.src_to_detector.unwrap(),
        original.src_to_detector.unwrap(),
        epsilon = 1e-9
    );
    assert_relative_eq!(
        reparsed.angular_step.unwrap(),
        original.angular_step.unwrap(),
        epsilon = 1e-3
    );
    assert_relative_eq!(reparsed.xray_kv.unwrap(), original.xray_kv.unwrap());
}

#[test]
fn test_partial_canonical_applies_only_present_sections() {
    let full = ConfigSubset::from_json_str(&read_fixture("webct_full.json").unwrap()).unwrap();
    let mut state = ConfigFull::try_from(full).unwrap();
    let detector_before = state.detector.clone();

    let imported = import(&read_fixture("webct.json").unwrap()).unwrap();
    let written = apply(&mut state, &imported.subset);

    assert_eq!(
        written,
        ConfigKeys {
            beam: true,
            capture: true,
            ..ConfigKeys::NONE
        }
    );
    assert!(!state.beam.is_synchrotron());
    assert_eq!(state.capture.total_angle, ScanArc::Half);
    assert_eq!(state.capture.num_projections, 400);
    assert_eq!(state.detector, detector_before);
    assert!(matches!(state.recon, ReconstructionParams::Cgls { .. }));
}
