//! Re-exporting imported fixture files, as the `convert` subcommand does.

use std::collections::BTreeSet;

use test_helpers::{fixture_path, read_fixture};
use xct_config::{convert, import, CodecError, ExportFormat, ExportOptions, MaterialLibrary};

fn library() -> MaterialLibrary {
    MaterialLibrary::load_from_file(&fixture_path("materials.json")).unwrap()
}

fn convert_fixture(
    name: &str,
    to: ExportFormat,
    options: &ExportOptions,
) -> xct_config::Result<String> {
    let imported = import(&read_fixture(name).unwrap()).unwrap();
    let models = BTreeSet::from(["vial.stl".to_string(), "box.stl".to_string()]);
    convert(to, imported.subset, options, &library(), &models)
}

#[test]
fn test_json_inlines_materials_by_default() {
    let text = convert_fixture("webct_full.json", ExportFormat::Json, &ExportOptions::default())
        .unwrap();
    assert!(!text.contains("materialID"));
    assert!(text.contains("\"label\": \"Polypropylene\""));
}

#[test]
fn test_json_keeps_material_ids_on_request() {
    let options = ExportOptions {
        materials_as_id: true,
        ..Default::default()
    };
    let text = convert_fixture("webct_full.json", ExportFormat::Json, &options).unwrap();
    assert_eq!(text.matches("\"materialID\"").count(), 1);
}

#[test]
fn test_json_does_not_add_sections() {
    let text = convert_fixture("scan.xtekct", ExportFormat::Json, &ExportOptions::default())
        .unwrap();
    assert!(!text.contains("\"samples\""));
    assert!(!text.contains("\"recon\""));
}

#[test]
fn test_xtekct_to_script_needs_samples() {
    let options = ExportOptions {
        include_scan: true,
        include_reconstruction: true,
        ..Default::default()
    };
    for to in [ExportFormat::Python, ExportFormat::Gvxr] {
        let err = convert_fixture("scan.xtekct", to, &options).unwrap_err();
        assert!(
            matches!(err, CodecError::MissingSection("samples")),
            "{to}: unexpected error {err}"
        );
    }
}

#[test]
fn test_xtekct_to_diondo() {
    let text = convert_fixture("scan.xtekct", ExportFormat::Diondo, &ExportOptions::default())
        .unwrap();
    assert!(text.contains("<SourceObjectDist>250.5</SourceObjectDist>"));
    assert!(text.contains("<Voltage>180</Voltage>"));
}

#[test]
fn test_canonical_to_script() {
    let options = ExportOptions {
        include_scan: true,
        include_reconstruction: true,
        ..Default::default()
    };
    let script = convert_fixture("webct_full.json", ExportFormat::Python, &options).unwrap();
    assert!(script.contains("def reconstruct():"));
    assert!(script.contains("algo.run(30)"));
}
