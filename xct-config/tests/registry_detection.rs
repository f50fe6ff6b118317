//! Format detection over the shared fixture files.

use test_helpers::read_fixture;
use xct_config::registry::CANDIDATES;
use xct_config::{detect, import, CodecError, FormatKind};

const FIXTURES: [(&str, FormatKind); 5] = [
    ("scan.xtekct", FormatKind::Xtekct),
    ("scan_docu.xml", FormatKind::ScanDocu),
    ("gvxr.json", FormatKind::Gvxr),
    ("webct.json", FormatKind::Canonical),
    ("webct_full.json", FormatKind::Canonical),
];

#[test]
fn test_each_fixture_detected() {
    for (name, expected) in FIXTURES {
        let raw = read_fixture(name).unwrap();
        assert_eq!(detect(&raw).unwrap(), expected, "fixture {name}");
    }
}

#[test]
fn test_exactly_one_candidate_claims_each_fixture() {
    for (name, _) in FIXTURES {
        let raw = read_fixture(name).unwrap();
        let claims: Vec<FormatKind> = CANDIDATES
            .into_iter()
            .filter(|kind| kind.sniff(&raw))
            .collect();
        assert_eq!(claims.len(), 1, "fixture {name} claimed by {claims:?}");
    }
}

#[test]
fn test_detection_is_repeatable() {
    let raw = read_fixture("scan_docu.xml").unwrap();
    let first = detect(&raw).unwrap();
    for _ in 0..5 {
        assert_eq!(detect(&raw).unwrap(), first);
    }
}

#[test]
fn test_unrelated_text_rejected() {
    let raw = read_fixture("notes.txt").unwrap();
    assert!(matches!(detect(&raw), Err(CodecError::UnrecognizedFormat)));
    assert!(matches!(import(&raw), Err(CodecError::UnrecognizedFormat)));
}

#[test]
fn test_gvxr_import_yields_nothing() {
    let raw = read_fixture("gvxr.json").unwrap();
    let imported = import(&raw).unwrap();
    assert_eq!(imported.format, FormatKind::Gvxr);
    assert!(imported.subset.is_empty());
    assert!(imported.warnings.is_empty());
}
