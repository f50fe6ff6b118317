//! The application's own JSON configuration.
//!
//! This is the canonical subset serialized as-is. It is the last format the
//! registry tries, so anything structurally closer to a vendor format wins.

use serde_json::{Map, Value};

use super::{FormatCodec, SniffInput};
use crate::error::Result;
use crate::model::{collect, ConfigFull, ConfigKeys, ConfigSubset, ExportOptions, MaterialLibrary};

/// Top level keys a canonical configuration may carry
pub const SECTION_KEYS: [&str; 5] = ["beam", "detector", "samples", "capture", "recon"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalJson {
    pub subset: ConfigSubset,
}

impl From<ConfigSubset> for CanonicalJson {
    fn from(subset: ConfigSubset) -> Self {
        Self { subset }
    }
}

impl FormatCodec for CanonicalJson {
    const NAME: &'static str = "WebCT JSON";

    fn from_canonical(
        config: &ConfigFull,
        options: &ExportOptions,
        library: &MaterialLibrary,
    ) -> Result<Self> {
        collect(config, ConfigKeys::ALL, options, library).map(Self::from)
    }

    fn from_text(raw: &str) -> Result<Self> {
        ConfigSubset::from_json_str(raw).map(Self::from)
    }

    fn to_text(&self) -> Result<String> {
        self.subset.to_json_string()
    }

    fn to_canonical_subset(&self) -> ConfigSubset {
        self.subset.clone()
    }

    fn sniff(raw: &str) -> bool {
        SniffInput::new(raw)
            .json_object()
            .is_some_and(Self::sniff_object)
    }
}

impl CanonicalJson {
    /// A non-empty object whose keys are all canonical section names.
    pub fn sniff_object(obj: &Map<String, Value>) -> bool {
        !obj.is_empty() && obj.keys().all(|key| SECTION_KEYS.contains(&key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::{lab_config, titanium_library};
    use crate::model::MaterialSource;

    #[test]
    fn test_export_inlines_materials() {
        let options = ExportOptions::default();
        let canonical =
            CanonicalJson::from_canonical(&lab_config(), &options, &titanium_library()).unwrap();
        let samples = canonical.subset.samples.as_ref().unwrap();
        assert!(matches!(samples[0].material, MaterialSource::Inline(_)));

        let text = canonical.to_text().unwrap();
        assert!(text.starts_with("{\n    \"beam\""));
        assert!(CanonicalJson::sniff(&text));
    }

    #[test]
    fn test_text_round_trip() {
        let options = ExportOptions {
            materials_as_id: true,
            ..Default::default()
        };
        let text = CanonicalJson::from_canonical(&lab_config(), &options, &titanium_library())
            .unwrap()
            .to_text()
            .unwrap();
        let subset = CanonicalJson::from_text(&text).unwrap().to_canonical_subset();
        assert_eq!(ConfigFull::try_from(subset).unwrap(), lab_config());
    }

    #[test]
    fn test_sniff() {
        let recon_only = r#"{"recon": {"method": "SIRT", "quality": 1, "iterations": 5}}"#;
        assert!(CanonicalJson::sniff(recon_only));
        assert!(!CanonicalJson::sniff("{}"));
        assert!(!CanonicalJson::sniff(r#"{"Detector": {}, "beam": {}}"#));
        assert!(!CanonicalJson::sniff("[1, 2]"));
    }
}
