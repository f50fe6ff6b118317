//! Samples, their materials, and the external material library.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CodecError, Result};

/// Chemical makeup of a material, serialized as a `[kind, value]` pair.
///
/// ```text
/// ["element", "Fe"]
/// ["compound", "H2O"]
/// ["mixture", [["Ti", 0.9], ["Al", 0.06], ["V", 0.04]]]
/// ["hu", 1000]
/// ["special", "air"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "(String, Value)", into = "(String, Value)")]
pub enum MaterialComposition {
    Element(String),
    Compound(String),
    /// Element symbols with mass fractions
    Mixture(Vec<(String, f64)>),
    /// Hounsfield unit
    Hu(f64),
    /// Application placeholder such as `air`; has no physical representation
    Special(String),
}

impl MaterialComposition {
    /// Placeholders are no-ops in a simulation and are dropped on export.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, MaterialComposition::Special(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MaterialComposition::Element(_) => "element",
            MaterialComposition::Compound(_) => "compound",
            MaterialComposition::Mixture(_) => "mixture",
            MaterialComposition::Hu(_) => "hu",
            MaterialComposition::Special(_) => "special",
        }
    }
}

impl TryFrom<(String, Value)> for MaterialComposition {
    type Error = String;

    fn try_from((kind, value): (String, Value)) -> std::result::Result<Self, Self::Error> {
        let text = |v: Value| match v {
            Value::String(s) => Ok(s),
            other => Err(format!("{kind} material expects a string, got {other}")),
        };

        match kind.as_str() {
            "element" => text(value).map(MaterialComposition::Element),
            "compound" => text(value).map(MaterialComposition::Compound),
            "special" => text(value).map(MaterialComposition::Special),
            "hu" => value
                .as_f64()
                .map(MaterialComposition::Hu)
                .ok_or_else(|| format!("hu material expects a number, got {value}")),
            "mixture" => serde_json::from_value::<Vec<(String, f64)>>(value)
                .map(MaterialComposition::Mixture)
                .map_err(|e| format!("invalid mixture: {e}")),
            other => Err(format!("unknown material kind '{other}'")),
        }
    }
}

impl From<MaterialComposition> for (String, Value) {
    fn from(composition: MaterialComposition) -> Self {
        let kind = composition.kind().to_string();
        let value = match composition {
            MaterialComposition::Element(s)
            | MaterialComposition::Compound(s)
            | MaterialComposition::Special(s) => Value::String(s),
            MaterialComposition::Hu(hu) => Value::from(hu),
            MaterialComposition::Mixture(parts) => Value::Array(
                parts
                    .into_iter()
                    .map(|(symbol, weight)| {
                        Value::Array(vec![Value::String(symbol), Value::from(weight)])
                    })
                    .collect(),
            ),
        };
        (kind, value)
    }
}

/// A named material with density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// User-facing name
    pub label: String,
    #[serde(default)]
    pub description: String,
    /// Density in g/cm³
    pub density: f64,
    pub material: MaterialComposition,
}

/// Where a sample gets its material from. A sample carries exactly one of the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialSource {
    /// Material defined inline with the sample
    #[serde(rename = "material")]
    Inline(Material),
    /// `"category/key"` reference into the material library
    #[serde(rename = "materialID")]
    Library(String),
}

/// A sample model placed in the scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleProperties {
    pub label: String,
    /// Path to the mesh, relative to the model folder
    pub model_path: String,
    /// Unit the mesh is authored in
    #[serde(default = "default_size_unit")]
    pub size_unit: String,
    #[serde(flatten)]
    pub material: MaterialSource,
}

fn default_size_unit() -> String {
    "mm".to_string()
}

impl SampleProperties {
    /// Resolve the sample's material, looking up library references.
    pub fn resolve_material(&self, library: &MaterialLibrary) -> Result<Material> {
        match &self.material {
            MaterialSource::Inline(material) => Ok(material.clone()),
            MaterialSource::Library(id) => library.resolve(id).cloned(),
        }
    }
}

/// Material library keyed by category, then by material key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialLibrary {
    categories: BTreeMap<String, BTreeMap<String, Material>>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a material
    pub fn insert(
        &mut self,
        category: impl Into<String>,
        key: impl Into<String>,
        material: Material,
    ) {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(key.into(), material);
    }

    /// Look up a `"category/key"` reference
    pub fn resolve(&self, id: &str) -> Result<&Material> {
        let (category, key) = id
            .split_once('/')
            .ok_or_else(|| CodecError::UnknownMaterial(id.to_string()))?;
        self.categories
            .get(category)
            .and_then(|materials| materials.get(key))
            .ok_or_else(|| CodecError::UnknownMaterial(id.to_string()))
    }

    /// Number of materials across all categories
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::titanium;

    #[test]
    fn test_composition_pair_format() {
        let json = serde_json::to_string(&MaterialComposition::Element("Fe".to_string())).unwrap();
        assert_eq!(json, r#"["element","Fe"]"#);

        let hu: MaterialComposition = serde_json::from_str(r#"["hu", 1000]"#).unwrap();
        assert_eq!(hu, MaterialComposition::Hu(1000.0));

        let mix = serde_json::to_value(&titanium().material).unwrap();
        assert_eq!(mix[0], "mixture");
        assert_eq!(mix[1][0][0], "Ti");

        assert!(serde_json::from_str::<MaterialComposition>(r#"["plasma", "x"]"#).is_err());
        assert!(serde_json::from_str::<MaterialComposition>(r#"["element", 26]"#).is_err());
    }

    #[test]
    fn test_sample_material_sources() {
        let by_id = r#"{"label":"bolt","modelPath":"bolt.stl","sizeUnit":"mm",
            "materialID":"metals/ti64"}"#;
        let sample: SampleProperties = serde_json::from_str(by_id).unwrap();
        assert_eq!(sample.material, MaterialSource::Library("metals/ti64".to_string()));

        let inline = SampleProperties {
            label: "bolt".to_string(),
            model_path: "bolt.stl".to_string(),
            size_unit: "mm".to_string(),
            material: MaterialSource::Inline(titanium()),
        };
        let json = serde_json::to_value(&inline).unwrap();
        assert!(json.get("material").is_some());
        assert!(json.get("materialID").is_none());
        assert_eq!(json["modelPath"], "bolt.stl");
    }

    #[test]
    fn test_library_resolution() {
        let mut library = MaterialLibrary::new();
        library.insert("metals", "ti64", titanium());

        let sample = SampleProperties {
            label: "bolt".to_string(),
            model_path: "bolt.stl".to_string(),
            size_unit: "mm".to_string(),
            material: MaterialSource::Library("metals/ti64".to_string()),
        };
        assert_eq!(sample.resolve_material(&library).unwrap().density, 4.43);

        assert!(matches!(
            library.resolve("metals/steel"),
            Err(CodecError::UnknownMaterial(_))
        ));
        assert!(matches!(
            library.resolve("no-slash"),
            Err(CodecError::UnknownMaterial(_))
        ));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_library_file_round_trip() {
        let mut library = MaterialLibrary::new();
        library.insert("metals", "ti64", titanium());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materials.json");
        library.save_to_file(&path).unwrap();

        let loaded = MaterialLibrary::load_from_file(&path).unwrap();
        assert_eq!(loaded, library);
    }
}
