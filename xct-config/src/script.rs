//! Standalone Python simulation script.
//!
//! The script embeds the GVXR export of a configuration and drives the
//! gVirtualXray runtime, optionally followed by a CIL reconstruction. Sections
//! the caller leaves out are rendered as empty text so the script stays valid.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{CodecError, Result};
use crate::formats::{render, GvxrConfig};
use crate::model::{ConfigFull, ExportOptions, MaterialLibrary, ReconstructionParams};

/// Existence check for sample model files.
pub trait ModelAssets {
    fn contains(&self, model_path: &str) -> bool;
}

/// Models stored under a directory on disk.
#[derive(Debug, Clone)]
pub struct ModelDirectory {
    root: PathBuf,
}

impl ModelDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModelAssets for ModelDirectory {
    fn contains(&self, model_path: &str) -> bool {
        self.root.join(model_path).is_file()
    }
}

impl ModelAssets for BTreeSet<String> {
    fn contains(&self, model_path: &str) -> bool {
        BTreeSet::contains(self, model_path)
    }
}

const TEMPLATE: &str = r#"#!/usr/bin/env python3
"""Simulated X-ray CT scan."""

import json
import os

from gvxrPython3 import gvxr
from gvxrPython3 import json2gvxr

CONFIG_PATH = "gvxr-config.json"
PROJECTION_FOLDER = {{PROJECTION_FOLDER}}
RECONSTRUCTION_FOLDER = {{RECONSTRUCTION_FOLDER}}

CONFIG = json.loads(r"""
{{CONFIG}}
""")


def load_config():
    with open(CONFIG_PATH, "w") as f:
        json.dump(CONFIG, f, indent=4)

    json2gvxr.initGVXR(CONFIG_PATH, "OPENGL")
    json2gvxr.initSourceGeometry()
    json2gvxr.initSpectrum(verbose=0)
    json2gvxr.initDetector()
    json2gvxr.initSamples(verbose=0)
{{SIMULATION}}{{RECONSTRUCTION}}

if __name__ == "__main__":
    load_config()
{{MAIN}}"#;

const SIMULATION: &str = r#"

def simulate():
    os.makedirs(PROJECTION_FOLDER, exist_ok=True)
    return json2gvxr.doCTScan()
"#;

const RECONSTRUCTION: &str = r#"

def reconstruct():
    from gvxrPython3.JSON2gVXRDataReader import JSON2gVXRDataReader
    from cil.io import TIFFWriter
    from cil.processors import TransmissionAbsorptionConverter

    data = JSON2gVXRDataReader(file_name=CONFIG_PATH, proj_path=PROJECTION_FOLDER).read()
    data = TransmissionAbsorptionConverter()(data)
    data.reorder(order="astra")
    ig = data.geometry.get_ImageGeometry()
{{METHOD}}
    os.makedirs(RECONSTRUCTION_FOLDER, exist_ok=True)
    TIFFWriter(data=recon, file_name=os.path.join(RECONSTRUCTION_FOLDER, "recon")).write()
"#;

/// Substitute every `{{NAME}}` in `template` in a single scan.
///
/// Substituted text is never rescanned, so values may contain placeholder
/// syntax. Unknown placeholders are kept as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after.find("}}").and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Python string literal for `text`; JSON string escaping is valid Python.
fn py_string(text: &str) -> Result<String> {
    Ok(serde_json::to_string(text)?)
}

/// Indented Python lines joined into a block
fn python_block(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body of `reconstruct()` that leaves the volume in `recon`.
fn method_block(recon: &ReconstructionParams) -> Result<String> {
    let operator = [
        "from cil.plugins.astra.operators import ProjectionOperator".to_string(),
        "A = ProjectionOperator(ig, data.geometry)".to_string(),
    ];
    let iterative = |name: &str, extra: String, iterations: u32| {
        let mut lines = operator.to_vec();
        lines.extend([
            format!("from cil.optimisation.algorithms import {name}"),
            format!("algo = {name}(initial=ig.allocate(0), operator=A, data=data{extra})"),
            format!("algo.run({iterations})"),
            "recon = algo.solution".to_string(),
        ]);
        lines
    };

    let lines = match recon {
        ReconstructionParams::Fdk { filter, .. } | ReconstructionParams::Fbp { filter, .. } => {
            let method = recon.method();
            let filter = py_string(&filter.replace('_', "-"))?;
            vec![
                format!("from cil.recon import {method}"),
                "data.reorder(order=\"tigre\")".to_string(),
                format!("fbp = {method}(data, ig)"),
                format!("fbp.set_filter({filter})"),
                "recon = fbp.run()".to_string(),
            ]
        }
        ReconstructionParams::Cgls {
            iterations,
            tolerance,
            ..
        } => iterative("CGLS", format!(", tolerance={tolerance}"), *iterations),
        ReconstructionParams::Sirt { iterations, .. } => {
            iterative("SIRT", String::new(), *iterations)
        }
        ReconstructionParams::Mlem { iterations, .. } => {
            let mut lines = operator.to_vec();
            lines.extend([
                "recon = ig.allocate(1.0)".to_string(),
                "sensitivity = A.adjoint(data.geometry.allocate(1.0))".to_string(),
                format!("for _ in range({iterations}):"),
                "    ratio = data / (A.direct(recon) + 1e-12)".to_string(),
                "    recon = recon * A.adjoint(ratio) / sensitivity".to_string(),
            ]);
            lines
        }
    };
    Ok(python_block(&lines))
}

/// Fail on the first sample whose model is not available.
pub fn check_assets(config: &ConfigFull, assets: &dyn ModelAssets) -> Result<()> {
    for sample in &config.samples {
        if !assets.contains(&sample.model_path) {
            return Err(CodecError::MissingModelReference {
                label: sample.label.clone(),
                model_path: sample.model_path.clone(),
            });
        }
        debug!("Found model {} for sample {}", sample.model_path, sample.label);
    }
    Ok(())
}

/// Compose the standalone script for `config`.
///
/// The embedded GVXR configuration always carries its scan plan; the
/// simulation and reconstruction functions are included per
/// `options.include_scan` and `options.include_reconstruction`.
pub fn generate_script(
    config: &ConfigFull,
    options: &ExportOptions,
    library: &MaterialLibrary,
    assets: &dyn ModelAssets,
) -> Result<String> {
    check_assets(config, assets)?;

    let gvxr_options = ExportOptions {
        include_scan: true,
        ..options.clone()
    };
    let gvxr_json = render::<GvxrConfig>(config, &gvxr_options, library)?;

    let simulation = if options.include_scan { SIMULATION } else { "" };
    let reconstruction = if options.include_reconstruction {
        fill_template(RECONSTRUCTION, &[("METHOD", method_block(&config.recon)?.as_str())])
    } else {
        String::new()
    };

    let mut main = String::new();
    if options.include_scan {
        main.push_str("    simulate()\n");
    }
    if options.include_reconstruction {
        main.push_str("    reconstruct()\n");
    }

    let projection_folder = py_string(&options.projection_folder)?;
    let reconstruction_folder = py_string(&options.reconstruction_folder)?;
    Ok(fill_template(
        TEMPLATE,
        &[
            ("PROJECTION_FOLDER", projection_folder.as_str()),
            ("RECONSTRUCTION_FOLDER", reconstruction_folder.as_str()),
            ("CONFIG", gvxr_json.as_str()),
            ("SIMULATION", simulation),
            ("RECONSTRUCTION", reconstruction.as_str()),
            ("MAIN", main.as_str()),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::{lab_config, titanium_library};

    fn assets() -> BTreeSet<String> {
        BTreeSet::from(["bolt.stl".to_string()])
    }

    fn lab_script(config: &ConfigFull, options: &ExportOptions) -> Result<String> {
        generate_script(config, options, &titanium_library(), &assets())
    }

    fn options(scan: bool, recon: bool) -> ExportOptions {
        ExportOptions {
            include_scan: scan,
            include_reconstruction: recon,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_model() {
        let err = generate_script(
            &lab_config(),
            &options(true, false),
            &titanium_library(),
            &BTreeSet::<String>::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingModelReference { ref model_path, .. } if model_path == "bolt.stl"
        ));
    }

    #[test]
    fn test_scan_only() {
        let script = lab_script(&lab_config(), &options(true, false)).unwrap();
        assert!(script.contains("def simulate():"));
        assert!(script.contains("    simulate()\n"));
        assert!(!script.contains("def reconstruct():"));
        assert!(!script.contains("{{"));
        assert!(script.contains("\"Scan\""));
    }

    #[test]
    fn test_embedded_config_always_has_scan_plan() {
        let script = lab_script(&lab_config(), &options(false, false)).unwrap();
        assert!(script.contains("\"NumberOfProjections\": 720"));
        assert!(!script.contains("def simulate():"));
        assert!(script.trim_end().ends_with("load_config()"));
    }

    #[test]
    fn test_reconstruction_method() {
        let mut config = lab_config();
        config.recon = ReconstructionParams::Sirt {
            quality: 1,
            iterations: 25,
        };
        let script = lab_script(&config, &options(true, true)).unwrap();
        assert!(script.contains("def reconstruct():"));
        assert!(script.contains("algo.run(25)"));
        assert!(script.contains("RECONSTRUCTION_FOLDER = \"reconstruction\""));
        assert!(script.contains("    reconstruct()\n"));
    }

    #[test]
    fn test_fill_template_single_pass() {
        let filled = fill_template(
            "a={{A}} b={{B}} c={{C}}",
            &[("A", "{{B}}"), ("B", "2")],
        );
        assert_eq!(filled, "a={{B}} b=2 c={{C}}");
        assert_eq!(fill_template("{{A", &[("A", "1")]), "{{A");
    }

    #[test]
    fn test_folders_are_escaped() {
        let options = ExportOptions {
            projection_folder: r#"C:\scans\new "run""#.to_string(),
            ..options(true, true)
        };
        let script = lab_script(&lab_config(), &options).unwrap();
        assert!(script.contains(r#"PROJECTION_FOLDER = "C:\\scans\\new \"run\"""#));
        assert!(script.contains("RECONSTRUCTION_FOLDER = \"reconstruction\"\n"));
        assert!(script.contains("fbp.set_filter(\"ram-lak\")"));
    }

    #[test]
    fn test_model_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bolt.stl"), b"solid bolt").unwrap();
        let models = ModelDirectory::new(dir.path());
        assert!(models.contains("bolt.stl"));
        assert!(!models.contains("nut.stl"));
        assert!(check_assets(&lab_config(), &models).is_ok());
    }
}
