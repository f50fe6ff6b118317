//! Reconstruction method selection.

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Reconstruction algorithm and its parameters, discriminated by `method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ReconstructionParams {
    /// Feldkamp-Davis-Kress cone-beam filtered backprojection
    #[serde(rename = "FDK")]
    Fdk { quality: u8, filter: String },
    /// Parallel-beam filtered backprojection
    #[serde(rename = "FBP")]
    Fbp { quality: u8, filter: String },
    /// Conjugate gradient least squares
    #[serde(rename = "CGLS")]
    Cgls {
        quality: u8,
        iterations: u32,
        tolerance: f64,
    },
    #[serde(rename = "SIRT")]
    Sirt { quality: u8, iterations: u32 },
    #[serde(rename = "MLEM")]
    Mlem { quality: u8, iterations: u32 },
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self::Fdk {
            quality: 1,
            filter: "ram_lak".to_string(),
        }
    }
}

impl ReconstructionParams {
    pub fn method(&self) -> &'static str {
        match self {
            ReconstructionParams::Fdk { .. } => "FDK",
            ReconstructionParams::Fbp { .. } => "FBP",
            ReconstructionParams::Cgls { .. } => "CGLS",
            ReconstructionParams::Sirt { .. } => "SIRT",
            ReconstructionParams::Mlem { .. } => "MLEM",
        }
    }

    /// Quality level, 0 (preview) to 3 (full resolution)
    pub fn quality(&self) -> u8 {
        match self {
            ReconstructionParams::Fdk { quality, .. }
            | ReconstructionParams::Fbp { quality, .. }
            | ReconstructionParams::Cgls { quality, .. }
            | ReconstructionParams::Sirt { quality, .. }
            | ReconstructionParams::Mlem { quality, .. } => *quality,
        }
    }

    /// Iteration count for iterative methods
    pub fn iterations(&self) -> Option<u32> {
        match self {
            ReconstructionParams::Cgls { iterations, .. }
            | ReconstructionParams::Sirt { iterations, .. }
            | ReconstructionParams::Mlem { iterations, .. } => Some(*iterations),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.quality() > 3 {
            return Err(CodecError::invalid(
                "recon.quality",
                format!("{} is outside 0..=3", self.quality()),
            ));
        }
        if self.iterations() == Some(0) {
            return Err(CodecError::invalid("recon.iterations", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tag() {
        let json = r#"{"method":"CGLS","quality":2,"iterations":20,"tolerance":1e-6}"#;
        let params: ReconstructionParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.method(), "CGLS");
        assert_eq!(params.quality(), 2);
        assert_eq!(params.iterations(), Some(20));

        let fdk = serde_json::to_value(ReconstructionParams::default()).unwrap();
        assert_eq!(fdk["method"], "FDK");
        assert_eq!(fdk["filter"], "ram_lak");
    }

    #[test]
    fn test_validate() {
        assert!(ReconstructionParams::default().validate().is_ok());
        assert!(ReconstructionParams::Sirt {
            quality: 4,
            iterations: 10
        }
        .validate()
        .is_err());
        assert!(ReconstructionParams::Mlem {
            quality: 1,
            iterations: 0
        }
        .validate()
        .is_err());
    }
}
