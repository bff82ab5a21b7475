//! Model configuration

use serde::{Deserialize, Serialize};
use vtrie::PathArity;

use crate::error::{unsupported_arity, unsupported_hash_size, Error, Result};

/// Supported digest widths in bytes
pub const HASH_SIZES: [usize; 2] = [20, 32];

/// Configuration of a BLAKE3 commitment model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blake3Config {
    /// Alphabet size keys are unpacked into: 2, 4, 16 or 256
    pub arity: usize,
    /// Digest width in bytes, also the longest value stored verbatim
    pub hash_size: usize,
}

impl Default for Blake3Config {
    fn default() -> Self {
        Self {
            arity: 256,
            hash_size: 32,
        }
    }
}

impl Blake3Config {
    /// 20-byte digests
    pub fn blake3_20(arity: PathArity) -> Self {
        Self {
            arity: arity.size(),
            hash_size: 20,
        }
    }

    /// 32-byte digests
    pub fn blake3_32(arity: PathArity) -> Self {
        Self {
            arity: arity.size(),
            hash_size: 32,
        }
    }

    /// Parse from JSON, e.g. `{"arity": 16, "hash_size": 20}`
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            Error::config_invalid(format!("cannot parse model config: {}", e))
                .with_operation("blake3_config::from_json")
                .set_source(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            Error::unexpected(format!("cannot serialize model config: {}", e))
                .with_operation("blake3_config::to_json")
                .set_source(e)
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.path_arity()?;
        if !HASH_SIZES.contains(&self.hash_size) {
            return Err(unsupported_hash_size(self.hash_size));
        }
        Ok(())
    }

    pub fn path_arity(&self) -> Result<PathArity> {
        PathArity::from_size(self.arity).map_err(|_| unsupported_arity(self.arity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtrie::ErrorKind;

    #[test]
    fn test_default() {
        let config = Blake3Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.path_arity().unwrap(), PathArity::Arity256);
    }

    #[test]
    fn test_named_constructors() {
        let config = Blake3Config::blake3_20(PathArity::Arity16);
        assert_eq!(config.arity, 16);
        assert_eq!(config.hash_size, 20);
        assert_eq!(Blake3Config::blake3_32(PathArity::Arity2).hash_size, 32);
    }

    #[test]
    fn test_from_json() {
        let config = Blake3Config::from_json(r#"{"arity": 4, "hash_size": 20}"#).unwrap();
        assert_eq!(config, Blake3Config::blake3_20(PathArity::Arity4));
        assert_eq!(Blake3Config::from_json(&config.to_json().unwrap()).unwrap(), config);
    }

    #[test]
    fn test_invalid() {
        let err = Blake3Config::from_json(r#"{"arity": 8, "hash_size": 32}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Blake3Config::from_json(r#"{"arity": 16, "hash_size": 64}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Blake3Config::from_json("not json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.source_ref().is_some());
    }
}
