//! Parser configuration

use serde::{Deserialize, Serialize};

/// Options controlling grammar leniency and self-checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserConfig {
    /// Accept the SGML omission markers `-` and `O` where an element
    /// content spec must start
    pub sgml_content_spec: bool,

    /// Report "whitespace expected" between attributes written back to back
    pub check_attribute_whitespace: bool,

    /// Re-check losslessness after every parse and fail with an invariant
    /// violation if it does not hold
    pub verify_lossless: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            sgml_content_spec: true,
            check_attribute_whitespace: true,
            verify_lossless: false,
        }
    }
}

impl ParserConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert!(config.sgml_content_spec);
        assert!(config.check_attribute_whitespace);
        assert!(!config.verify_lossless);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ParserConfig::from_toml_str("verifyLossless = true").unwrap();
        assert!(config.verify_lossless);
        assert!(config.sgml_content_spec);
    }

    #[test]
    fn test_empty_toml() {
        assert_eq!(ParserConfig::from_toml_str("").unwrap(), ParserConfig::default());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(ParserConfig::from_toml_str("sgmlContentSpec = \"yes\"").is_err());
    }
}
