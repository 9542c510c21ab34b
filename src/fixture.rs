//! JSON fixtures: host entities with their translation collections preloaded.
//!
//! ```json
//! [
//!   {
//!     "class": "Post",
//!     "attributes": { "id": 1 },
//!     "translatable": ["title"],
//!     "relations": { "translations": [{ "language": "en", "title": "Hello" }] }
//!   }
//! ]
//! ```

use crate::model::DynamicModel;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Load every entity from a fixture file.
pub fn load_models(path: impl AsRef<Path>) -> Result<Vec<DynamicModel>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;

    let models = parse_models(&content)
        .with_context(|| format!("Failed to parse fixture {}", path.display()))?;

    info!("Loaded {} models from {}", models.len(), path.display());
    Ok(models)
}

/// Parse entities from fixture JSON.
pub fn parse_models(content: &str) -> Result<Vec<DynamicModel>> {
    serde_json::from_str(content).context("Fixture must be a JSON array of models")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translatable::Translatable;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_models() {
        let models = parse_models(
            r#"[{
                "class": "Post",
                "attributes": { "id": 1 },
                "translatable": ["title"],
                "relations": { "translations": [{ "language": "en", "title": "Hello" }] }
            }]"#,
        )
        .unwrap();

        assert_eq!(models.len(), 1);
        assert!(models[0].is_translatable_attribute("title"));
    }

    #[test]
    fn test_parse_rejects_objects() {
        let result = parse_models(r#"{ "class": "Post" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_models_from_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, r#"[{{ "class": "Post" }}, {{ "class": "Page" }}]"#).unwrap();

        let models = load_models(file.path()).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].class_basename(), "Page");
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let error = load_models("/non/existent/fixture.json").unwrap_err();
        assert!(error.to_string().contains("/non/existent/fixture.json"));
    }
}
