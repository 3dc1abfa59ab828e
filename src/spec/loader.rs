use crate::error::OpenApiError;
use openapiv3::OpenAPI;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Loads an OpenAPI specification from a YAML or JSON file
pub fn load_openapi_spec(path: &Path) -> Result<OpenAPI, OpenApiError> {
    let file = File::open(path).map_err(|e| {
        OpenApiError::SpecLoad(format!("Failed to open spec file {}: {}", path.display(), e))
    })?;

    serde_yaml::from_reader(BufReader::new(file))
        .map_err(|e| OpenApiError::SpecLoad(format!("Failed to parse OpenAPI spec: {}", e)))
}

/// Parses an OpenAPI specification from YAML or JSON text
pub fn parse_openapi_spec(text: &str) -> Result<OpenAPI, OpenApiError> {
    serde_yaml::from_str(text)
        .map_err(|e| OpenApiError::SpecLoad(format!("Failed to parse OpenAPI spec: {}", e)))
}

/// Converts an in-memory JSON document into an OpenAPI specification
pub fn openapi_from_value(document: Value) -> Result<OpenAPI, OpenApiError> {
    serde_json::from_value(document)
        .map_err(|e| OpenApiError::SpecLoad(format!("Failed to parse OpenAPI spec: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
openapi: 3.0.0
info:
  title: Simple Example
  version: 1.0.0
paths:
  /:
    get:
      responses:
        "200":
          description: Index
"#;

    #[test]
    fn parses_yaml_text() {
        let spec = parse_openapi_spec(YAML).unwrap();
        assert_eq!(spec.info.title, "Simple Example");
        assert!(spec.paths.paths.contains_key("/"));
    }

    #[test]
    fn parses_json_value() {
        let spec = openapi_from_value(serde_json::json!({
            "openapi": "3.0.0",
            "info": {"title": "Json", "version": "0.1"},
            "paths": {}
        }))
        .unwrap();
        assert_eq!(spec.info.version, "0.1");
    }

    #[test]
    fn loads_from_file() {
        let path = std::env::temp_dir().join(format!("openapi-guard-{}.yaml", std::process::id()));
        File::create(&path).unwrap().write_all(YAML.as_bytes()).unwrap();

        let spec = load_openapi_spec(&path).unwrap();
        assert_eq!(spec.info.title, "Simple Example");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let result = load_openapi_spec(Path::new("/nonexistent/openapi.yaml"));
        assert!(matches!(result, Err(OpenApiError::SpecLoad(_))));
    }

    #[test]
    fn invalid_document_is_a_load_error() {
        assert!(matches!(
            parse_openapi_spec("openapi: [not, a, spec"),
            Err(OpenApiError::SpecLoad(_))
        ));
    }
}
