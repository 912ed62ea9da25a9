//! Resource model reading utilities.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};
use crate::models::ResourceModel;

/// Reader for resource model documents.
pub struct ModelReader;

impl ModelReader {
    /// Read a model from a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> ModelResult<ResourceModel> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::NotFound(path.to_path_buf()));
        }

        debug!("Reading resource model from {:?}", path);
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(ModelError::UnsupportedExtension(path.to_path_buf())),
        }
    }

    pub fn from_yaml_str(content: &str) -> ModelResult<ResourceModel> {
        let model: ResourceModel = serde_yaml::from_str(content)?;
        Self::finish(model)
    }

    pub fn from_json_str(content: &str) -> ModelResult<ResourceModel> {
        let model: ResourceModel = serde_json::from_str(content)?;
        Self::finish(model)
    }

    fn finish(model: ResourceModel) -> ModelResult<ResourceModel> {
        model.ensure_unique_names()?;
        for problem in model.check_dependencies() {
            warn!("{}", problem);
        }
        debug!("Loaded {} resources", model.len());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceType;

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
resources:
  - type: VPC
    name: main-vpc
    properties:
      - name: cidr_block
        value: 10.0.0.0/16
  - type: aws_subnet
    name: public-a
    properties:
      - name: cidr_block
        value: 10.0.1.0/24
      - name: map_public_ip_on_launch
        value: true
    dependencies: [main-vpc]
"#;
        let model = ModelReader::from_yaml_str(yaml).unwrap();

        assert_eq!(model.len(), 2);
        assert_eq!(model.resources[1].resource_type, ResourceType::Subnet);
        assert!(model.resources[1].dependencies.contains("main-vpc"));
        assert_eq!(
            model.resources[1].property("map_public_ip_on_launch"),
            Some(&serde_json::Value::Bool(true))
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let yaml = "resources:\n  - type: Mainframe\n    name: big-iron\n";
        assert!(ModelReader::from_yaml_str(yaml).is_err());
    }
}
