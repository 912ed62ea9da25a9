//! Mapping of resource types to template names.
//!
//! Selection tries, in order: a direct mapping for the resource type, the
//! format's fallback patterns in registration order (first match wins), and
//! finally the generic name `<ResourceType>.tmpl`.

use std::collections::HashMap;

use parking_lot::RwLock;
use regex::Regex;
use tracing::debug;

use iacforge_model::{Resource, ResourceType, TemplateFormat};

use crate::error::{TemplateError, TemplateResult};

/// Default fallback rule shared by the gateway kinds.
const GATEWAY_PATTERN: &str = "Gateway$";

/// Chooses which template renders a resource, and accepts overrides.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateSelector: Send + Sync {
    /// Template name for the resource in the given format.
    fn select_template(&self, format: TemplateFormat, resource: &Resource) -> TemplateResult<String>;

    /// Map a resource type directly to a template, replacing any previous mapping.
    fn register_template(&self, format: TemplateFormat, resource_type: ResourceType, name: &str);

    /// Add or update a fallback rule matched against the resource type string.
    fn register_pattern_template(
        &self,
        format: TemplateFormat,
        pattern: &str,
        name: &str,
    ) -> TemplateResult<()>;
}

/// Generic template name used when nothing else matches.
pub fn generic_template_name(resource_type: ResourceType) -> String {
    format!("{}.tmpl", resource_type.as_str())
}

/// Default template file for a resource type, if it has its own template.
fn default_template(resource_type: ResourceType) -> Option<&'static str> {
    match resource_type {
        ResourceType::Vpc => Some("vpc.tmpl"),
        ResourceType::Subnet => Some("subnet.tmpl"),
        ResourceType::RouteTable => Some("route_table.tmpl"),
        ResourceType::SecurityGroup => Some("security_group.tmpl"),
        ResourceType::Ec2Instance => Some("ec2_instance.tmpl"),
        ResourceType::S3Bucket => Some("s3_bucket.tmpl"),
        ResourceType::RdsInstance => Some("rds_instance.tmpl"),
        ResourceType::IamRole => Some("iam_role.tmpl"),
        ResourceType::LambdaFunction => Some("lambda_function.tmpl"),
        ResourceType::LoadBalancer => Some("load_balancer.tmpl"),
        ResourceType::InternetGateway | ResourceType::NatGateway => None,
    }
}

#[derive(Debug, Clone)]
struct PatternRule {
    pattern: String,
    regex: Regex,
    template: String,
}

#[derive(Debug, Default)]
struct FormatMappings {
    direct: HashMap<ResourceType, String>,
    patterns: Vec<PatternRule>,
}

/// Table-driven selector with direct mappings and ordered fallback patterns.
#[derive(Debug, Default)]
pub struct MappingSelector {
    tables: RwLock<HashMap<TemplateFormat, FormatMappings>>,
}

impl MappingSelector {
    /// Create a selector with no formats registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector preloaded with the catalog's default mappings.
    pub fn with_defaults() -> Self {
        let selector = Self::new();
        for format in TemplateFormat::all() {
            for resource_type in ResourceType::all() {
                if let Some(name) = default_template(resource_type) {
                    selector.register_template(format, resource_type, name);
                }
            }
            let regex = Regex::new(GATEWAY_PATTERN).expect("gateway pattern is a valid regex");
            selector.insert_pattern(format, GATEWAY_PATTERN, regex, "gateway.tmpl");
        }
        selector
    }

    /// Whether any mapping table exists for the format.
    pub fn has_format(&self, format: TemplateFormat) -> bool {
        self.tables.read().contains_key(&format)
    }

    fn insert_pattern(&self, format: TemplateFormat, pattern: &str, regex: Regex, name: &str) {
        let mut tables = self.tables.write();
        let table = tables.entry(format).or_default();
        match table.patterns.iter_mut().find(|r| r.pattern == pattern) {
            Some(rule) => rule.template = name.to_string(),
            None => table.patterns.push(PatternRule {
                pattern: pattern.to_string(),
                regex,
                template: name.to_string(),
            }),
        }
    }
}

impl TemplateSelector for MappingSelector {
    fn select_template(&self, format: TemplateFormat, resource: &Resource) -> TemplateResult<String> {
        let tables = self.tables.read();
        let table = tables
            .get(&format)
            .ok_or_else(|| TemplateError::UnsupportedFormat(format.to_string()))?;

        if let Some(name) = table.direct.get(&resource.resource_type) {
            debug!("Selected {} for {} by direct mapping", name, resource.name);
            return Ok(name.clone());
        }

        let type_name = resource.resource_type.as_str();
        if let Some(rule) = table.patterns.iter().find(|r| r.regex.is_match(type_name)) {
            debug!(
                "Selected {} for {} by pattern '{}'",
                rule.template, resource.name, rule.pattern
            );
            return Ok(rule.template.clone());
        }

        let name = generic_template_name(resource.resource_type);
        debug!("Selected generic {} for {}", name, resource.name);
        Ok(name)
    }

    fn register_template(&self, format: TemplateFormat, resource_type: ResourceType, name: &str) {
        self.tables
            .write()
            .entry(format)
            .or_default()
            .direct
            .insert(resource_type, name.to_string());
    }

    fn register_pattern_template(
        &self,
        format: TemplateFormat,
        pattern: &str,
        name: &str,
    ) -> TemplateResult<()> {
        let regex = Regex::new(pattern).map_err(|source| TemplateError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.insert_pattern(format, pattern, regex, name);
        Ok(())
    }
}
