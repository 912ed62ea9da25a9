//! Resource rendering.
//!
//! The renderer ties selection, loading and execution together. Every render
//! works on its own copy of the global context, so concurrent renders never
//! observe each other's resource binding.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use minijinja::Value;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use iacforge_model::{Resource, ResourceType, TemplateFormat};

use crate::error::{TemplateError, TemplateResult};
use crate::manager::TemplateManager;
use crate::output::{FsWriter, OutputFormatter, OutputWriter, PassthroughFormatter};
use crate::selector::TemplateSelector;

/// Appended after every section of a multi-resource render.
pub const SECTION_SEPARATOR: &str = "\n";

/// Name of the optional per-format header template.
pub fn header_template_name(format: TemplateFormat) -> String {
    format!("{}_header.tmpl", format.as_str())
}

/// Name of the optional per-format footer template.
pub fn footer_template_name(format: TemplateFormat) -> String {
    format!("{}_footer.tmpl", format.as_str())
}

/// Data visible to one template execution.
///
/// Global context entries come first, resource properties shadow them, and
/// the reserved bindings (`Resource`, `Name`, `Type`, ...) shadow both.
struct RenderScope<'a> {
    globals: HashMap<String, serde_json::Value>,
    resource: Option<&'a Resource>,
    resources: &'a [Resource],
}

impl<'a> RenderScope<'a> {
    fn for_resource(globals: HashMap<String, serde_json::Value>, resource: &'a Resource) -> Self {
        Self {
            globals,
            resource: Some(resource),
            resources: &[],
        }
    }

    fn for_collection(globals: HashMap<String, serde_json::Value>, resources: &'a [Resource]) -> Self {
        Self {
            globals,
            resource: None,
            resources,
        }
    }

    fn into_value(self) -> Value {
        let mut scope: BTreeMap<String, Value> = self
            .globals
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_serialize(v)))
            .collect();

        if let Some(resource) = self.resource {
            let mut properties = BTreeMap::new();
            for property in &resource.properties {
                let value = Value::from_serialize(&property.value);
                scope.insert(property.name.clone(), value.clone());
                properties.insert(property.name.clone(), value);
            }
            scope.insert("Properties".into(), Value::from_serialize(&properties));
            scope.insert("Name".into(), Value::from(resource.name.clone()));
            scope.insert("Type".into(), Value::from(resource.resource_type.as_str()));
            scope.insert(
                "TerraformType".into(),
                Value::from(resource.resource_type.terraform_type()),
            );
            scope.insert(
                "Dependencies".into(),
                Value::from_serialize(&resource.dependencies),
            );
            scope.insert("Resource".into(), Value::from_serialize(resource));
        } else {
            scope.insert("Resources".into(), Value::from_serialize(self.resources));
        }

        Value::from_serialize(&scope)
    }
}

/// Renders resources into Infrastructure-as-Code text.
pub struct TemplateRenderer {
    manager: Arc<TemplateManager>,
    selector: Arc<dyn TemplateSelector>,
    global_context: RwLock<HashMap<String, serde_json::Value>>,
    formatter: Arc<dyn OutputFormatter>,
    writer: Arc<dyn OutputWriter>,
}

impl TemplateRenderer {
    pub fn new(manager: Arc<TemplateManager>, selector: Arc<dyn TemplateSelector>) -> Self {
        Self {
            manager,
            selector,
            global_context: RwLock::new(HashMap::new()),
            formatter: Arc::new(PassthroughFormatter),
            writer: Arc::new(FsWriter),
        }
    }

    /// Use a formatter for file output.
    pub fn with_formatter(mut self, formatter: Arc<dyn OutputFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Use a writer for file output.
    pub fn with_writer(mut self, writer: Arc<dyn OutputWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn manager(&self) -> &Arc<TemplateManager> {
        &self.manager
    }

    pub fn selector(&self) -> &Arc<dyn TemplateSelector> {
        &self.selector
    }

    /// Set a value visible to every subsequent render.
    pub fn set_global_context(&self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.global_context.write().insert(key.into(), value.into());
    }

    /// Copy of the current global context.
    pub fn global_context(&self) -> HashMap<String, serde_json::Value> {
        self.global_context.read().clone()
    }

    pub fn register_template(&self, format: TemplateFormat, resource_type: ResourceType, name: &str) {
        self.selector.register_template(format, resource_type, name);
    }

    pub fn register_pattern_template(
        &self,
        format: TemplateFormat,
        pattern: &str,
        name: &str,
    ) -> TemplateResult<()> {
        self.selector.register_pattern_template(format, pattern, name)
    }

    /// Render one resource with the template selected for it.
    pub fn render_resource(&self, format: TemplateFormat, resource: &Resource) -> TemplateResult<String> {
        let name = self.selector.select_template(format, resource)?;
        let template = self.manager.get_template(format, &name)?;

        debug!("Rendering {} with {}/{}", resource.name, format, name);
        let scope = RenderScope::for_resource(self.global_context(), resource);
        template.render(scope.into_value())
    }

    /// Render resources in order, wrapped by the optional header and footer.
    ///
    /// Any resource failure aborts the whole render. A missing or failing
    /// header or footer contributes nothing.
    pub fn render_resources(
        &self,
        format: TemplateFormat,
        resources: &[Resource],
    ) -> TemplateResult<String> {
        let mut output = String::new();

        if let Some(header) = self.render_optional(format, &header_template_name(format), resources) {
            output.push_str(&header);
            output.push_str(SECTION_SEPARATOR);
        }

        for resource in resources {
            output.push_str(&self.render_resource(format, resource)?);
            output.push_str(SECTION_SEPARATOR);
        }

        if let Some(footer) = self.render_optional(format, &footer_template_name(format), resources) {
            output.push_str(&footer);
            output.push_str(SECTION_SEPARATOR);
        }

        info!("Rendered {} resources as {}", resources.len(), format);
        Ok(output)
    }

    /// Render, format and write one resource.
    pub fn render_resource_to_file(
        &self,
        format: TemplateFormat,
        resource: &Resource,
        path: &Path,
    ) -> TemplateResult<()> {
        let rendered = self.render_resource(format, resource)?;
        let formatted = self.formatter.format(format, &rendered);

        self.writer
            .write(path, formatted.as_bytes())
            .map_err(|source| TemplateError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Wrote {} to {:?}", resource.name, path);
        Ok(())
    }

    /// Dry-run a render, discarding the output.
    pub fn validate_template(&self, format: TemplateFormat, resource: &Resource) -> TemplateResult<()> {
        self.render_resource(format, resource).map(|_| ())
    }

    fn render_optional(
        &self,
        format: TemplateFormat,
        name: &str,
        resources: &[Resource],
    ) -> Option<String> {
        let template = match self.manager.get_template(format, name) {
            Ok(template) => template,
            Err(e) if e.is_not_found() => {
                debug!("No {} template for {}", name, format);
                return None;
            }
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                return None;
            }
        };

        let scope = RenderScope::for_collection(self.global_context(), resources);
        match template.render(scope.into_value()) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::output::MockOutputWriter;
    use crate::selector::MockTemplateSelector;
    use crate::source::MemorySource;
    use std::io;
    use std::path::PathBuf;

    fn renderer(source: MemorySource, selector: MockTemplateSelector) -> TemplateRenderer {
        let manager = TemplateManager::new(Arc::new(source), &CacheConfig::default());
        TemplateRenderer::new(Arc::new(manager), Arc::new(selector))
    }

    fn vpc() -> Resource {
        Resource::new(ResourceType::Vpc, "main-vpc").with_property("cidr_block", "10.0.0.0/16")
    }

    #[test]
    fn test_render_uses_selected_template() {
        let mut selector = MockTemplateSelector::new();
        selector
            .expect_select_template()
            .times(1)
            .returning(|_, _| Ok("net.tmpl".to_string()));

        let renderer = renderer(
            MemorySource::new().with_template("terraform/net.tmpl", "{{ Type }}:{{ Name }}:{{ cidr_block }}"),
            selector,
        );

        let out = renderer.render_resource(TemplateFormat::Terraform, &vpc()).unwrap();
        assert_eq!(out, "VPC:main-vpc:10.0.0.0/16");
    }

    #[test]
    fn test_selection_error_is_returned_unchanged() {
        let mut selector = MockTemplateSelector::new();
        selector
            .expect_select_template()
            .returning(|format, _| Err(TemplateError::UnsupportedFormat(format.to_string())));

        let renderer = renderer(MemorySource::new(), selector);
        let err = renderer
            .render_resource(TemplateFormat::Crossplane, &vpc())
            .unwrap_err();

        assert!(matches!(err, TemplateError::UnsupportedFormat(f) if f == "crossplane"));
    }

    #[test]
    fn test_registration_delegates_to_selector() {
        let mut selector = MockTemplateSelector::new();
        selector
            .expect_register_template()
            .withf(|format, resource_type, name| {
                *format == TemplateFormat::Terraform
                    && *resource_type == ResourceType::S3Bucket
                    && name == "bucket.tmpl"
            })
            .times(1)
            .return_const(());
        selector
            .expect_register_pattern_template()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let renderer = renderer(MemorySource::new(), selector);
        renderer.register_template(TemplateFormat::Terraform, ResourceType::S3Bucket, "bucket.tmpl");
        renderer
            .register_pattern_template(TemplateFormat::Terraform, "Bucket$", "bucket.tmpl")
            .unwrap();
    }

    #[test]
    fn test_write_failure_names_destination() {
        let mut selector = MockTemplateSelector::new();
        selector
            .expect_select_template()
            .returning(|_, _| Ok("vpc.tmpl".to_string()));

        let mut writer = MockOutputWriter::new();
        writer
            .expect_write()
            .times(1)
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only")));

        let renderer = renderer(
            MemorySource::new().with_template("terraform/vpc.tmpl", "vpc {{ Name }}"),
            selector,
        )
        .with_writer(Arc::new(writer));

        let path = PathBuf::from("/readonly/main.tf");
        let err = renderer
            .render_resource_to_file(TemplateFormat::Terraform, &vpc(), &path)
            .unwrap_err();

        assert!(matches!(&err, TemplateError::Write { path: p, .. } if p == &path));
        assert!(err.to_string().contains("/readonly/main.tf"));
    }

    #[test]
    fn test_file_output_is_formatted() {
        struct Upper;
        impl OutputFormatter for Upper {
            fn format(&self, _format: TemplateFormat, content: &str) -> String {
                content.to_uppercase()
            }
        }

        let mut selector = MockTemplateSelector::new();
        selector
            .expect_select_template()
            .returning(|_, _| Ok("vpc.tmpl".to_string()));

        let mut writer = MockOutputWriter::new();
        writer
            .expect_write()
            .withf(|_, content| content == b"VPC MAIN-VPC".as_slice())
            .times(1)
            .returning(|_, _| Ok(()));

        let renderer = renderer(
            MemorySource::new().with_template("terraform/vpc.tmpl", "vpc {{ Name }}"),
            selector,
        )
        .with_formatter(Arc::new(Upper))
        .with_writer(Arc::new(writer));

        renderer
            .render_resource_to_file(TemplateFormat::Terraform, &vpc(), Path::new("out.tf"))
            .unwrap();
    }

    #[test]
    fn test_properties_shadow_globals_and_reserved_names_shadow_properties() {
        let mut selector = MockTemplateSelector::new();
        selector
            .expect_select_template()
            .returning(|_, _| Ok("t.tmpl".to_string()));

        let renderer = renderer(
            MemorySource::new().with_template(
                "terraform/t.tmpl",
                "{{ region }}|{{ cidr_block }}|{{ Name }}|{{ Properties.Name }}",
            ),
            selector,
        );
        renderer.set_global_context("region", "eu-west-1");
        renderer.set_global_context("cidr_block", "global");

        let resource = vpc().with_property("Name", "shadowed");
        let out = renderer.render_resource(TemplateFormat::Terraform, &resource).unwrap();

        assert_eq!(out, "eu-west-1|10.0.0.0/16|main-vpc|shadowed");
    }
}
