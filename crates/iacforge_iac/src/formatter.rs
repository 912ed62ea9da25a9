//! Canonical formatting of rendered output.

use tracing::warn;

use iacforge_model::TemplateFormat;
use iacforge_templates::OutputFormatter;

use crate::error::{IacError, IacResult};
use crate::validator::parse_documents;

/// Re-emits Terraform through the HCL formatter and Crossplane documents
/// through the YAML serializer.
///
/// Comment lines leading a YAML document (such as the generated header) are
/// kept in place. Comments inside a document body are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalFormatter;

impl CanonicalFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Format `content`, failing if it cannot be parsed.
    pub fn try_format(&self, format: TemplateFormat, content: &str) -> IacResult<String> {
        match format {
            TemplateFormat::Terraform => {
                let body = hcl::parse(content)?;
                Ok(hcl::format::to_string(&body)?)
            }
            TemplateFormat::Crossplane => format_documents(content),
        }
    }
}

fn format_documents(content: &str) -> IacResult<String> {
    let mut out = String::new();
    for segment in split_documents(content) {
        for line in segment
            .iter()
            .take_while(|line| is_comment_or_blank(line))
            .filter(|line| !line.trim().is_empty())
        {
            out.push_str(line.trim_end());
            out.push('\n');
        }

        for document in parse_documents(&segment.join("\n"))? {
            let text =
                serde_yaml::to_string(&document).map_err(|e| IacError::Format(e.to_string()))?;
            out.push_str("---\n");
            out.push_str(&text);
        }
    }
    Ok(out)
}

/// Split a YAML stream into the lines of each document, at `---` markers.
fn split_documents(content: &str) -> Vec<Vec<&str>> {
    let mut segments = vec![Vec::new()];
    for line in content.lines() {
        if line.trim_end() == "---" {
            segments.push(Vec::new());
        } else if let Some(segment) = segments.last_mut() {
            segment.push(line);
        }
    }
    segments
}

fn is_comment_or_blank(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#')
}

impl OutputFormatter for CanonicalFormatter {
    fn format(&self, format: TemplateFormat, content: &str) -> String {
        match self.try_format(format, content) {
            Ok(formatted) => formatted,
            Err(e) => {
                warn!("Leaving {} output unformatted: {}", format, e);
                content.to_string()
            }
        }
    }
}
