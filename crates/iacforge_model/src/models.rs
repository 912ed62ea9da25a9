//! Data models for infrastructure resources.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Supported AWS resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceType {
    Vpc,
    Subnet,
    InternetGateway,
    NatGateway,
    RouteTable,
    SecurityGroup,
    Ec2Instance,
    S3Bucket,
    RdsInstance,
    IamRole,
    LambdaFunction,
    LoadBalancer,
}

impl ResourceType {
    /// Canonical type string, used for selection and generic template names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Vpc => "VPC",
            ResourceType::Subnet => "Subnet",
            ResourceType::InternetGateway => "InternetGateway",
            ResourceType::NatGateway => "NATGateway",
            ResourceType::RouteTable => "RouteTable",
            ResourceType::SecurityGroup => "SecurityGroup",
            ResourceType::Ec2Instance => "EC2Instance",
            ResourceType::S3Bucket => "S3Bucket",
            ResourceType::RdsInstance => "RDSInstance",
            ResourceType::IamRole => "IAMRole",
            ResourceType::LambdaFunction => "LambdaFunction",
            ResourceType::LoadBalancer => "LoadBalancer",
        }
    }

    /// Terraform AWS provider resource type.
    pub fn terraform_type(&self) -> &'static str {
        match self {
            ResourceType::Vpc => "aws_vpc",
            ResourceType::Subnet => "aws_subnet",
            ResourceType::InternetGateway => "aws_internet_gateway",
            ResourceType::NatGateway => "aws_nat_gateway",
            ResourceType::RouteTable => "aws_route_table",
            ResourceType::SecurityGroup => "aws_security_group",
            ResourceType::Ec2Instance => "aws_instance",
            ResourceType::S3Bucket => "aws_s3_bucket",
            ResourceType::RdsInstance => "aws_db_instance",
            ResourceType::IamRole => "aws_iam_role",
            ResourceType::LambdaFunction => "aws_lambda_function",
            ResourceType::LoadBalancer => "aws_lb",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            ResourceType::Vpc,
            ResourceType::Subnet,
            ResourceType::InternetGateway,
            ResourceType::NatGateway,
            ResourceType::RouteTable,
            ResourceType::SecurityGroup,
            ResourceType::Ec2Instance,
            ResourceType::S3Bucket,
            ResourceType::RdsInstance,
            ResourceType::IamRole,
            ResourceType::LambdaFunction,
            ResourceType::LoadBalancer,
        ]
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = ModelError;

    /// Accepts canonical names case-insensitively as well as Terraform aliases.
    fn from_str(s: &str) -> ModelResult<Self> {
        let needle = s.trim();
        Self::all()
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle) || t.terraform_type() == needle)
            .ok_or_else(|| ModelError::UnknownResourceType(s.to_string()))
    }
}

impl TryFrom<String> for ResourceType {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        value.parse()
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.as_str().to_string()
    }
}

/// A single named property of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: serde_json::Value,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An infrastructure resource to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Names of resources this one depends on.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl Resource {
    pub fn new(resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            resource_type,
            name: name.into(),
            properties: Vec::new(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Add or replace a property, keeping the original position on replace.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        let property = Property::new(name, value);
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.value = property.value,
            None => self.properties.push(property),
        }
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.dependencies.insert(name.into());
        self
    }

    /// Look up a property value by name.
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// An ordered collection of resources describing one piece of infrastructure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel {
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl ResourceModel {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Fail on the first resource name that appears twice.
    pub fn ensure_unique_names(&self) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.name.as_str()) {
                return Err(ModelError::DuplicateResource(resource.name.clone()));
            }
        }
        Ok(())
    }

    /// Describe every dependency that points at a resource not in the model.
    pub fn check_dependencies(&self) -> Vec<String> {
        let names: HashSet<_> = self.resources.iter().map(|r| r.name.as_str()).collect();
        let mut problems = Vec::new();

        for resource in &self.resources {
            for dep in &resource.dependencies {
                if !names.contains(dep.as_str()) {
                    problems.push(format!(
                        "Resource '{}' depends on unknown resource '{}'",
                        resource.name, dep
                    ));
                }
            }
        }

        problems
    }
}

/// Output formats the engine can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    Terraform,
    Crossplane,
}

impl TemplateFormat {
    /// Catalog namespace for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateFormat::Terraform => "terraform",
            TemplateFormat::Crossplane => "crossplane",
        }
    }

    /// Extension of generated output files.
    pub fn file_extension(&self) -> &'static str {
        match self {
            TemplateFormat::Terraform => "tf",
            TemplateFormat::Crossplane => "yaml",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![TemplateFormat::Terraform, TemplateFormat::Crossplane]
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "terraform" | "tf" | "hcl" => Ok(TemplateFormat::Terraform),
            "crossplane" | "xp" | "yaml" => Ok(TemplateFormat::Crossplane),
            _ => Err(ModelError::UnsupportedFormat(s.to_string())),
        }
    }
}
