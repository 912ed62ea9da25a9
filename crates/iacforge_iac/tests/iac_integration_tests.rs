//! Integration tests for validating rendered output.

use std::fs;
use std::sync::Arc;

use hcl::{Body, Expression};
use serde_json::json;
use tempfile::tempdir;

use iacforge_iac::{
    CanonicalFormatter, CheckStatus, IacValidator, TerraformRunner, ValidationLevel,
};
use iacforge_model::{Resource, ResourceType, TemplateFormat};
use iacforge_templates::{EngineConfig, MemorySource, TemplateManager, TemplateRenderer};
use iacforge_templates::{CacheConfig, MappingSelector, OutputFormatter};

fn validator() -> IacValidator {
    IacValidator::with_terraform_runner(
        TerraformRunner::new().with_binary("iacforge-no-such-terraform"),
    )
}

fn network() -> Vec<Resource> {
    vec![
        Resource::new(ResourceType::Vpc, "main-vpc").with_property("cidr_block", "10.0.0.0/16"),
        Resource::new(ResourceType::Subnet, "public-a")
            .with_property("vpc", "main-vpc")
            .with_property("cidr_block", "10.0.1.0/24"),
        Resource::new(ResourceType::InternetGateway, "igw").with_property("vpc", "main-vpc"),
        Resource::new(ResourceType::NatGateway, "nat").with_property("subnet", "public-a"),
        Resource::new(ResourceType::RouteTable, "private-rt")
            .with_property("vpc", "main-vpc")
            .with_property("routes", json!([{"nat_gateway": "nat"}]))
            .with_property("subnets", json!(["public-a"])),
        Resource::new(ResourceType::SecurityGroup, "db-sg")
            .with_property("vpc", "main-vpc")
            .with_property("ingress", json!([{"from_port": 5432}])),
        Resource::new(ResourceType::Ec2Instance, "bastion")
            .with_property("ami", "ami-0123456789abcdef0")
            .with_property("subnet", "public-a")
            .with_property("key_name", "ops"),
        Resource::new(ResourceType::S3Bucket, "Audit Logs"),
        Resource::new(ResourceType::RdsInstance, "orders-db")
            .with_property("allocated_storage", 50),
        Resource::new(ResourceType::IamRole, "worker")
            .with_property("policy_arns", json!(["arn:aws:iam::aws:policy/ReadOnlyAccess"])),
        Resource::new(ResourceType::LambdaFunction, "resizer")
            .with_property("role", "worker")
            .with_property("timeout", 30)
            .with_property("s3_bucket", "acme-artifacts")
            .with_property("env_vars", json!({"STAGE": "dev", "LOG_LEVEL": "info"})),
        Resource::new(ResourceType::LoadBalancer, "api-lb")
            .with_property("internal", true)
            .with_property("subnets", json!(["public-a"])),
    ]
}

#[test]
fn test_minimal_vpc_template_passes_basic_validation() {
    let manager = TemplateManager::new(
        Arc::new(MemorySource::new().with_template(
            "terraform/vpc.tmpl",
            r#"resource "aws_vpc" "{{Name}}" { cidr_block = "{{cidr_block}}" }"#,
        )),
        &CacheConfig::default(),
    );
    let renderer = TemplateRenderer::new(Arc::new(manager), Arc::new(MappingSelector::with_defaults()));
    let vpc = Resource::new(ResourceType::Vpc, "main-vpc").with_property("cidr_block", "10.0.0.0/16");

    let out = renderer.render_resource(TemplateFormat::Terraform, &vpc).unwrap();
    assert!(out.contains(r#"resource "aws_vpc" "main-vpc""#));
    assert!(out.contains("10.0.0.0/16"));

    let report = validator()
        .validate(TemplateFormat::Terraform, &out, ValidationLevel::Basic)
        .unwrap();
    assert!(report.fully_checked());
}

#[test]
fn test_embedded_catalog_output_passes_validation() {
    let renderer = EngineConfig::default().build_renderer().unwrap();
    renderer.set_global_context("region", "us-west-2");
    renderer.set_global_context("environment", "staging");

    for format in TemplateFormat::all() {
        let resources = network();
        for resource in &resources {
            let single = renderer.render_resource(format, resource).unwrap();
            let report = validator()
                .validate(format, &single, ValidationLevel::Basic)
                .unwrap();
            assert!(report.passed(), "{} {}:\n{}\n{}", format, resource.name, report, single);
        }

        let combined = renderer.render_resources(format, &resources).unwrap();
        let report = validator()
            .validate(format, &combined, ValidationLevel::Strict)
            .unwrap();
        assert!(report.passed(), "{}:\n{}\n{}", format, report, combined);
    }
}

/// Collect bare variable references anywhere in an HCL body.
fn collect_variables(body: &Body, found: &mut Vec<String>) {
    for attribute in body.attributes() {
        collect_expression_variables(&attribute.expr, found);
    }
    for block in body.blocks() {
        collect_variables(&block.body, found);
    }
}

fn collect_expression_variables(expr: &Expression, found: &mut Vec<String>) {
    match expr {
        Expression::Variable(variable) => found.push(variable.as_str().to_string()),
        Expression::Array(items) => {
            for item in items {
                collect_expression_variables(item, found);
            }
        }
        Expression::Object(object) => {
            for (_, value) in object.iter() {
                collect_expression_variables(value, found);
            }
        }
        Expression::FuncCall(call) => {
            for arg in &call.args {
                collect_expression_variables(arg, found);
            }
        }
        _ => {}
    }
}

#[test]
fn test_embedded_terraform_uses_literal_booleans() {
    let renderer = EngineConfig::default().build_renderer().unwrap();
    let mut resources = network();
    resources[0] = resources[0]
        .clone()
        .with_property("tags", json!({"Public": true, "Shared": false}));

    let out = renderer
        .render_resources(TemplateFormat::Terraform, &resources)
        .unwrap();
    let body = hcl::parse(&out).unwrap();

    let mut variables = Vec::new();
    collect_variables(&body, &mut variables);
    assert!(
        !variables.iter().any(|v| v == "True" || v == "False"),
        "bare boolean references {:?} in:\n{}",
        variables,
        out
    );
    assert!(out.contains("internal           = true"));
}

#[test]
fn test_crossplane_header_survives_canonical_formatting() {
    let renderer = EngineConfig::default().build_renderer().unwrap();
    renderer.set_global_context("project", "acme");

    let raw = renderer
        .render_resources(TemplateFormat::Crossplane, &network()[..1])
        .unwrap();
    let formatted = CanonicalFormatter::new().format(TemplateFormat::Crossplane, &raw);

    assert!(raw.starts_with("# Generated by iacforge\n"));
    assert!(formatted.starts_with("# Generated by iacforge\n# Resources: 1\n# Project: acme\n---\n"));
    assert!(formatted.contains("kind: VPC\n"));
}

#[test]
fn test_strict_terraform_without_tool_is_skipped_not_passed() {
    let renderer = EngineConfig::default().build_renderer().unwrap();
    let out = renderer
        .render_resources(TemplateFormat::Terraform, &network()[..1])
        .unwrap();

    let report = validator()
        .validate(TemplateFormat::Terraform, &out, ValidationLevel::Strict)
        .unwrap();
    assert!(report.passed());
    assert!(!report.fully_checked());
    assert!(report
        .checks
        .iter()
        .any(|c| c.name == "terraform" && c.status == CheckStatus::Skipped));
    assert!(report.formatted.is_some());
}

#[test]
fn test_canonical_output_written_to_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("out/vpc.tf");

    let renderer = EngineConfig::default()
        .build_renderer()
        .unwrap()
        .with_formatter(Arc::new(CanonicalFormatter::new()));
    renderer
        .render_resource_to_file(TemplateFormat::Terraform, &network()[0], &path)
        .unwrap();

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("resource \"aws_vpc\" \"main-vpc\""));
    let report = validator()
        .validate(TemplateFormat::Terraform, &written, ValidationLevel::Basic)
        .unwrap();
    assert!(report.fully_checked());
}

#[test]
fn test_crossplane_strict_catches_incomplete_manifest() {
    let manager = TemplateManager::new(
        Arc::new(MemorySource::new().with_template(
            "crossplane/vpc.tmpl",
            "apiVersion: ec2.aws.upbound.io/v1beta1\nkind: VPC\nmetadata:\n  name: {{ Name | xp_name }}",
        )),
        &CacheConfig::default(),
    );
    let renderer = TemplateRenderer::new(Arc::new(manager), Arc::new(MappingSelector::with_defaults()));
    let out = renderer
        .render_resource(TemplateFormat::Crossplane, &network()[0])
        .unwrap();

    let basic = validator()
        .validate(TemplateFormat::Crossplane, &out, ValidationLevel::Basic)
        .unwrap();
    assert!(basic.passed());

    let strict = validator()
        .validate(TemplateFormat::Crossplane, &out, ValidationLevel::Strict)
        .unwrap();
    assert!(!strict.passed());
    assert!(strict.into_result().is_err());
}
