//! Helper filters and functions available to every template.
//!
//! All helpers are pure. Filters are used as `{{ value | filter }}`,
//! functions as `{{ function(args) }}`.

use std::collections::BTreeMap;
use std::fmt::Write;

use minijinja::value::ValueKind;
use minijinja::{escape_formatter, Environment, Error, ErrorKind, Output, State, Value};

use iacforge_model::ResourceType;

/// Registers the helper library with a MiniJinja environment.
pub fn register_functions(env: &mut Environment<'static>) {
    env.set_formatter(format_value);

    // Case conversion
    env.add_filter("snake_case", snake_case);
    env.add_filter("kebab_case", kebab_case);
    env.add_filter("pascal_case", pascal_case);
    env.add_filter("camel_case", camel_case);

    // Quoting
    env.add_filter("quote", quote);
    env.add_filter("squote", squote);

    // Map and slice utilities
    env.add_filter("keys", keys);
    env.add_filter("values", values);
    env.add_filter("merge", merge);
    env.add_filter("compact", compact);
    env.add_function("has_key", has_key);

    // Terraform
    env.add_filter("tf_name", tf_name);
    env.add_filter("tf_tags", tf_tags);
    env.add_filter("tf_list", tf_list);
    env.add_function("tf_ref", tf_ref);

    // Crossplane
    env.add_filter("xp_name", xp_name);
    env.add_filter("xp_labels", xp_labels);
}

/// Print booleans as the lowercase `true`/`false` literals HCL and YAML
/// expect. Everything else goes through the default formatter.
pub fn format_value(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), Error> {
    if value.kind() == ValueKind::Bool {
        return out
            .write_str(bool_literal(value))
            .map_err(|_| Error::new(ErrorKind::WriteFailure, "failed to write boolean"));
    }
    escape_formatter(out, state, value)
}

fn bool_literal(value: &Value) -> &'static str {
    if value.is_true() {
        "true"
    } else {
        "false"
    }
}

/// Convert string to snake_case.
pub fn snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' || c == '_' {
            if !result.ends_with('_') && !result.is_empty() {
                result.push('_');
            }
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    result
}

/// Convert string to kebab-case.
pub fn kebab_case(s: &str) -> String {
    snake_case(s).replace('_', "-")
}

/// Convert string to PascalCase.
pub fn pascal_case(s: &str) -> String {
    s.split(|c: char| c == '_' || c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

/// Convert string to camelCase.
pub fn camel_case(s: &str) -> String {
    let pascal = pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Double-quote a value. The result is a valid HCL and YAML string literal.
pub fn quote(value: Value) -> String {
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    serde_json::Value::String(text).to_string()
}

/// Single-quote a value YAML-style, doubling embedded single quotes.
pub fn squote(value: Value) -> String {
    let text = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    format!("'{}'", text.replace('\'', "''"))
}

/// Turn an arbitrary name into a valid HCL identifier.
pub fn tf_name(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if !ident.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        ident.insert(0, '_');
    }
    ident
}

/// Build a Terraform reference such as `aws_vpc.main.id`.
///
/// The type may be a Terraform type or a canonical resource type (`VPC`).
pub fn tf_ref(resource_type: &str, name: &str, attribute: &str) -> String {
    let tf_type = resource_type
        .parse::<ResourceType>()
        .map(|t| t.terraform_type().to_string())
        .unwrap_or_else(|_| resource_type.to_string());
    format!("{}.{}.{}", tf_type, tf_name(name), attribute)
}

/// Render a map as an HCL object literal sorted by key, aligned like
/// `terraform fmt`.
///
/// `indent` is the indentation of the line the literal starts on.
pub fn tf_tags(value: Value, indent: Option<usize>) -> Result<String, Error> {
    let mut entries = map_entries(&value)?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let indent = indent.unwrap_or(0);
    if entries.is_empty() {
        return Ok("{}".to_string());
    }

    let keys: Vec<String> = entries.iter().map(|(k, _)| hcl_key(k)).collect();
    let width = keys.iter().map(|k| k.len()).max().unwrap_or(0);
    let pad = " ".repeat(indent);

    let mut out = String::from("{\n");
    for (key, (_, val)) in keys.iter().zip(entries.iter()) {
        out.push_str(&format!(
            "{}  {:<width$} = {}\n",
            pad,
            key,
            hcl_literal(val),
            width = width
        ));
    }
    out.push_str(&pad);
    out.push('}');
    Ok(out)
}

/// Render a sequence as an HCL list literal.
pub fn tf_list(value: Value) -> Result<String, Error> {
    let items: Vec<String> = value.try_iter()?.map(|v| hcl_literal(&v)).collect();
    Ok(format!("[{}]", items.join(", ")))
}

/// Normalise a name into a Kubernetes object name.
pub fn xp_name(name: &str) -> String {
    let mut out = String::new();
    for c in kebab_case(name).chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

/// Render a map as indented YAML `key: "value"` lines, sorted by key.
pub fn xp_labels(value: Value, indent: Option<usize>) -> Result<String, Error> {
    let pad = " ".repeat(indent.unwrap_or(0));
    let mut entries = map_entries(&value)?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let lines: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}{}: {}", pad, k, quote(v)))
        .collect();
    Ok(lines.join("\n"))
}

/// Keys of a map, in map order.
pub fn keys(value: Value) -> Result<Value, Error> {
    let keys: Vec<Value> = map_entries(&value)?
        .into_iter()
        .map(|(k, _)| Value::from(k))
        .collect();
    Ok(Value::from(keys))
}

/// Values of a map, in key order.
pub fn values(value: Value) -> Result<Value, Error> {
    let values: Vec<Value> = map_entries(&value)?.into_iter().map(|(_, v)| v).collect();
    Ok(Value::from(values))
}

/// Merge two maps; keys of the right-hand map win.
pub fn merge(left: Value, right: Value) -> Result<Value, Error> {
    let mut merged: BTreeMap<String, Value> = BTreeMap::new();
    for (k, v) in map_entries(&left)?.into_iter().chain(map_entries(&right)?) {
        merged.insert(k, v);
    }
    Ok(Value::from_serialize(&merged))
}

/// Drop none, undefined and empty-string items from a sequence.
pub fn compact(value: Value) -> Result<Value, Error> {
    let items: Vec<Value> = value
        .try_iter()?
        .filter(|v| !(v.is_none() || v.is_undefined() || v.as_str() == Some("")))
        .collect();
    Ok(Value::from(items))
}

/// Whether a map contains the key.
pub fn has_key(value: Value, key: &str) -> Result<bool, Error> {
    if value.kind() != ValueKind::Map {
        return Ok(false);
    }
    Ok(!value.get_attr(key)?.is_undefined())
}

fn map_entries(value: &Value) -> Result<Vec<(String, Value)>, Error> {
    if value.is_undefined() || value.is_none() {
        return Ok(Vec::new());
    }
    if value.kind() != ValueKind::Map {
        return Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("expected a map, got {:?}", value.kind()),
        ));
    }

    let mut entries = Vec::new();
    for key in value.try_iter()? {
        let item = value.get_item(&key)?;
        let key = match key.as_str() {
            Some(s) => s.to_string(),
            None => key.to_string(),
        };
        entries.push((key, item));
    }
    Ok(entries)
}

fn hcl_key(key: &str) -> String {
    let bare = key.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        serde_json::Value::String(key.to_string()).to_string()
    }
}

fn hcl_literal(value: &Value) -> String {
    match value.kind() {
        ValueKind::Bool => bool_literal(value).to_string(),
        ValueKind::Number => value.to_string(),
        ValueKind::None | ValueKind::Undefined => "null".to_string(),
        _ => quote(value.clone()),
    }
}
