//! Template catalog sources.
//!
//! A catalog is a read-only tree of template bodies laid out as
//! `<format>/<name>` with shared partials under `<format>/_common/`. Paths are
//! always `/`-separated and relative to the catalog root.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use include_dir::{include_dir, Dir};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};

static EMBEDDED_CATALOG: Dir = include_dir!("$CARGO_MANIFEST_DIR/templates");

/// A read-only store of named template bodies.
pub trait TemplateSource: Send + Sync {
    /// Read the body stored at `path`.
    fn read(&self, path: &str) -> TemplateResult<String>;

    /// List every file beneath `dir`, recursively, in lexicographic order.
    ///
    /// A directory that does not exist is reported as `NotFound`.
    fn list(&self, dir: &str) -> TemplateResult<Vec<String>>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// The default catalog compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedSource;

impl EmbeddedSource {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateSource for EmbeddedSource {
    fn read(&self, path: &str) -> TemplateResult<String> {
        EMBEDDED_CATALOG
            .get_file(path)
            .and_then(|f| f.contents_utf8())
            .map(str::to_string)
            .ok_or_else(|| TemplateError::NotFound(path.to_string()))
    }

    fn list(&self, dir: &str) -> TemplateResult<Vec<String>> {
        let root = EMBEDDED_CATALOG
            .get_dir(dir.trim_end_matches('/'))
            .ok_or_else(|| TemplateError::NotFound(dir.to_string()))?;

        let mut paths = Vec::new();
        collect_embedded(root, &mut paths);
        paths.sort();
        Ok(paths)
    }

    fn describe(&self) -> String {
        "embedded catalog".to_string()
    }
}

fn collect_embedded(dir: &Dir<'static>, paths: &mut Vec<String>) {
    for file in dir.files() {
        paths.push(slash_path(file.path()));
    }
    for child in dir.dirs() {
        collect_embedded(child, paths);
    }
}

/// A catalog read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateSource for DirectorySource {
    fn read(&self, path: &str) -> TemplateResult<String> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(TemplateError::NotFound(full.display().to_string()));
        }
        debug!("Reading template body from {:?}", full);
        Ok(fs::read_to_string(full)?)
    }

    fn list(&self, dir: &str) -> TemplateResult<Vec<String>> {
        let base = self.root.join(dir);
        if !base.is_dir() {
            return Err(TemplateError::NotFound(base.display().to_string()));
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(&self.root) {
                paths.push(slash_path(relative));
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// An in-memory catalog, mainly for tests and programmatic catalogs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(path, body);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(path.into(), body.into());
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateSource for MemorySource {
    fn read(&self, path: &str) -> TemplateResult<String> {
        self.templates
            .get(path)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(path.to_string()))
    }

    fn list(&self, dir: &str) -> TemplateResult<Vec<String>> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let paths: Vec<String> = self
            .templates
            .keys()
            .filter(|path| path.starts_with(&prefix))
            .cloned()
            .collect();

        if paths.is_empty() {
            return Err(TemplateError::NotFound(dir.to_string()));
        }
        Ok(paths)
    }

    fn describe(&self) -> String {
        format!("in-memory catalog ({} templates)", self.templates.len())
    }
}

/// Join the normal components of a relative path with `/`.
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
