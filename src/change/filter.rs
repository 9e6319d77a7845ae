// src/change/filter.rs

use std::fmt;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// File-name globs that count as build inputs when nothing else is configured.
pub const DEFAULT_INCLUDE: &[&str] = &[
    "*.rs",
    "*.toml",
    "*.c",
    "*.cc",
    "*.cpp",
    "*.h",
    "*.hpp",
    "*.cs",
    "*.csproj",
    "*.fs",
    "*.fsproj",
    "*.vb",
    "*.vbproj",
    "*.props",
    "*.targets",
    "*.sln",
    "*.resx",
    "*.xml",
    "*.json",
    "*.go",
    "*.java",
    "*.kt",
    "*.gradle",
    "*.ts",
    "*.js",
    "*.py",
    "*.proto",
    "*.cmake",
    "CMakeLists.txt",
    "Makefile",
];

/// Directory names holding derived output. Anything below them is ignored so
/// that a build's own output never marks the unit as changed.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["bin", "obj", "target", ".git", ".wavebuild"];

/// Which files under a source root are build-relevant.
///
/// Include globs are matched against the file name only, case-insensitively.
/// Excluded directories are matched by exact directory name, ignoring ASCII
/// case, at any depth.
#[derive(Clone)]
pub struct SourceFilter {
    include: GlobSet,
    include_patterns: Vec<String>,
    excluded_dirs: Vec<String>,
}

impl fmt::Debug for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFilter")
            .field("include", &self.include_patterns)
            .field("excluded_dirs", &self.excluded_dirs)
            .finish()
    }
}

impl SourceFilter {
    pub fn new<I, S, D, T>(include: I, excluded_dirs: D) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        D: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let include_patterns: Vec<String> =
            include.into_iter().map(|p| p.as_ref().to_string()).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &include_patterns {
            let glob = GlobBuilder::new(pattern).case_insensitive(true).build()?;
            builder.add(glob);
        }

        Ok(Self {
            include: builder.build()?,
            include_patterns,
            excluded_dirs: excluded_dirs
                .into_iter()
                .map(|d| d.as_ref().to_string())
                .collect(),
        })
    }

    /// The built-in allow-list and excluded directories.
    pub fn standard() -> Result<Self> {
        Self::new(DEFAULT_INCLUDE, DEFAULT_EXCLUDED_DIRS)
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.include.is_match(Path::new(name)))
    }

    pub fn is_excluded_dir(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.excluded_dirs
            .iter()
            .any(|excluded| excluded.eq_ignore_ascii_case(name))
    }
}
