// src/plan/root_key.rs

//! Source-root normalization and the overlap relation.

use std::fmt;
use std::path::{Component, Path};

use crate::types::PathCase;

/// A source root in comparable form.
///
/// The key is absolute, lexically normalized (`.` and `..` resolved without
/// touching the filesystem), uses `/` separators and always ends with exactly
/// one `/`. Under [`PathCase::Insensitive`] it is lowercased.
///
/// The trailing separator is what makes prefix tests component-aware:
/// `/src/a/` is not a prefix of `/src/ab/`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RootKey(String);

impl RootKey {
    pub fn new(path: &Path, case: PathCase) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

        let mut prefix = String::new();
        let mut parts: Vec<String> = Vec::new();

        for component in absolute.components() {
            match component {
                Component::Prefix(p) => {
                    prefix = p.as_os_str().to_string_lossy().replace('\\', "/");
                }
                Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    parts.pop();
                }
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            }
        }

        let mut key = prefix;
        key.push('/');
        for part in parts {
            key.push_str(&part);
            key.push('/');
        }

        if case == PathCase::Insensitive {
            key = key.to_lowercase();
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True iff one root equals or contains the other.
    pub fn overlaps(&self, other: &RootKey) -> bool {
        self.0.starts_with(&other.0) || other.0.starts_with(&self.0)
    }
}

impl fmt::Debug for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootKey({:?})", self.0)
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether two source roots overlap: equal, or one is an ancestor directory
/// of the other. Sibling directories never overlap.
///
/// The relation is symmetric and reflexive.
pub fn overlaps(a: &Path, b: &Path, case: PathCase) -> bool {
    RootKey::new(a, case).overlaps(&RootKey::new(b, case))
}
