//! Fixed reference vocabulary the suggester draws from.
//!
//! Source format is a small TSV:
//!
//! - `character<TAB>pinyin<TAB>definition`
//! - blank lines and lines starting with `#` are skipped
//!
//! The HSK-1 table ships inside the binary; a file on disk can replace it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::XueziError;

const BUILTIN_HSK1: &str = include_str!("../data/hsk1.tsv");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub character: String,
    pub pinyin: String,
    pub definition: String,
}

impl CatalogEntry {
    pub fn new(
        character: impl Into<String>,
        pinyin: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            character: character.into(),
            pinyin: pinyin.into(),
            definition: definition.into(),
        }
    }
}

/// Immutable after construction. Share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build from entries, rejecting repeated characters.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self, XueziError> {
        {
            let mut seen = HashSet::with_capacity(entries.len());
            for e in &entries {
                if e.character.trim().is_empty() {
                    return Err(XueziError::Catalog("entry with empty character".into()));
                }
                if !seen.insert(e.character.as_str()) {
                    return Err(XueziError::Catalog(format!(
                        "duplicate character '{}'",
                        e.character
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    /// The HSK-1 list compiled into the binary.
    pub fn builtin() -> Result<Self, XueziError> {
        Self::from_tsv_str(BUILTIN_HSK1)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, XueziError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .map_err(|e| XueziError::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_tsv_str(&s)
    }

    pub fn from_tsv_str(s: &str) -> Result<Self, XueziError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for (idx, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut it = line.split('\t').map(str::trim);
            let character = it.next().unwrap_or("");
            let pinyin = it.next().unwrap_or("");
            let definition = it.next().unwrap_or("");
            if character.is_empty() || pinyin.is_empty() || definition.is_empty() {
                return Err(XueziError::Catalog(format!(
                    "line {}: expected character, pinyin and definition",
                    idx + 1
                )));
            }
            if it.next().is_some() {
                return Err(XueziError::Catalog(format!(
                    "line {}: too many columns",
                    idx + 1
                )));
            }
            if !seen.insert(character.to_string()) {
                return Err(XueziError::Catalog(format!(
                    "line {}: duplicate character '{character}'",
                    idx + 1
                )));
            }
            entries.push(CatalogEntry::new(character, pinyin, definition));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, character: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.character == character)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
