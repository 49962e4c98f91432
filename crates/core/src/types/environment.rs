//! Environment-related types for domain-specific operations

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

/// Split a `name=value` entry at its first separator.
///
/// A leading `=` belongs to the name, which keeps Windows drive entries such
/// as `=C:=C:\work` intact. An entry without a separator has an empty value.
#[must_use]
pub fn split_entry(entry: &str) -> (&str, &str) {
    let skip = entry.chars().next().map_or(0, char::len_utf8);
    match entry[skip..].find('=') {
        Some(idx) => (&entry[..skip + idx], &entry[skip + idx + 1..]),
        None => (entry, ""),
    }
}

/// Ordered `name=value` entries that make up a process environment.
///
/// Names and values are kept as OS strings so entries that are not valid
/// UTF-8 reach the child byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentImage(Vec<(OsString, OsString)>);

impl EnvironmentImage {
    /// Create a new empty environment
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Capture the environment of the current process
    #[must_use]
    pub fn from_process() -> Self {
        Self(std::env::vars_os().collect())
    }

    /// Append one entry
    pub fn push(&mut self, name: impl Into<OsString>, value: impl Into<OsString>) {
        self.0.push((name.into(), value.into()));
    }

    /// Iterate over the entries as `(name, value)` pairs
    pub fn pairs(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.0.iter().map(|(name, value)| (name.as_os_str(), value.as_os_str()))
    }

    /// Iterate over the entries whose name and value are both valid UTF-8
    pub fn text_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs()
            .filter_map(|(name, value)| Some((name.to_str()?, value.to_str()?)))
    }

    /// Look up the raw value of the first entry with the given name
    #[must_use]
    pub fn get_os(&self, name: &str) -> Option<&OsStr> {
        self.pairs().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Look up the value of the first entry with the given name, if it is
    /// valid UTF-8
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_os(name).and_then(OsStr::to_str)
    }

    /// Produce a copy where every entry named in `overrides` carries the new
    /// value. Order and untouched entries are preserved; names that do not
    /// already occur are not appended.
    #[must_use]
    pub fn with_overrides(&self, overrides: &HashMap<String, String>) -> Self {
        self.0
            .iter()
            .map(|(name, value)| {
                match name.to_str().and_then(|name| overrides.get(name)) {
                    Some(replacement) => (name.clone(), OsString::from(replacement)),
                    None => (name.clone(), value.clone()),
                }
            })
            .collect()
    }

    /// Render every entry as `name=value`, replacing invalid UTF-8
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.pairs()
            .map(|(name, value)| format!("{}={}", name.to_string_lossy(), value.to_string_lossy()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(OsString, OsString)> for EnvironmentImage {
    fn from_iter<I: IntoIterator<Item = (OsString, OsString)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for EnvironmentImage {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter()
            .map(|entry| {
                let (name, value) = split_entry(entry);
                (OsString::from(name), OsString::from(value))
            })
            .collect()
    }
}

impl FromIterator<String> for EnvironmentImage {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let entries: Vec<String> = iter.into_iter().collect();
        entries.iter().map(String::as_str).collect()
    }
}
