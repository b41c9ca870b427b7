//! Per-version action aliases.
//!
//! An alias maps a short action prefix to its canonical dotted name. Keys are
//! kept in configuration order because substitution stops at the first key
//! that prefixes the action.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Version used when a request carries none, or one without aliases.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Ordered `alias prefix → canonical prefix` entries for one version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an alias; a replaced alias keeps its position.
    pub fn insert(&mut self, alias: impl Into<String>, canonical: impl Into<String>) -> &mut Self {
        let alias = alias.into();
        let canonical = canonical.into();
        match self.entries.iter_mut().find(|(key, _)| *key == alias) {
            Some(entry) => entry.1 = canonical,
            None => self.entries.push((alias, canonical)),
        }
        self
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Replace the first alias that case-insensitively prefixes `action`,
    /// keeping the rest of the action as written.
    pub fn substitute(&self, action: &str) -> Option<String> {
        self.entries.iter().find_map(|(alias, canonical)| {
            let head = action.get(..alias.len())?;
            head.eq_ignore_ascii_case(alias)
                .then(|| format!("{}{}", canonical, &action[alias.len()..]))
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (alias, canonical) in iter {
            map.insert(alias, canonical);
        }
        map
    }
}

/// `version → AliasMap`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTable {
    versions: Vec<(String, AliasMap)>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self {
            versions: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>, aliases: AliasMap) -> Self {
        let version = version.into();
        match self.versions.iter_mut().find(|(v, _)| *v == version) {
            Some(entry) => entry.1 = aliases,
            None => self.versions.push((version, aliases)),
        }
        self
    }

    pub fn versions(&self) -> impl Iterator<Item = (&str, &AliasMap)> {
        self.versions.iter().map(|(v, map)| (v.as_str(), map))
    }

    /// Aliases for `version`. Missing, empty or unknown versions use the
    /// aliases of `default_version`.
    pub fn for_version(&self, version: Option<&str>, default_version: &str) -> Option<&AliasMap> {
        let lookup = |wanted: &str| {
            self.versions
                .iter()
                .find(|(v, _)| v == wanted)
                .map(|(_, map)| map)
        };
        version
            .filter(|v| !v.is_empty())
            .and_then(lookup)
            .or_else(|| lookup(default_version))
    }

    /// Alias-substituted action; unmatched actions pass through unchanged.
    pub fn substitute(&self, action: &str, version: Option<&str>) -> String {
        self.substitute_or(action, version, DEFAULT_VERSION)
    }

    pub fn substitute_or(&self, action: &str, version: Option<&str>, default_version: &str) -> String {
        self.for_version(version, default_version)
            .and_then(|aliases| aliases.substitute(action))
            .unwrap_or_else(|| action.to_string())
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::empty()
            .with_version("1.0.0", [("ping", "utils.ping.ping")].into_iter().collect())
            .with_version("2.0.0", [("ping", "utils.ping.pong")].into_iter().collect())
    }
}

struct OrderedEntries<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedEntries<V> {
    type Value = Vec<(String, V)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            entries.push((key, value));
        }
        Ok(entries)
    }
}

impl<'de> Deserialize<'de> for AliasMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = deserializer.deserialize_map(OrderedEntries::<String>(PhantomData))?;
        Ok(entries.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for AliasTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let versions = deserializer.deserialize_map(OrderedEntries::<AliasMap>(PhantomData))?;
        Ok(versions
            .into_iter()
            .fold(AliasTable::empty(), |table, (version, aliases)| {
                table.with_version(version, aliases)
            }))
    }
}

impl Serialize for AliasMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (alias, canonical) in &self.entries {
            map.serialize_entry(alias, canonical)?;
        }
        map.end()
    }
}

impl Serialize for AliasTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.versions.len()))?;
        for (version, aliases) in &self.versions {
            map.serialize_entry(version, aliases)?;
        }
        map.end()
    }
}
