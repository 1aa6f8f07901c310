//! Canonical team names.
//!
//! The stats site (NCAA) spelling is canonical. The ratings site spells a
//! number of schools differently, so its names go through a fixed alias
//! table after a `State` -> `St.` rewrite. Names missing from the table are
//! assumed to already be canonical.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

const BUNDLED_ALIASES: &str = include_str!("../data/team_aliases.json");

static NAME_MAP: OnceCell<NameMap> = OnceCell::new();

#[derive(Debug, Clone, Default)]
pub struct NameMap {
    aliases: HashMap<String, String>,
}

impl NameMap {
    pub fn from_json(raw: &str) -> Result<Self> {
        let aliases: HashMap<String, String> =
            serde_json::from_str(raw).context("invalid team alias json")?;
        Ok(Self { aliases })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read team aliases {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_ALIASES)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Every canonical spelling the alias table maps onto.
    pub fn canonical_names(&self) -> BTreeSet<String> {
        self.aliases.values().cloned().collect()
    }

    pub fn resolve(&self, raw: &str) -> String {
        self.resolve_detailed(raw).into_name()
    }

    pub fn resolve_detailed(&self, raw: &str) -> Resolution {
        let shortened = raw.trim().replacen("State", "St.", 1);
        match self.get(&shortened) {
            Some(canonical) => Resolution::Mapped(canonical.to_string()),
            None => Resolution::PassThrough(shortened),
        }
    }
}

/// Installs the process-wide alias table. Only the first call takes effect.
pub fn init_name_map(path: Option<&Path>) -> Result<&'static NameMap> {
    NAME_MAP.get_or_try_init(|| match path {
        Some(path) => NameMap::from_path(path),
        None => NameMap::bundled(),
    })
}

pub fn name_map() -> &'static NameMap {
    NAME_MAP.get_or_init(|| NameMap::bundled().unwrap_or_default())
}

pub fn resolve(raw: &str) -> String {
    name_map().resolve(raw)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Mapped(String),
    PassThrough(String),
}

impl Resolution {
    pub fn into_name(self) -> String {
        match self {
            Self::Mapped(name) | Self::PassThrough(name) => name,
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

/// Resolves names against a [`NameMap`] and remembers every name that fell
/// through unmapped, so silent join misses can be inspected afterwards.
///
/// When a set of known canonical names is supplied, only pass-through names
/// outside that set are recorded.
#[derive(Debug)]
pub struct Resolver<'a> {
    map: &'a NameMap,
    known: BTreeSet<String>,
    unresolved: Mutex<BTreeSet<String>>,
}

impl<'a> Resolver<'a> {
    pub fn new(map: &'a NameMap) -> Self {
        Self::with_known(map, BTreeSet::new())
    }

    pub fn with_known(map: &'a NameMap, known: BTreeSet<String>) -> Self {
        Self {
            map,
            known,
            unresolved: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn resolve(&self, raw: &str) -> String {
        match self.map.resolve_detailed(raw) {
            Resolution::Mapped(name) => name,
            Resolution::PassThrough(name) if self.known.contains(&name) => name,
            Resolution::PassThrough(name) => {
                log::debug!("team name {name:?} not in alias table, keeping as-is");
                if let Ok(mut guard) = self.unresolved.lock() {
                    guard.insert(name.clone());
                }
                name
            }
        }
    }

    pub fn unresolved(&self) -> Vec<String> {
        self.unresolved
            .lock()
            .map(|guard| guard.iter().cloned().collect())
            .unwrap_or_default()
    }
}
