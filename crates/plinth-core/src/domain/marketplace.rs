//! Marketplace listing model.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Normalised tag set of a marketplace entry.
///
/// Registries supply tags either as a comma-separated string
/// (`"platforms, alexa"`) or as a list. Both forms normalise the same way:
/// all whitespace is stripped, entries are split on commas and empty entries
/// are dropped. Normalising an already normalised set is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Normalise a comma-separated tag string.
    pub fn parse(raw: &str) -> Self {
        Self::from_iter([raw])
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Re-run normalisation over the current entries.
    #[must_use]
    pub fn normalized(&self) -> Self {
        self.iter().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let tags = iter
            .into_iter()
            .flat_map(|raw| {
                let compact: String = raw.as_ref().chars().filter(|c| !c.is_whitespace()).collect();
                compact
                    .split(',')
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self(tags)
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(", "))
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Joined(String),
            Split(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Joined(raw) => Tags::parse(&raw),
            Raw::Split(items) => items.into_iter().collect(),
        })
    }
}

/// One entry of a plugin marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplacePlugin {
    /// Human readable name, e.g. `"Amazon Alexa"`.
    pub name: String,
    /// Exported runtime module, e.g. `"AlexaPlatform"`.
    pub module: String,
    /// Package identifier, e.g. `"@jovotech/platform-alexa"`.
    pub package: String,
    /// Module providing the CLI-side hook, when the plugin ships one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_module: Option<String>,
    pub description: String,
    #[serde(default)]
    pub tags: Tags,
}

impl MarketplacePlugin {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Case-insensitive match against name, module or package. A selector
    /// also matches a package by its last dash-separated suffix, so
    /// `"alexa"` finds `@jovotech/platform-alexa`.
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim().to_ascii_lowercase();
        if selector.is_empty() {
            return false;
        }
        let package = self.package.to_ascii_lowercase();
        self.name.to_ascii_lowercase() == selector
            || self.module.to_ascii_lowercase() == selector
            || package == selector
            || package.ends_with(&format!("-{selector}"))
    }
}
