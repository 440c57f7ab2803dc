//! Domain value objects: TemplateLanguage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Owner of the official project templates.
pub const DEFAULT_TEMPLATE_OWNER: &str = "jovotech";

/// Name of the TypeScript template repository; JavaScript appends `-js`.
pub const TEMPLATE_REPOSITORY: &str = "jovo-v4-template";

// ── TemplateLanguage ─────────────────────────────────────────────────────────

/// Language of a generated project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateLanguage {
    #[default]
    TypeScript,
    JavaScript,
}

impl TemplateLanguage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::JavaScript => "javascript",
        }
    }

    /// Extension of the generated app sources.
    pub const fn file_extension(&self) -> &'static str {
        match self {
            Self::TypeScript => "ts",
            Self::JavaScript => "js",
        }
    }

    /// `owner/repository` of the template for this language.
    pub fn repository(&self, owner: &str) -> String {
        match self {
            Self::TypeScript => format!("{owner}/{TEMPLATE_REPOSITORY}"),
            Self::JavaScript => format!("{owner}/{TEMPLATE_REPOSITORY}-js"),
        }
    }
}

impl fmt::Display for TemplateLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a language name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language '{0}' (expected typescript or javascript)")]
pub struct UnknownLanguage(pub String);

impl FromStr for TemplateLanguage {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(Self::TypeScript),
            "javascript" | "js" => Ok(Self::JavaScript),
            other => Err(UnknownLanguage(other.to_string())),
        }
    }
}
