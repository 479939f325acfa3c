//! Language Detection
//!
//! Single source of truth for mapping file paths to the languages the
//! pipeline understands. Every stage (scanner, planner rules, transformer
//! dispatch) goes through [`Language::from_path`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

struct LanguageMeta {
    /// Wire identifier, also used in rule `languages` lists
    id: &'static str,
    display_name: &'static str,
    extensions: &'static [&'static str],
    aliases: &'static [&'static str],
    /// Whether a tree-sitter grammar is linked for syntax confirmation
    has_parser: bool,
}

macro_rules! lang_meta {
    ($id:literal, $display:literal, [$($ext:literal),*], [$($alias:literal),*], $parser:literal) => {
        LanguageMeta {
            id: $id,
            display_name: $display,
            extensions: &[$($ext),*],
            aliases: &[$($alias),*],
            has_parser: $parser,
        }
    };
}

/// Languages recognised by the modernization pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    #[default]
    Unknown,
}

impl Language {
    fn meta(&self) -> LanguageMeta {
        match self {
            Language::JavaScript => lang_meta!("javascript", "JavaScript", ["js", "jsx", "mjs", "cjs"], ["javascript", "js", "jsx"], true),
            Language::TypeScript => lang_meta!("typescript", "TypeScript", ["ts", "tsx", "mts", "cts"], ["typescript", "ts", "tsx"], true),
            Language::Python => lang_meta!("python", "Python", ["py", "pyi"], ["python", "py"], true),
            Language::Unknown => lang_meta!("unknown", "Unknown", [], ["unknown", ""], false),
        }
    }

    const ALL: [Language; 3] = [Language::JavaScript, Language::TypeScript, Language::Python];

    /// Wire identifier (`javascript`, `typescript`, `python`, `unknown`)
    pub fn as_str(&self) -> &'static str {
        self.meta().id
    }

    pub fn display_name(&self) -> &'static str {
        self.meta().display_name
    }

    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        let ext_lower = ext.to_lowercase();
        Self::ALL
            .iter()
            .find(|lang| lang.meta().extensions.contains(&ext_lower.as_str()))
            .copied()
            .unwrap_or(Language::Unknown)
    }

    /// Detect language from file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// JavaScript and TypeScript share the React rewrite strategies
    pub fn is_ecmascript(&self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }

    /// Check if a tree-sitter grammar is available for this language
    pub fn has_parser_support(&self) -> bool {
        self.meta().has_parser
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .chain(std::iter::once(&Language::Unknown))
            .find(|lang| lang.meta().aliases.contains(&lower.as_str()))
            .copied()
            .ok_or_else(|| {
                format!(
                    "Unknown language: {}. Valid values: javascript, typescript, python",
                    s
                )
            })
    }
}
