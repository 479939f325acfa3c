//! Tree-sitter confirmation of text matches.
//!
//! A text match only counts when it sits outside comments and string
//! literals. When no grammar applies, or the file has syntax errors, every
//! text match stands.

use std::ops::Range;
use std::path::Path;

use tree_sitter::{Query, QueryCursor, StreamingIterator};

use crate::types::{Language, Result, ReviveError};

const ECMASCRIPT_MASK_QUERY: &str = r#"
(comment) @masked
(string) @masked
(template_string) @masked
"#;

const PYTHON_MASK_QUERY: &str = r#"
(comment) @masked
(string) @masked
"#;

/// Create a tree-sitter parser for the given grammar.
pub fn create_ts_parser<L: Into<tree_sitter::Language>>(
    language: L,
    lang_name: &str,
) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| ReviveError::Parse {
            message: format!("Failed to set {} language: {}", lang_name, e),
            path: String::new(),
        })?;
    Ok(parser)
}

fn grammar_for(path: &Path, language: Language) -> Option<(tree_sitter::Language, &'static str)> {
    match language {
        Language::Python => Some((tree_sitter_python::LANGUAGE.into(), PYTHON_MASK_QUERY)),
        Language::TypeScript
            if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("ts" | "mts" | "cts")
            ) =>
        {
            Some((
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                ECMASCRIPT_MASK_QUERY,
            ))
        }
        Language::JavaScript | Language::TypeScript => Some((
            tree_sitter_typescript::LANGUAGE_TSX.into(),
            ECMASCRIPT_MASK_QUERY,
        )),
        Language::Unknown => None,
    }
}

/// Byte ranges of comments and string literals, or `None` when the file
/// cannot be parsed cleanly.
pub fn masked_ranges(path: &Path, language: Language, source: &str) -> Option<Vec<Range<usize>>> {
    let (grammar, query_str) = grammar_for(path, language)?;
    let mut parser = create_ts_parser(grammar.clone(), language.display_name()).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!(path = %path.display(), "Syntax errors, keeping text matches");
        return None;
    }

    let query = Query::new(&grammar, query_str).ok()?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, source.as_bytes());

    let mut ranges = Vec::new();
    while let Some(m) = matches.next() {
        for cap in m.captures.iter() {
            ranges.push(cap.node.byte_range());
        }
    }
    Some(ranges)
}

/// Keep only the match offsets that fall outside every masked range
pub fn confirm(offsets: Vec<usize>, masked: Option<&[Range<usize>]>) -> Vec<usize> {
    match masked {
        Some(ranges) => offsets
            .into_iter()
            .filter(|offset| !ranges.iter().any(|r| r.contains(offset)))
            .collect(),
        None => offsets,
    }
}

/// 1-based line number of a byte offset
pub fn line_of(source: &str, offset: usize) -> usize {
    source.as_bytes()[..offset.min(source.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count()
        + 1
}
