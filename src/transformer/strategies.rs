//! Source rewrites, one variant per (language, legacy pattern).
//!
//! Every strategy is idempotent: feeding its own output back in reports
//! `changed == false`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::Language;

static CLASS_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bclass\s+([A-Za-z_$][\w$]*)\s+extends\s+(?:React\.)?Component\s*\{")
        .expect("class header regex is valid")
});

static RENDER_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brender\s*\(\s*\)\s*\{").expect("render regex is valid"));

static DID_MOUNT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcomponentDidMount\s*\(\s*\)\s*\{").expect("mount regex is valid")
});

static WILL_UNMOUNT_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcomponentWillUnmount\s*\(\s*\)\s*\{").expect("unmount regex is valid")
});

static USE_EFFECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\buseEffect\b").expect("useEffect regex is valid"));

static COROUTINE_DECORATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@asyncio\.coroutine[ \t]*\r?\n\s*def\s+(\w+)").expect("coroutine regex is valid")
});

static YIELD_FROM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\byield\s+from\b").expect("yield from regex is valid"));

/// Outcome of one strategy over one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub output: String,
    pub changed: bool,
}

impl Rewrite {
    fn unchanged(source: &str) -> Self {
        Self {
            output: source.to_string(),
            changed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// React class component to function component with `useEffect`
    ClassComponentToFunction,
    /// `@asyncio.coroutine` / `yield from` to `async def` / `await`
    LegacyCoroutineToAsync,
}

impl RewriteStrategy {
    /// Ordered strategies for a file language and the catalogue pattern a
    /// task was planned for. Patterns without a mechanical rewrite get none.
    pub fn for_pattern(language: Language, pattern: &str) -> &'static [RewriteStrategy] {
        match (language, pattern) {
            (Language::JavaScript | Language::TypeScript, "class-component") => {
                &[RewriteStrategy::ClassComponentToFunction]
            }
            (Language::Python, "asyncio-coroutine" | "yield-from") => {
                &[RewriteStrategy::LegacyCoroutineToAsync]
            }
            _ => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RewriteStrategy::ClassComponentToFunction => "class-component-to-function",
            RewriteStrategy::LegacyCoroutineToAsync => "legacy-coroutine-to-async",
        }
    }

    pub fn apply(&self, source: &str) -> Rewrite {
        match self {
            RewriteStrategy::ClassComponentToFunction => class_components_to_functions(source),
            RewriteStrategy::LegacyCoroutineToAsync => coroutines_to_async(source),
        }
    }

    /// Run every strategy in order, feeding each the previous output
    pub fn chain(strategies: &[RewriteStrategy], source: &str) -> Rewrite {
        strategies.iter().fold(Rewrite::unchanged(source), |acc, strategy| {
            let next = strategy.apply(&acc.output);
            Rewrite {
                changed: acc.changed || next.changed,
                output: next.output,
            }
        })
    }
}

// =============================================================================
// Class components
// =============================================================================

struct ClassComponent {
    start: usize,
    end: usize,
    replacement: String,
}

fn class_components_to_functions(source: &str) -> Rewrite {
    let mut converted = Vec::new();
    let mut cursor = 0;

    while let Some(header) = CLASS_HEADER.captures_at(source, cursor) {
        let Some(whole) = header.get(0) else { break };
        let open = whole.end() - 1;
        let Some(close) = matching_brace(source, open) else {
            break;
        };

        let name = &header[1];
        let body = &source[open + 1..close];
        if let Some(replacement) = function_component(name, body) {
            converted.push(ClassComponent {
                start: whole.start(),
                end: close + 1,
                replacement,
            });
        }
        cursor = close + 1;
    }

    if converted.is_empty() {
        return Rewrite::unchanged(source);
    }

    let mut output = String::with_capacity(source.len());
    let mut last = 0;
    for class in &converted {
        output.push_str(&source[last..class.start]);
        output.push_str(&class.replacement);
        last = class.end;
    }
    output.push_str(&source[last..]);

    if USE_EFFECT.is_match(&output) && !USE_EFFECT.is_match(source) {
        output.insert_str(0, "import { useEffect } from 'react';\n");
    }

    Rewrite {
        output,
        changed: true,
    }
}

/// `None` when `render()` does not end in a `return <expr>;`
fn function_component(name: &str, body: &str) -> Option<String> {
    let render = method_body(&RENDER_HEADER, body)?;
    let (preamble, returned) = split_final_return(render)?;

    let mount = method_body(&DID_MOUNT_HEADER, body)
        .map(detach_this)
        .filter(|b| !b.is_empty());
    let cleanup = method_body(&WILL_UNMOUNT_HEADER, body)
        .map(detach_this)
        .filter(|b| !b.is_empty());

    let mut out = format!("function {}(props) {{\n", name);

    if mount.is_some() || cleanup.is_some() {
        out.push_str("  useEffect(() => {\n");
        if let Some(mount) = &mount {
            out.push_str(&reindent(mount, "    "));
        }
        if let Some(cleanup) = &cleanup {
            out.push_str("    return () => {\n");
            out.push_str(&reindent(cleanup, "      "));
            out.push_str("    };\n");
        }
        out.push_str("  }, []);\n\n");
    }

    let preamble = detach_this(preamble);
    if !preamble.is_empty() {
        out.push_str(&reindent(&preamble, "  "));
    }
    out.push_str(&format!("  return {};\n}}", detach_this(returned)));

    Some(out)
}

/// Trimmed body of the first method whose header matches
fn method_body<'a>(header: &Regex, class_body: &'a str) -> Option<&'a str> {
    let found = header.find(class_body)?;
    let open = found.end() - 1;
    let close = matching_brace(class_body, open)?;
    Some(class_body[open + 1..close].trim())
}

/// Split a render body into the statements before its last top-level
/// `return` and the returned expression.
fn split_final_return(render: &str) -> Option<(&str, &str)> {
    let stripped = render.trim_end().strip_suffix(';')?;

    let bytes = stripped.as_bytes();
    let mut depth = 0i32;
    let mut last_return = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth -= 1,
            b'r' if depth == 0 && is_keyword_at(bytes, i, b"return") => last_return = Some(i),
            _ => {}
        }
    }

    let at = last_return?;
    let expr = stripped[at + "return".len()..].trim();
    if expr.is_empty() || (expr.contains(';') && !balanced_statement(expr)) {
        return None;
    }
    Some((render[..at].trim(), expr))
}

/// An expression spanning `;` is only accepted when every `;` sits inside
/// brackets (e.g. inline handlers in JSX).
fn balanced_statement(expr: &str) -> bool {
    let mut depth = 0i32;
    for b in expr.bytes() {
        match b {
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth -= 1,
            b';' if depth == 0 => return false,
            _ => {}
        }
    }
    true
}

fn is_keyword_at(bytes: &[u8], at: usize, keyword: &[u8]) -> bool {
    let end = at + keyword.len();
    if end > bytes.len() || &bytes[at..end] != keyword {
        return false;
    }
    let ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';
    let before_ok = at == 0 || !ident(bytes[at - 1]);
    let after_ok = end == bytes.len() || !ident(bytes[end]);
    before_ok && after_ok
}

/// Byte index of the `}` closing the `{` at `open`. Lexical only: braces
/// inside strings are counted too.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in source.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn detach_this(code: &str) -> String {
    code.replace("this.props", "props")
        .replace("this.state", "state")
        .trim()
        .to_string()
}

/// Re-indent a trimmed block: the common indentation of its continuation
/// lines is stripped and `prefix` applied to every line.
fn reindent(block: &str, prefix: &str) -> String {
    let mut lines = block.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();

    let common = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = format!("{}{}\n", prefix, first);
    for line in rest {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(prefix);
            out.push_str(line.get(common..).unwrap_or(line.trim_start()).trim_end());
            out.push('\n');
        }
    }
    out
}

// =============================================================================
// Python coroutines
// =============================================================================

fn coroutines_to_async(source: &str) -> Rewrite {
    let decorated = COROUTINE_DECORATOR.replace_all(source, |caps: &Captures| {
        format!("async def {}", &caps[1])
    });
    let awaited = YIELD_FROM.replace_all(&decorated, "await");

    let changed = awaited != source;
    Rewrite {
        output: awaited.into_owned(),
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERO: &str = r#"
import React, { Component } from 'react';

class Hero extends Component {
  componentDidMount() { this.props.onLoad(); }
  componentWillUnmount() { this.props.onCleanup(); }
  render() {
    return <section>{this.props.title}</section>;
  }
}

export default Hero;
"#;

    #[test]
    fn test_class_component_with_lifecycle() {
        let rewrite = RewriteStrategy::ClassComponentToFunction.apply(HERO);
        assert!(rewrite.changed);

        let out = &rewrite.output;
        assert!(out.starts_with("import { useEffect } from 'react';\n"));
        assert!(out.contains("function Hero(props) {"));
        assert!(out.contains("  useEffect(() => {\n    props.onLoad();\n    return () => {\n      props.onCleanup();\n    };\n  }, []);"));
        assert!(out.contains("  return <section>{props.title}</section>;\n}"));
        assert!(out.contains("export default Hero;"));
        assert!(!out.contains("this.props"));
        assert!(!out.contains("class Hero"));
    }

    #[test]
    fn test_trivial_render_without_effect() {
        let source = "class App extends React.Component { render() { return <div>Hello</div>; } }\n";
        let rewrite = RewriteStrategy::ClassComponentToFunction.apply(source);
        assert!(rewrite.changed);
        assert_eq!(
            rewrite.output,
            "function App(props) {\n  return <div>Hello</div>;\n}\n"
        );
    }

    #[test]
    fn test_render_preamble_is_kept() {
        let source = "class Greeting extends Component {\n  render() {\n    const name = this.state.name;\n    return <p>{name}</p>;\n  }\n}";
        let out = RewriteStrategy::ClassComponentToFunction.apply(source).output;
        assert_eq!(
            out,
            "function Greeting(props) {\n  const name = state.name;\n  return <p>{name}</p>;\n}"
        );
    }

    #[test]
    fn test_multiple_classes_in_one_file() {
        let source = "class A extends Component { render() { return <a/>; } }\nclass B extends React.Component { render() { return <b/>; } }\n";
        let out = RewriteStrategy::ClassComponentToFunction.apply(source).output;
        assert!(out.contains("function A(props)"));
        assert!(out.contains("function B(props)"));
        assert!(!out.contains("class "));
    }

    #[test]
    fn test_no_render_return_is_unchanged() {
        let source = "class Store extends Component {\n  render() {\n    doSomething();\n  }\n}\n";
        let rewrite = RewriteStrategy::ClassComponentToFunction.apply(source);
        assert!(!rewrite.changed);
        assert_eq!(rewrite.output, source);

        let plain = "const x = 1;\n";
        assert!(!RewriteStrategy::ClassComponentToFunction.apply(plain).changed);
    }

    #[test]
    fn test_existing_use_effect_import_not_duplicated() {
        let source = "import React, { useEffect } from 'react';\nclass T extends Component {\n  componentDidMount() { start(); }\n  render() { return null; }\n}\n";
        let out = RewriteStrategy::ClassComponentToFunction.apply(source).output;
        assert_eq!(out.matches("import").count(), 1);
    }

    #[test]
    fn test_class_component_is_idempotent() {
        let once = RewriteStrategy::ClassComponentToFunction.apply(HERO);
        let twice = RewriteStrategy::ClassComponentToFunction.apply(&once.output);
        assert!(!twice.changed);
        assert_eq!(twice.output, once.output);
    }

    #[test]
    fn test_legacy_coroutine() {
        let source = "import asyncio\n\n@asyncio.coroutine\ndef fetch():\n    yield from client.get(\"/status\")\n";
        let rewrite = RewriteStrategy::LegacyCoroutineToAsync.apply(source);
        assert!(rewrite.changed);
        assert_eq!(
            rewrite.output,
            "import asyncio\n\nasync def fetch():\n    await client.get(\"/status\")\n"
        );

        let again = RewriteStrategy::LegacyCoroutineToAsync.apply(&rewrite.output);
        assert!(!again.changed);
    }

    #[test]
    fn test_indented_method_keeps_indentation() {
        let source = "class Worker:\n    @asyncio.coroutine\n    def run(self):\n        yield from self.step()\n";
        let out = RewriteStrategy::LegacyCoroutineToAsync.apply(source).output;
        assert_eq!(
            out,
            "class Worker:\n    async def run(self):\n        await self.step()\n"
        );
    }

    #[test]
    fn test_plain_python_unchanged() {
        let source = "async def ok():\n    await go()\n";
        assert!(!RewriteStrategy::LegacyCoroutineToAsync.apply(source).changed);
    }

    #[test]
    fn test_strategies_per_language_and_pattern() {
        assert_eq!(
            RewriteStrategy::for_pattern(Language::TypeScript, "class-component"),
            &[RewriteStrategy::ClassComponentToFunction]
        );
        assert_eq!(
            RewriteStrategy::for_pattern(Language::Python, "yield-from"),
            &[RewriteStrategy::LegacyCoroutineToAsync]
        );
        for pattern in ["react-create-class", "component-will-mount", "asyncio-get-loop"] {
            assert!(RewriteStrategy::for_pattern(Language::JavaScript, pattern).is_empty());
            assert!(RewriteStrategy::for_pattern(Language::Python, pattern).is_empty());
        }
        assert!(RewriteStrategy::for_pattern(Language::Python, "class-component").is_empty());
        assert!(RewriteStrategy::for_pattern(Language::Unknown, "class-component").is_empty());
        let chained = RewriteStrategy::chain(
            RewriteStrategy::for_pattern(Language::Unknown, "yield-from"),
            "x",
        );
        assert!(!chained.changed);
    }
}
