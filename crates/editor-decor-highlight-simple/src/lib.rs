//! `editor-decor-highlight-simple` - Simple (regex-based) syntax overlays for `editor-decor`.
//!
//! This crate is intended for lightweight formats (JSON/INI/etc.) where a hand-written tokenizer
//! is unnecessary. A [`RegexOverlay`] plugs into [`DecorEditor::add_overlay`] like any other
//! overlay, so it only ever scans visible lines.
//!
//! [`DecorEditor::add_overlay`]: editor_decor::DecorEditor::add_overlay

use editor_decor::{LineCursor, Overlay};
use regex::Regex;
use std::borrow::Cow;

/// A single regex highlighting rule.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    class: String,
    capture_group: Option<usize>,
}

impl RegexRule {
    /// Highlight every match of `pattern` with `class`.
    ///
    /// Patterns run against one line at a time; `^` and `$` anchor at the line ends.
    pub fn new(pattern: &str, class: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            class: class.into(),
            capture_group: None,
        })
    }

    /// Highlight only a capture group of each match.
    ///
    /// Example (INI key):
    /// - pattern: `^\\s*([^=\\s]+)\\s*=`
    /// - capture_group: `1` (the key)
    pub fn with_capture_group(mut self, group: usize) -> Self {
        self.capture_group = Some(group);
        self
    }

    /// The class emitted for matches.
    pub fn class(&self) -> &str {
        &self.class
    }

    fn spans<'a>(&'a self, line: &'a str, rule: usize) -> impl Iterator<Item = Span> + 'a {
        self.regex.captures_iter(line).filter_map(move |caps| {
            let m = caps.get(self.capture_group.unwrap_or(0))?;
            (m.start() < m.end()).then_some(Span {
                start: m.start(),
                end: m.end(),
                rule,
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    rule: usize,
}

/// Matches of the line being scanned, in line order, non-overlapping.
#[derive(Debug, Default)]
pub struct RegexLineState {
    spans: Vec<Span>,
    next: usize,
}

/// A simple regex-based syntax overlay.
///
/// Designed for simple formats (JSON/INI/etc.). It is *not* intended to be a full parser. When
/// matches overlap, the one starting first wins; on equal starts the earlier rule wins.
#[derive(Debug, Clone)]
pub struct RegexOverlay {
    rules: Vec<RegexRule>,
}

impl RegexOverlay {
    /// Create an overlay from rules, in priority order.
    pub fn new(rules: Vec<RegexRule>) -> Self {
        Self { rules }
    }

    /// The rules, in priority order.
    pub fn rules(&self) -> &[RegexRule] {
        &self.rules
    }

    fn line_spans(&self, line: &str) -> Vec<Span> {
        let mut spans: Vec<Span> = self
            .rules
            .iter()
            .enumerate()
            .flat_map(|(idx, rule)| rule.spans(line, idx))
            .collect();
        spans.sort_by_key(|span| (span.start, span.rule));

        let mut covered = 0;
        spans.retain(|span| {
            let keep = span.start >= covered;
            if keep {
                covered = span.end;
            }
            keep
        });
        spans
    }

    /// A small default JSON grammar (strings, numbers, booleans, null).
    pub fn json_default(classes: SimpleJsonClasses) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            // JSON string (single-line, handles escapes)
            RegexRule::new(r#""(?:\\.|[^"\\])*""#, classes.string)?,
            // JSON number
            RegexRule::new(
                r#"-?(?:0|[1-9]\d*)(?:\.\d+)?(?:[eE][+-]?\d+)?"#,
                classes.number,
            )?,
            // JSON boolean / null
            RegexRule::new(r#"\b(?:true|false)\b"#, classes.boolean)?,
            RegexRule::new(r#"\bnull\b"#, classes.null)?,
        ]))
    }

    /// A small default INI grammar (section, key, comment).
    pub fn ini_default(classes: SimpleIniClasses) -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            // Section header: [section]
            RegexRule::new(r#"^\s*\[([^\]]+)\]\s*$"#, classes.section)?.with_capture_group(1),
            // Key: key = value
            RegexRule::new(r#"^\s*([^=\s]+)\s*="#, classes.key)?.with_capture_group(1),
            // Comment: ;... or #...
            RegexRule::new(r#"^\s*[;#].*$"#, classes.comment)?,
        ]))
    }
}

impl Overlay for RegexOverlay {
    type State = RegexLineState;

    fn token(
        &self,
        cursor: &mut LineCursor<'_>,
        state: &mut RegexLineState,
    ) -> Option<Cow<'_, str>> {
        if cursor.sol() {
            state.spans = self.line_spans(cursor.text());
            state.next = 0;
        }

        let Some(span) = state.spans.get(state.next).copied() else {
            cursor.skip_to_end();
            return None;
        };

        if cursor.pos() < span.start {
            advance_to(cursor, span.start);
            return None;
        }

        state.next += 1;
        advance_to(cursor, span.end);
        Some(Cow::Borrowed(self.rules[span.rule].class()))
    }
}

fn advance_to(cursor: &mut LineCursor<'_>, byte: usize) {
    while cursor.pos() < byte && cursor.next_char().is_some() {}
}

/// Classes used by [`RegexOverlay::json_default`].
#[derive(Debug, Clone)]
pub struct SimpleJsonClasses {
    /// Quoted strings.
    pub string: String,
    /// Numbers.
    pub number: String,
    /// `true` / `false`.
    pub boolean: String,
    /// `null`.
    pub null: String,
}

impl Default for SimpleJsonClasses {
    fn default() -> Self {
        Self {
            string: SIMPLE_CLASS_STRING.to_string(),
            number: SIMPLE_CLASS_NUMBER.to_string(),
            boolean: SIMPLE_CLASS_ATOM.to_string(),
            null: SIMPLE_CLASS_ATOM.to_string(),
        }
    }
}

/// Classes used by [`RegexOverlay::ini_default`].
#[derive(Debug, Clone)]
pub struct SimpleIniClasses {
    /// Section names.
    pub section: String,
    /// Keys.
    pub key: String,
    /// Comment lines.
    pub comment: String,
}

impl Default for SimpleIniClasses {
    fn default() -> Self {
        Self {
            section: SIMPLE_CLASS_HEADER.to_string(),
            key: SIMPLE_CLASS_PROPERTY.to_string(),
            comment: SIMPLE_CLASS_COMMENT.to_string(),
        }
    }
}

/// Default token classes for `RegexOverlay`-based grammars.
///
/// These are only names. The host's stylesheet maps the prefixed classes to actual colors.
pub const SIMPLE_CLASS_STRING: &str = "string";
/// Numbers.
pub const SIMPLE_CLASS_NUMBER: &str = "number";
/// Keyword-like literals.
pub const SIMPLE_CLASS_ATOM: &str = "atom";
/// Section headers.
pub const SIMPLE_CLASS_HEADER: &str = "header";
/// Keys.
pub const SIMPLE_CLASS_PROPERTY: &str = "property";
/// Comments.
pub const SIMPLE_CLASS_COMMENT: &str = "comment";

#[cfg(test)]
mod tests {
    use super::*;
    use editor_decor::DecorEditor;

    fn tokens(editor: &DecorEditor) -> Vec<(String, String)> {
        let text: Vec<char> = editor.text().chars().collect();
        editor
            .view()
            .overlay_decorations()
            .iter()
            .map(|range| {
                (
                    text[range.from..range.to].iter().collect(),
                    range.value.class().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_regex_overlay_json_strings() {
        let text = r#"{ "key": "值", "n": 12, "ok": true, "x": null }"#;
        let mut editor = DecorEditor::new(text);
        editor
            .add_overlay(RegexOverlay::json_default(SimpleJsonClasses::default()).unwrap())
            .unwrap();

        let tokens = tokens(&editor);
        assert_eq!(tokens.len(), 8);
        assert_eq!(tokens[1], ("\"值\"".to_string(), "cm-string".to_string()));
        assert!(tokens.contains(&("12".to_string(), "cm-number".to_string())));
        assert!(tokens.contains(&("true".to_string(), "cm-atom".to_string())));
        assert!(tokens.contains(&("null".to_string(), "cm-atom".to_string())));
    }

    #[test]
    fn test_string_wins_over_number_inside_it() {
        let mut editor = DecorEditor::new(r#"["a1", 2]"#);
        editor
            .add_overlay(RegexOverlay::json_default(SimpleJsonClasses::default()).unwrap())
            .unwrap();
        assert_eq!(
            tokens(&editor),
            vec![
                ("\"a1\"".to_string(), "cm-string".to_string()),
                ("2".to_string(), "cm-number".to_string()),
            ]
        );
    }

    #[test]
    fn test_regex_overlay_ini_capture_groups() {
        let text = "[core]\nname = editor-decor\n\n;comment\n";
        let mut editor = DecorEditor::new(text);
        editor
            .add_overlay(RegexOverlay::ini_default(SimpleIniClasses::default()).unwrap())
            .unwrap();

        assert_eq!(
            tokens(&editor),
            vec![
                ("core".to_string(), "cm-header".to_string()),
                ("name".to_string(), "cm-property".to_string()),
                (";comment".to_string(), "cm-comment".to_string()),
            ]
        );
    }

    #[test]
    fn test_matches_do_not_leak_across_lines() {
        let overlay = RegexOverlay::new(vec![RegexRule::new("x+", "x").unwrap()]);
        let mut editor = DecorEditor::new("xx\nabc\nx");
        editor.add_overlay(overlay).unwrap();
        assert_eq!(
            tokens(&editor),
            vec![
                ("xx".to_string(), "cm-x".to_string()),
                ("x".to_string(), "cm-x".to_string()),
            ]
        );
    }
}
