use editor_decor::{
    DecorEditor, DecorError, Decoration, LineCursor, MarkOptions, Overlay, StateChangeType,
};
use pretty_assertions::assert_eq;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Flags every line.
struct LineError;

impl Overlay for LineError {
    type State = ();

    fn token(&self, cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
        cursor.skip_to_end();
        Some("line-error".into())
    }
}

/// Marks runs of ASCII digits.
struct Numbers;

impl Overlay for Numbers {
    type State = ();

    fn token(&self, cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
        if cursor.eat_while(|ch: char| ch.is_ascii_digit()) {
            return Some("number".into());
        }
        cursor.next_char();
        None
    }
}

/// Tracks whether a block comment is open across lines.
struct BlockComments;

impl Overlay for BlockComments {
    type State = bool;

    fn token(&self, cursor: &mut LineCursor<'_>, in_comment: &mut bool) -> Option<Cow<'_, str>> {
        if *in_comment {
            if cursor.match_str("*/", true, false) {
                *in_comment = false;
            } else {
                cursor.next_char();
            }
            return Some("comment".into());
        }
        if cursor.match_str("/*", true, false) {
            *in_comment = true;
            return Some("comment".into());
        }
        cursor.next_char();
        None
    }
}

/// Never advances.
struct Stuck;

impl Overlay for Stuck {
    type State = ();

    fn token(&self, _cursor: &mut LineCursor<'_>, _state: &mut ()) -> Option<Cow<'_, str>> {
        None
    }
}

fn summary(editor: &DecorEditor) -> Vec<(usize, usize, String)> {
    editor
        .view()
        .overlay_decorations()
        .iter()
        .map(|range| {
            (
                range.from,
                range.to,
                range.value.class().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

#[test]
fn test_line_token_overlay_decorates_every_line() {
    let mut editor = DecorEditor::new("a\nb\nc");
    let handle = editor.add_overlay(LineError).unwrap();

    assert_eq!(
        summary(&editor),
        vec![
            (0, 0, "cm-error".to_string()),
            (2, 2, "cm-error".to_string()),
            (4, 4, "cm-error".to_string()),
        ]
    );
    assert!(
        editor
            .view()
            .overlay_decorations()
            .iter()
            .all(|range| range.value.is_line())
    );
    // Overlay line classes never reach the canonical store.
    assert!(editor.get_line_classes(0).unwrap().is_empty());

    assert!(handle.dispose(&mut editor).unwrap());
    assert!(editor.view().overlay_decorations().is_empty());
    assert!(!handle.dispose(&mut editor).unwrap());
}

#[test]
fn test_span_overlay_follows_edits() {
    let mut editor = DecorEditor::new("x = 1\ny = 22");
    editor.add_overlay(Numbers).unwrap();
    assert_eq!(
        summary(&editor),
        vec![(4, 5, "cm-number".to_string()), (10, 12, "cm-number".to_string())]
    );

    editor.insert(0, "let ").unwrap();
    assert_eq!(
        summary(&editor),
        vec![(8, 9, "cm-number".to_string()), (14, 16, "cm-number".to_string())]
    );

    editor.insert(editor.text().chars().count(), "\nz = 333").unwrap();
    assert_eq!(summary(&editor).last(), Some(&(21, 24, "cm-number".to_string())));
}

#[test]
fn test_overlay_state_carries_across_lines() {
    let mut editor = DecorEditor::new("a /* b\nc\nd */ e");
    editor.add_overlay(BlockComments).unwrap();

    let covered: Vec<usize> = editor
        .view()
        .overlay_decorations()
        .iter()
        .flat_map(|range| range.from..range.to)
        .collect();
    let text: Vec<char> = editor.text().chars().collect();
    let commented: String = covered.iter().map(|&idx| text[idx]).collect();
    assert_eq!(commented, "/* bcd */");
}

#[test]
fn test_overlays_run_in_registration_order() {
    let mut editor = DecorEditor::new("7");
    let numbers = editor.add_overlay(Numbers).unwrap();
    let errors = editor.add_overlay(LineError).unwrap();
    assert_eq!(editor.view().overlays().ids(), vec![numbers.id(), errors.id()]);

    let ranges: Vec<_> = editor.view().overlay_decorations().iter().collect();
    assert_eq!(ranges.len(), 2);
    assert!(ranges[0].value.is_line());
    assert_eq!(ranges[1].value.class(), Some("cm-number"));
}

#[test]
fn test_viewport_limits_overlay_work() {
    let text = (0..100)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let mut editor = DecorEditor::new(&text);
    editor.add_overlay(LineError).unwrap();
    assert_eq!(editor.view().overlay_decorations().len(), 100);

    editor.scroll_to_lines(40, 10).unwrap();
    let set = editor.view().overlay_decorations();
    assert_eq!(set.len(), 10);
    let first_line = editor.view().line(41).unwrap();
    assert_eq!(set.iter().next().map(|range| range.from), Some(first_line.from));

    // The last page is clamped to the document.
    editor.scroll_to_lines(95, 10).unwrap();
    assert_eq!(editor.view().overlay_decorations().len(), 5);
}

#[test]
fn test_scroll_to_lines_clamps_huge_counts() {
    let mut editor = DecorEditor::new("a\nb\nc");
    editor.add_overlay(LineError).unwrap();

    editor.scroll_to_lines(1, usize::MAX).unwrap();
    assert_eq!(editor.view().visible_ranges(), &[2..5]);
    assert_eq!(editor.view().overlay_decorations().len(), 2);

    assert!(matches!(
        editor.scroll_to_lines(usize::MAX, 1),
        Err(DecorError::LineOutOfRange { .. })
    ));
}

#[test]
fn test_recompute_is_deterministic() {
    let mut editor = DecorEditor::new("10 apples\n2 pears\n\n300 figs");
    editor.add_overlay(Numbers).unwrap();
    editor.add_overlay(LineError).unwrap();
    let first = summary(&editor);

    editor.scroll_to_lines(0, 1).unwrap();
    assert_ne!(summary(&editor), first);
    editor.scroll_to_lines(0, 4).unwrap();
    assert_eq!(summary(&editor), first);
}

#[test]
fn test_stalled_overlay_is_rolled_back() {
    let mut editor = DecorEditor::new("abc\ndef");
    editor.add_overlay(Numbers).unwrap();

    let err = editor.add_overlay(Stuck).unwrap_err();
    assert!(matches!(
        err,
        DecorError::OverlayStalled {
            line: 1,
            column: 0,
            ..
        }
    ));
    assert_eq!(editor.view().overlays().len(), 1);

    // Later work proceeds normally.
    editor.insert(0, "42 ").unwrap();
    assert_eq!(summary(&editor), vec![(0, 2, "cm-number".to_string())]);
}

#[test]
fn test_rendered_decorations_merge_both_sources() {
    let mut editor = DecorEditor::new("a 1\nb 2");
    editor.add_overlay(Numbers).unwrap();
    editor.add_line_class(0, "", "active").unwrap();
    editor.mark_text(2, 3, MarkOptions::new("selected")).unwrap();

    let rendered: Vec<(usize, usize, String)> = editor
        .rendered_decorations(0, 3)
        .into_iter()
        .map(|range| {
            (
                range.from,
                range.to,
                range.value.class().unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            (0, 0, "cm-active".to_string()),
            (2, 3, "selected".to_string()),
            (2, 3, "cm-number".to_string()),
        ]
    );
    assert!(matches!(
        editor.rendered_decorations(2, 3)[0].value.as_ref(),
        Decoration::Mark { id: Some(_), .. }
    ));
}

#[test]
fn test_viewport_change_notifications() {
    let mut editor = DecorEditor::new("a\nb\nc");
    editor.add_overlay(LineError).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    editor.subscribe(move |change| sink.borrow_mut().push(change.change_type));

    editor.scroll_to_lines(1, 1).unwrap();
    // Same viewport again: nothing to report.
    editor.scroll_to_lines(1, 1).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![
            StateChangeType::ViewportChanged,
            StateChangeType::OverlaysChanged
        ]
    );
    assert_eq!(editor.view().visible_ranges(), &[2..3]);
}
