use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use super::{Issue, Severity};

/// 1-based line and column of a byte offset.
pub fn offset_to_line_col(input: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in input.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

/// Compact one-line form: `slug: brief at line:col`.
pub fn render_issue_plain(source: &str, issue: &Issue) -> String {
    let (line, column) = offset_to_line_col(source, issue.start);
    format!("{}: {} at {}:{}", issue.slug(), issue.brief(), line, column)
}

/// Render an issue with its source context.
pub fn render_issue(source: &str, issue: &Issue, path: Option<&str>) -> String {
    let span = clamp_span(source, issue.start, issue.end);
    let level = match issue.severity() {
        Severity::Warning => Level::WARNING,
        Severity::Error | Severity::Critical => Level::ERROR,
    };
    let brief = issue.brief();
    let long = issue.long();

    let mut snippet = Snippet::source(source)
        .line_start(1)
        .fold(true)
        .annotation(AnnotationKind::Primary.span(span).label(long.as_str()));
    if let Some(path) = path {
        snippet = snippet.path(path);
    }

    let group = Group::with_title(level.primary_title(brief.as_str()).id(issue.slug()))
        .element(snippet);
    Renderer::plain().render(&[group]).to_string()
}

/// Render every issue at or above `min_severity`, one block per issue.
pub fn render_issues(
    source: &str,
    issues: &[Issue],
    path: Option<&str>,
    min_severity: Severity,
    context: bool,
) -> String {
    let mut out = String::new();
    for issue in issues.iter().filter(|i| i.severity() >= min_severity) {
        if context {
            out.push_str(&render_issue(source, issue, path));
            out.push_str("\n\n");
        } else {
            out.push_str(&render_issue_plain(source, issue));
            out.push('\n');
        }
    }
    out
}

fn clamp_span(source: &str, start: usize, end: usize) -> std::ops::Range<usize> {
    let mut start = start.min(source.len());
    let mut end = end.clamp(start, source.len());
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    while !source.is_char_boundary(end) {
        end += 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::IssueKind;
    use serde_json::json;

    #[test]
    fn test_offset_to_line_col() {
        let input = "line 1\nline 2\nline 3";

        assert_eq!(offset_to_line_col(input, 0), (1, 1));
        assert_eq!(offset_to_line_col(input, 6), (1, 7));
        assert_eq!(offset_to_line_col(input, 7), (2, 1));
        assert_eq!(offset_to_line_col(input, 14), (3, 1));
    }

    #[test]
    fn test_plain_rendering() {
        let source = "<td>\n<th>Fire</th>";
        let issue = Issue::new(IssueKind::UnknownBrowser, 9, 13, json!({"name": "Fire"}));
        assert_eq!(
            render_issue_plain(source, &issue),
            "unknown_browser: Unknown Browser \"Fire\". at 2:5"
        );
    }

    #[test]
    fn test_context_rendering_mentions_slug_and_message() {
        let source = "<p>one</p>\n<p>two</p>\n";
        let issue = Issue::new(IssueKind::HaltImport, 11, 21, json!({}));
        let rendered = render_issue(source, &issue, Some("page.html"));
        assert!(rendered.contains("halt_import"));
        assert!(rendered.contains("Unable to finish importing MDN page."));
        assert!(rendered.contains("page.html"));
    }

    #[test]
    fn test_min_severity_filter() {
        let source = "x";
        let issues = vec![
            Issue::new(IssueKind::SkippedContent, 0, 1, json!({})),
            Issue::new(IssueKind::HaltImport, 0, 1, json!({})),
        ];
        let out = render_issues(source, &issues, None, Severity::Error, false);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("halt_import"));
    }

    #[test]
    fn test_clamp_span_past_end() {
        assert_eq!(clamp_span("abc", 2, 10), 2..3);
        assert_eq!(clamp_span("ß", 1, 1), 0..2);
    }
}
