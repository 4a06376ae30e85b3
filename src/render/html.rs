//! Static HTML table report.
//!
//! Every value taken from the repository is escaped; the page carries no
//! scripts and loads nothing external.

use std::fmt::Write;

use crate::data::{CommitRecord, Report};

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: 6px 8px; text-align: left; vertical-align: top; }
th { background: #f0f0f0; }
code { font-family: monospace; white-space: pre-wrap; }
ul { margin: 0; padding-left: 1.2em; }
";

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Renders `report` as a complete HTML document.
pub fn render(report: &Report) -> String {
    let search = escape(&report.search);
    let scope = escape(&report.scope.to_string());
    let mut out = String::new();

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>Commits introducing &quot;{search}&quot;</title>");
    let _ = writeln!(out, "<style>\n{STYLE}</style>\n</head>\n<body>");
    let _ = writeln!(
        out,
        "<h1>Commits introducing <code>{search}</code></h1>\n<p>Searched {scope}.</p>"
    );

    if report.is_empty() {
        out.push_str("<p>No commits found introducing this string.</p>\n");
    } else {
        out.push_str("<table>\n<thead>\n<tr>");
        for heading in [
            "Commit Date",
            "Commit Hash",
            "Branches",
            "Author",
            "Subject",
            "Context (Added Lines)",
        ] {
            let _ = write!(out, "<th>{heading}</th>");
        }
        out.push_str("</tr>\n</thead>\n<tbody>\n");
        for record in &report.commits {
            write_row(&mut out, record);
        }
        out.push_str("</tbody>\n</table>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn write_row(out: &mut String, record: &CommitRecord) {
    let branches = if record.branches.is_empty() {
        "<em>none</em>".to_string()
    } else {
        record
            .branches
            .iter()
            .map(String::as_str)
            .map(escape)
            .collect::<Vec<_>>()
            .join("<br>")
    };

    let mut context = String::from("<ul>");
    for entry in &record.context {
        let _ = write!(
            context,
            "<li><strong>{}</strong>: <code>{}</code></li>",
            escape(&entry.file),
            escape(entry.line.trim())
        );
    }
    context.push_str("</ul>");

    let _ = writeln!(
        out,
        "<tr><td>{}</td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&record.date.to_rfc3339()),
        escape(&record.hash),
        branches,
        escape(&record.author),
        escape(&record.subject),
        context
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::git::{BranchScope, SearchQuery};
    use crate::render::tests::sample_report;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn table_has_one_row_per_commit() {
        let html = render(&sample_report());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<th>Context (Added Lines)</th>"));
        assert_eq!(html.matches("<tr><td>").count(), 1);
        assert!(html.contains("main<br>origin/main"));
        assert!(html.contains("<code>0123456789abcdef0123456789abcdef01234567</code>"));
    }

    #[test]
    fn repository_text_is_escaped() {
        let html = render(&sample_report());
        assert!(html.contains("Add &lt;settings&gt; &amp; keys"));
        assert!(html.contains("API_KEY = &quot;secret&quot;"));
        assert!(!html.contains("<settings>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn empty_report_has_no_table() {
        let query = SearchQuery::new("<x>", BranchScope::All).unwrap();
        let html = render(&Report::new(&query, Vec::new()));
        assert!(html.contains("No commits found introducing this string."));
        assert!(!html.contains("<table>"));
        assert!(html.contains("<code>&lt;x&gt;</code>"));
    }
}
