//! Decides whether a candidate commit actually added the literal.
//!
//! A pickaxe hit only says the occurrence count changed. The commit counts
//! as an introduction when at least one *added* diff line contains the
//! literal as a plain substring. Context lines are not consulted, so a
//! line that already held the literal elsewhere in the hunk does not
//! suppress the match.

use tracing::debug;

use crate::data::IntroductionMatch;
use crate::git::diff_split::{parse_unified_diff, LineKind};
use crate::git::{CandidateCommit, DiffError, HistoryProvider};

/// Extracts every added line of `diff` that contains `literal`.
pub fn find_added_occurrences(commit: &str, diff: &str, literal: &str) -> Vec<IntroductionMatch> {
    parse_unified_diff(diff)
        .into_iter()
        .flat_map(|patch| {
            let path = patch.path;
            patch
                .hunks
                .into_iter()
                .flat_map(|hunk| hunk.lines)
                .filter(|line| line.kind == LineKind::Added && line.text.contains(literal))
                .map(move |line| IntroductionMatch {
                    commit: commit.to_string(),
                    file: path.clone(),
                    line: line.text,
                })
        })
        .collect()
}

/// Fetches the commit's first-parent diff and extracts introduction matches.
pub async fn analyze<P>(
    provider: &P,
    commit: &CandidateCommit,
    literal: &str,
) -> Result<Vec<IntroductionMatch>, DiffError>
where
    P: HistoryProvider + ?Sized,
{
    let diff = provider.commit_diff(&commit.id).await?;
    let matches = find_added_occurrences(&commit.id, &diff, literal);
    debug!(commit = %commit.id, matches = matches.len(), "Analyzed candidate diff");
    Ok(matches)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn file_diff(path: &str, hunk_header: &str, body: &str) -> String {
        format!("diff --git a/{path} b/{path}\n--- a/{path}\n+++ b/{path}\n{hunk_header}\n{body}")
    }

    #[test]
    fn new_file_with_secret_is_an_introduction() {
        let diff = "diff --git a/settings.py b/settings.py\n\
                    new file mode 100644\n\
                    --- /dev/null\n\
                    +++ b/settings.py\n\
                    @@ -0,0 +1,2 @@\n\
                    +DEBUG = False\n\
                    +API_KEY = \"secret\"\n";
        let matches = find_added_occurrences("c1", diff, "secret");
        assert_eq!(
            matches,
            vec![IntroductionMatch {
                commit: "c1".to_string(),
                file: "settings.py".to_string(),
                line: "API_KEY = \"secret\"".to_string(),
            }]
        );
    }

    #[test]
    fn removal_only_yields_nothing() {
        let diff = file_diff("a.txt", "@@ -1,2 +1,1 @@", " keep\n-token = foo\n");
        assert!(find_added_occurrences("c1", &diff, "foo").is_empty());
    }

    #[test]
    fn extending_a_prefix_counts() {
        let diff = file_diff("a.py", "@@ -1 +1 @@", "-value = \"fo\"\n+value = \"foo\"\n");
        let matches = find_added_occurrences("c1", &diff, "\"foo\"");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, "value = \"foo\"");
    }

    #[test]
    fn context_line_with_literal_does_not_suppress_match() {
        let diff = file_diff(
            "a.txt",
            "@@ -1,1 +1,2 @@",
            " already foo here\n+and foo again\n",
        );
        let matches = find_added_occurrences("c1", &diff, "foo");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, "and foo again");
    }

    #[test]
    fn context_only_occurrence_is_not_a_match() {
        let diff = file_diff("a.txt", "@@ -1,2 +1,2 @@", " has foo\n-x\n+y\n");
        assert!(find_added_occurrences("c1", &diff, "foo").is_empty());
    }

    #[test]
    fn match_is_case_sensitive_and_literal() {
        let diff = file_diff("a.txt", "@@ -0,0 +1,3 @@", "+FOO\n+f.o\n+a+b\n");
        assert!(find_added_occurrences("c1", &diff, "foo").is_empty());
        assert!(find_added_occurrences("c1", &diff, "f.?o").is_empty());
        assert_eq!(find_added_occurrences("c1", &diff, "a+b").len(), 1);
    }

    #[test]
    fn multiple_files_and_lines_keep_diff_order() {
        let diff = format!(
            "{}{}",
            file_diff("a.rs", "@@ -0,0 +1,2 @@", "+let x = foo;\n+let y = foo;\n"),
            file_diff("b.rs", "@@ -0,0 +1 @@", "+foo()\n")
        );
        let found: Vec<(String, String)> = find_added_occurrences("c1", &diff, "foo")
            .into_iter()
            .map(|m| (m.file, m.line))
            .collect();
        assert_eq!(
            found,
            vec![
                ("a.rs".to_string(), "let x = foo;".to_string()),
                ("a.rs".to_string(), "let y = foo;".to_string()),
                ("b.rs".to_string(), "foo()".to_string()),
            ]
        );
    }

    #[test]
    fn added_line_starting_with_plus_plus_is_inspected() {
        let diff = file_diff("c.cpp", "@@ -0,0 +1 @@", "+++counter; // foo\n");
        let matches = find_added_occurrences("c1", &diff, "foo");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, "++counter; // foo");
    }

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn every_match_contains_the_literal(
                literal in "[a-c]{1,3}",
                added in proptest::collection::vec("[a-d ]{0,12}", 0..8),
                removed in proptest::collection::vec("[a-d ]{0,12}", 0..8),
            ) {
                let mut body = String::new();
                for line in &removed {
                    body.push_str(&format!("-{line}\n"));
                }
                for line in &added {
                    body.push_str(&format!("+{line}\n"));
                }
                let diff = format!(
                    "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,{} +1,{} @@\n{body}",
                    removed.len(),
                    added.len()
                );
                let matches = find_added_occurrences("c", &diff, &literal);
                for m in &matches {
                    prop_assert!(m.line.contains(&literal));
                }
                let expected = added.iter().filter(|l| l.contains(&literal)).count();
                prop_assert_eq!(matches.len(), expected);
            }
        }
    }
}
