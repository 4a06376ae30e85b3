//! Unified diff parsing into per-file, per-hunk tagged lines.

/// Marker that begins a per-file section in unified diff output.
///
/// Paths follow either bare (`a/x`) or C-quoted (`"a/x"`), so only the
/// command prefix is matched.
const FILE_DIFF_MARKER: &str = "diff --git ";

/// Marker that begins a hunk within a file diff.
const HUNK_MARKER: &str = "@@ ";

/// Path used by git for the missing side of an added or deleted file.
const DEV_NULL: &str = "/dev/null";

/// A per-file slice of a unified diff.
#[derive(Debug, Clone)]
pub struct FileDiff {
    /// Path of the file (extracted from the `b/` side of `diff --git a/... b/...`).
    pub path: String,
    /// Raw text of this file's diff (header + all hunks).
    pub content: String,
}

/// Classification of one line inside a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Present only on the new side (`+`).
    Added,
    /// Present only on the old side (`-`).
    Removed,
    /// Unchanged (` `).
    Context,
}

/// One hunk line with its marker stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Which side(s) the line belongs to.
    pub kind: LineKind,
    /// Line text without the leading marker.
    pub text: String,
}

/// A contiguous block of a file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// First line number on the old side.
    pub old_start: u32,
    /// Number of old-side lines covered.
    pub old_count: u32,
    /// First line number on the new side.
    pub new_start: u32,
    /// Number of new-side lines covered.
    pub new_count: u32,
    /// Tagged lines in diff order.
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Iterates over the text of added lines.
    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(|line| line.kind == LineKind::Added)
            .map(|line| line.text.as_str())
    }
}

/// A parsed file section: resolved path plus its hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatch {
    /// Path on the new side, or the old side for deletions.
    pub path: String,
    /// Hunks in diff order; empty for binary or mode-only changes.
    pub hunks: Vec<Hunk>,
}

/// Splits a flat unified diff at `diff --git` boundaries.
///
/// Returns one [`FileDiff`] for each file section found in the input.
/// An empty or whitespace-only input returns an empty `Vec`.
pub fn split_by_file(diff: &str) -> Vec<FileDiff> {
    let mut positions = Vec::new();

    if diff.starts_with(FILE_DIFF_MARKER) {
        positions.push(0);
    }
    let search = format!("\n{FILE_DIFF_MARKER}");
    let mut start = 0;
    while let Some(pos) = diff[start..].find(&search) {
        // +1 to skip the newline; the section starts at `diff`.
        positions.push(start + pos + 1);
        start = start + pos + 1;
    }

    positions
        .iter()
        .enumerate()
        .map(|(i, &pos)| {
            let end = positions.get(i + 1).copied().unwrap_or(diff.len());
            let content = &diff[pos..end];
            let first_line = content.lines().next().unwrap_or("");
            FileDiff {
                path: extract_path_from_diff_header(first_line),
                content: content.to_string(),
            }
        })
        .collect()
}

/// Parses a whole unified diff into file patches.
pub fn parse_unified_diff(diff: &str) -> Vec<FilePatch> {
    split_by_file(diff).iter().map(parse_file_diff).collect()
}

/// Parses one file section into tagged hunks.
///
/// Hunk bodies are delimited by the counts in their `@@` header, so body
/// lines that happen to look like `+++`/`---` headers are classified by
/// their marker like any other line.
pub fn parse_file_diff(file_diff: &FileDiff) -> FilePatch {
    let mut old_path: Option<String> = None;
    let mut new_path: Option<String> = None;
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut old_left = 0u32;
    let mut new_left = 0u32;

    for line in file_diff.content.lines().skip(1) {
        if old_left == 0 && new_left == 0 {
            if line.starts_with(HUNK_MARKER) {
                if let Some((old_start, old_count, new_start, new_count)) =
                    parse_hunk_header(line)
                {
                    old_left = old_count;
                    new_left = new_count;
                    hunks.push(Hunk {
                        old_start,
                        old_count,
                        new_start,
                        new_count,
                        lines: Vec::new(),
                    });
                }
            } else if hunks.is_empty() {
                if let Some(path) = line.strip_prefix("--- ") {
                    old_path = side_path(path, "a/");
                } else if let Some(path) = line.strip_prefix("+++ ") {
                    new_path = side_path(path, "b/");
                }
            }
            continue;
        }

        let Some(hunk) = hunks.last_mut() else {
            continue;
        };
        let (kind, text) = match line.as_bytes().first() {
            Some(b'+') => (LineKind::Added, &line[1..]),
            Some(b'-') => (LineKind::Removed, &line[1..]),
            Some(b' ') => (LineKind::Context, &line[1..]),
            Some(b'\\') => continue,
            // Some tools strip the single space of an empty context line.
            None => (LineKind::Context, ""),
            Some(_) => {
                // Truncated hunk: stop consuming body lines.
                old_left = 0;
                new_left = 0;
                continue;
            }
        };
        match kind {
            LineKind::Added => new_left = new_left.saturating_sub(1),
            LineKind::Removed => old_left = old_left.saturating_sub(1),
            LineKind::Context => {
                old_left = old_left.saturating_sub(1);
                new_left = new_left.saturating_sub(1);
            }
        }
        hunk.lines.push(DiffLine {
            kind,
            text: text.to_string(),
        });
    }

    let path = new_path
        .or(old_path)
        .unwrap_or_else(|| file_diff.path.clone());
    FilePatch { path, hunks }
}

/// Parses `@@ -a,b +c,d @@ ...` into `(a, b, c, d)`; omitted counts are 1.
fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let mut parts = line.strip_prefix(HUNK_MARKER)?.split(' ');
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some((old_start, old_count, new_start, new_count))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Extracts a path from a `---`/`+++` header value; `None` for `/dev/null`.
fn side_path(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.trim_end_matches('\t');
    let path = if raw.starts_with('"') {
        unquote_c_style(raw)?
    } else {
        raw.to_string()
    };
    if path == DEV_NULL {
        return None;
    }
    Some(path.strip_prefix(prefix).map_or_else(|| path.clone(), str::to_string))
}

/// Decodes a path git wrapped in double quotes with C-style escapes.
///
/// Octal escapes are raw bytes, so a multi-byte character spans several of
/// them. Returns `None` when `quoted` is not a complete quoted string.
pub(crate) fn unquote_c_style(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut bytes = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        let decoded = match iter.next()? {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            b'"' => b'"',
            b'\\' => b'\\',
            d @ b'0'..=b'3' => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    let digit = iter.next_if(|c| (b'0'..=b'7').contains(c))?;
                    value = value * 8 + u32::from(digit - b'0');
                }
                u8::try_from(value).ok()?
            }
            _ => return None,
        };
        bytes.push(decoded);
    }
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts the file path from the `b/` side of a `diff --git` header line.
fn extract_path_from_diff_header(header_line: &str) -> String {
    let rest = header_line
        .strip_prefix(FILE_DIFF_MARKER)
        .unwrap_or(header_line);

    // Quoted form: diff --git "a/old" "b/new"
    if rest.ends_with('"') {
        if let Some(path) = rest
            .rfind(" \"b/")
            .and_then(|pos| unquote_c_style(&rest[pos + 1..]))
        {
            return path.strip_prefix("b/").map_or_else(|| path.clone(), str::to_string);
        }
    }

    // Format: "diff --git a/old_path b/new_path"
    // Find the last " b/" to handle paths that may contain spaces.
    if let Some(b_pos) = rest.rfind(" b/") {
        rest[b_pos + 3..].to_string()
    } else {
        rest.strip_prefix("a/").unwrap_or(rest).to_string()
    }
}
