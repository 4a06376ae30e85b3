//! YAML rendering of reports.
//!
//! The document is built as a `yaml_rust_davvid::Yaml` tree and dumped with
//! multi-line strings enabled. Its shape matches the serde form of
//! [`Report`], so it can be read back with any serde YAML reader.

use anyhow::{Context, Result};
use yaml_rust_davvid::yaml::Hash;
use yaml_rust_davvid::{Yaml, YamlEmitter};

use crate::data::{CommitRecord, ContextEntry, Report};
use crate::git::BranchScope;

/// Serializes a report to a YAML string.
pub fn to_yaml(report: &Report) -> Result<String> {
    let document = mapping([
        ("version", string(&report.version)),
        ("search", string(&report.search)),
        ("scope", scope(&report.scope)),
        (
            "commits",
            Yaml::Array(report.commits.iter().map(commit).collect()),
        ),
    ]);

    let mut output = String::new();
    let mut emitter = YamlEmitter::new(&mut output);
    emitter.multiline_strings(true);
    emitter
        .dump(&document)
        .context("Failed to emit YAML")?;

    Ok(output)
}

fn commit(record: &CommitRecord) -> Yaml {
    mapping([
        ("hash", string(&record.hash)),
        ("date", Yaml::String(record.date.to_rfc3339())),
        ("author", string(&record.author)),
        ("subject", string(&record.subject)),
        (
            "branches",
            Yaml::Array(record.branches.iter().map(String::as_str).map(string).collect()),
        ),
        (
            "context",
            Yaml::Array(record.context.iter().map(context_entry).collect()),
        ),
    ])
}

fn context_entry(entry: &ContextEntry) -> Yaml {
    mapping([("file", string(&entry.file)), ("line", string(&entry.line))])
}

// Same layout as the adjacently tagged serde form.
fn scope(scope: &BranchScope) -> Yaml {
    match scope {
        BranchScope::All => mapping([("kind", string("all"))]),
        BranchScope::Branch(name) => mapping([("kind", string("branch")), ("name", string(name))]),
    }
}

fn mapping<const N: usize>(entries: [(&str, Yaml); N]) -> Yaml {
    let mut hash = Hash::new();
    for (key, value) in entries {
        hash.insert(string(key), value);
    }
    Yaml::Hash(hash)
}

fn string(value: &str) -> Yaml {
    Yaml::String(value.to_string())
}
