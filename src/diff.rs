//! Human-readable views of a modification set.

use crate::edit::{Modification, ModificationKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Add,
    Remove,
}

/// One line of a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: DiffKind,
    /// Line in the original text the change is anchored to (1-indexed)
    pub line: usize,
    pub text: String,
}

/// Aggregate counts over a modification set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub by_kind: BTreeMap<ModificationKind, usize>,
    pub descriptions: Vec<String>,
}

fn push_lines(out: &mut Vec<DiffLine>, kind: DiffKind, first_line: usize, text: &str) {
    let body = text.strip_suffix('\n').unwrap_or(text);
    for (offset, line) in body.split('\n').enumerate() {
        out.push(DiffLine {
            kind,
            line: first_line + offset,
            text: line.to_string(),
        });
    }
}

/// Diff lines in modification input order
///
/// A replace yields its removed lines followed by its added lines, an insert
/// only added lines and a delete only removed lines.
pub fn diff(mods: &[Modification]) -> Vec<DiffLine> {
    let mut out = Vec::new();

    for modification in mods {
        let line = modification.range.start.line;
        match modification.kind {
            ModificationKind::Replace => {
                push_lines(&mut out, DiffKind::Remove, line, &modification.old_text);
                push_lines(&mut out, DiffKind::Add, line, &modification.new_text);
            }
            ModificationKind::Insert => {
                push_lines(&mut out, DiffKind::Add, line, &modification.new_text);
            }
            ModificationKind::Delete => {
                push_lines(&mut out, DiffKind::Remove, line, &modification.old_text);
            }
        }
    }

    out
}

/// Render diff lines as `-` / `+` prefixed text with line numbers
pub fn render_diff(lines: &[DiffLine]) -> String {
    let mut out = String::new();
    for line in lines {
        let sign = match line.kind {
            DiffKind::Add => '+',
            DiffKind::Remove => '-',
        };
        let _ = writeln!(out, "{}{:>5} | {}", sign, line.line, line.text);
    }
    out
}

pub fn summarize(mods: &[Modification]) -> Summary {
    let mut by_kind = BTreeMap::new();
    for modification in mods {
        *by_kind.entry(modification.kind).or_insert(0) += 1;
    }

    Summary {
        total: mods.len(),
        by_kind,
        descriptions: mods.iter().map(|m| m.description.clone()).collect(),
    }
}
