use crate::diff::{self, DiffLine, Summary};
use crate::error::{ApplyError, ValidationError};
use crate::position::{SourceRange, line_bounds};
use serde::Serialize;
use std::fmt;

/// What a modification does to its range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationKind {
    Replace,
    Insert,
    Delete,
}

impl fmt::Display for ModificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModificationKind::Replace => "replace",
            ModificationKind::Insert => "insert",
            ModificationKind::Delete => "delete",
        })
    }
}

/// A pending edit anchored to a range of the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modification {
    pub kind: ModificationKind,
    /// Span in the original text; zero-length for inserts
    pub range: SourceRange,
    /// Text expected at `range`; empty for inserts
    pub old_text: String,
    /// Text to put in its place; empty for deletes
    pub new_text: String,
    pub description: String,
}

/// Ordered modifications accumulated by one editor session
pub type ModificationSet = Vec<Modification>;

impl Modification {
    pub fn replace(
        range: SourceRange,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: ModificationKind::Replace,
            range,
            old_text: old_text.into(),
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    pub fn insert(range: SourceRange, new_text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ModificationKind::Insert,
            range,
            old_text: String::new(),
            new_text: new_text.into(),
            description: description.into(),
        }
    }

    pub fn delete(range: SourceRange, old_text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: ModificationKind::Delete,
            range,
            old_text: old_text.into(),
            new_text: String::new(),
            description: description.into(),
        }
    }

    pub fn byte_start(&self) -> usize {
        self.range.byte_start()
    }

    pub fn byte_end(&self) -> usize {
        self.range.byte_end()
    }
}

/// Knobs for `apply_modifications`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Relocate a drifted modification when its old text occurs exactly once on its line
    pub local_recovery: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            local_recovery: true,
        }
    }
}

/// Sort modifications by start offset in descending order for sequential application
///
/// Applying from the highest offset to the lowest means a length change never
/// moves a range that is still waiting to be applied, so no offset
/// bookkeeping is needed. Modifications starting at the same offset are
/// ordered by input position descending, which leaves several inserts at one
/// point in their input order in the output.
///
/// # Example
/// ```
/// use gradle_splice::{Modification, SourceRange, sort_modifications_descending};
/// let text = "0123456789";
/// let mods = vec![
///     Modification::replace(SourceRange::from_bytes(text, 1, 2), "1", "a", ""),
///     Modification::replace(SourceRange::from_bytes(text, 7, 8), "7", "b", ""),
///     Modification::replace(SourceRange::from_bytes(text, 4, 5), "4", "c", ""),
/// ];
/// let sorted = sort_modifications_descending(&mods);
/// assert_eq!(sorted[0].byte_start(), 7);
/// assert_eq!(sorted[1].byte_start(), 4);
/// assert_eq!(sorted[2].byte_start(), 1);
/// ```
pub fn sort_modifications_descending(mods: &[Modification]) -> Vec<Modification> {
    let mut indexed: Vec<(usize, &Modification)> = mods.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| b.byte_start().cmp(&a.byte_start()).then(ib.cmp(ia)));
    indexed.into_iter().map(|(_, m)| m.clone()).collect()
}

/// Apply modifications to the text they were recorded against
///
/// This function:
/// 1. Returns the original unchanged when there is nothing to apply
/// 2. Sorts a copy of the modifications by start offset descending
/// 3. For each one, checks the text at its range and splices the new text,
///    falling back to a unique match on the same line when the text drifted
///
/// Any invalid range or unrecoverable mismatch aborts the whole call.
pub fn apply_modifications(
    original: &str,
    mods: &[Modification],
    options: ApplyOptions,
) -> Result<String, ApplyError> {
    if mods.is_empty() {
        return Ok(original.to_string());
    }

    let mut content = original.to_string();

    for modification in sort_modifications_descending(mods) {
        let start = modification.byte_start();
        let end = modification.byte_end();

        if start > end
            || end > content.len()
            || !content.is_char_boundary(start)
            || !content.is_char_boundary(end)
        {
            return Err(ApplyError::InvalidRange {
                byte_start: start,
                byte_end: end,
                content_len: content.len(),
            });
        }

        if content.get(start..end) == Some(modification.old_text.as_str()) {
            content.replace_range(start..end, &modification.new_text);
            tracing::debug!(
                kind = %modification.kind,
                range = %modification.range,
                "applied modification"
            );
            continue;
        }

        let relocated = if options.local_recovery {
            relocate_on_line(&content, start, &modification.old_text)
        } else {
            None
        };

        let Some(at) = relocated else {
            return Err(ApplyError::TextMismatch {
                expected: modification.old_text.clone(),
                actual: content.get(start..end).unwrap_or_default().to_string(),
            });
        };

        tracing::warn!(
            recorded = start,
            relocated = at,
            "modification drifted; applying at unique match on its line"
        );
        content.replace_range(at..at + modification.old_text.len(), &modification.new_text);
    }

    Ok(content)
}

/// Absolute offset of `needle` if it occurs exactly once on the line containing `offset`
fn relocate_on_line(content: &str, offset: usize, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }

    let (line_start, line_end) = line_bounds(content, offset);
    let line = &content[line_start..line_end];

    let mut hits = line.match_indices(needle);
    let (pos, _) = hits.next()?;
    if hits.next().is_some() {
        return None;
    }

    Some(line_start + pos)
}

/// Check every modification against the original text, collecting all problems
pub fn validate_modifications(original: &str, mods: &[Modification]) -> Vec<ValidationError> {
    let content_len = original.len();
    let mut errors = Vec::new();

    for (index, modification) in mods.iter().enumerate() {
        let byte_start = modification.byte_start();
        let byte_end = modification.byte_end();

        if byte_start > byte_end {
            errors.push(ValidationError::Inverted {
                index,
                byte_start,
                byte_end,
            });
            continue;
        }

        if byte_end > content_len {
            errors.push(ValidationError::OutOfBounds {
                index,
                byte_start,
                byte_end,
                content_len,
            });
            continue;
        }

        if let Some(offset) = [byte_start, byte_end]
            .into_iter()
            .find(|&o| !original.is_char_boundary(o))
        {
            errors.push(ValidationError::NotCharBoundary { index, offset });
            continue;
        }

        match modification.kind {
            ModificationKind::Insert => {
                if byte_start != byte_end || !modification.old_text.is_empty() {
                    errors.push(ValidationError::MalformedInsert { index });
                }
            }
            ModificationKind::Replace | ModificationKind::Delete => {
                let actual = &original[byte_start..byte_end];
                if actual != modification.old_text {
                    errors.push(ValidationError::OldTextMismatch {
                        index,
                        expected: modification.old_text.clone(),
                        actual: actual.to_string(),
                    });
                }
            }
        }
    }

    for (second, b) in mods.iter().enumerate() {
        for (first, a) in mods.iter().enumerate().take(second) {
            if conflicts(a, b) {
                errors.push(ValidationError::Overlap { first, second });
            }
        }
    }

    errors
}

/// Two spans rewrite a shared byte, or an insert lands strictly inside a rewritten span
fn conflicts(a: &Modification, b: &Modification) -> bool {
    let inside = |point: &Modification, span: &Modification| {
        point.range.is_empty()
            && span.byte_start() < point.byte_start()
            && point.byte_start() < span.byte_end()
    };
    a.range.overlaps(&b.range) || inside(a, b) || inside(b, a)
}

/// Applies, validates and describes modifications recorded against one text
pub struct Serializer<'a> {
    original: &'a str,
    options: ApplyOptions,
}

impl<'a> Serializer<'a> {
    pub fn new(original: &'a str) -> Self {
        Self::with_options(original, ApplyOptions::default())
    }

    pub fn with_options(original: &'a str, options: ApplyOptions) -> Self {
        Self { original, options }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    pub fn apply(&self, mods: &[Modification]) -> Result<String, ApplyError> {
        apply_modifications(self.original, mods, self.options)
    }

    pub fn validate(&self, mods: &[Modification]) -> Vec<ValidationError> {
        validate_modifications(self.original, mods)
    }

    /// Validate first and refuse to apply anything if a problem is found
    pub fn apply_checked(&self, mods: &[Modification]) -> Result<String, ApplyError> {
        if let Some(err) = self.validate(mods).first() {
            let modification = &mods[err.index()];
            return Err(match err {
                ValidationError::OldTextMismatch {
                    expected, actual, ..
                } => ApplyError::TextMismatch {
                    expected: expected.clone(),
                    actual: actual.clone(),
                },
                _ => ApplyError::InvalidRange {
                    byte_start: modification.byte_start(),
                    byte_end: modification.byte_end(),
                    content_len: self.original.len(),
                },
            });
        }
        self.apply(mods)
    }

    pub fn diff(&self, mods: &[Modification]) -> Vec<DiffLine> {
        diff::diff(mods)
    }

    pub fn summarize(&self, mods: &[Modification]) -> Summary {
        diff::summarize(mods)
    }
}
