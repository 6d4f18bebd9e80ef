//! Source-mapped parsing.
//!
//! Runs the recognizers over every line of a build script and binds each
//! recognized entity to the exact byte range it was read from.

use crate::model::{Dependency, Entity, MappedEntity, Plugin, Property, Repository};
use crate::position::{SourceRange, line_starts};
use crate::recognize::{Recognizer, default_recognizers};
use std::fmt;

/// A recognizer match the parser refused to index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-indexed line of the rejected match
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Every entity found in one parse, in document order per kind
#[derive(Debug, Clone, Default)]
pub struct EntityIndex {
    pub dependencies: Vec<MappedEntity<Dependency>>,
    pub plugins: Vec<MappedEntity<Plugin>>,
    pub repositories: Vec<MappedEntity<Repository>>,
    pub properties: Vec<MappedEntity<Property>>,
    original_text: String,
    lines: Vec<String>,
    line_starts: Vec<usize>,
    warnings: Vec<ParseWarning>,
}

impl EntityIndex {
    /// The text this index was built from
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Source split on `\n`
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Byte offset at which each line starts
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Total number of indexed entities
    pub fn len(&self) -> usize {
        self.dependencies.len() + self.plugins.len() + self.repositories.len() + self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range of line `index` (0-indexed), including its trailing newline
    pub fn line_span_with_newline(&self, index: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.original_text.len());
        Some((start, end))
    }
}

/// Drives an ordered list of recognizers over build script text
pub struct Parser {
    recognizers: Vec<Box<dyn Recognizer>>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parser with the built-in property, dependency, plugin and repository recognizers
    pub fn new() -> Self {
        Self::with_recognizers(default_recognizers())
    }

    /// Parser trying `recognizers` in the given order
    pub fn with_recognizers(recognizers: Vec<Box<dyn Recognizer>>) -> Self {
        Self { recognizers }
    }

    /// Append a recognizer with the lowest priority
    pub fn push(&mut self, recognizer: Box<dyn Recognizer>) {
        self.recognizers.push(recognizer);
    }

    /// Parse `text` into a position-mapped entity index
    ///
    /// Lines matching no recognizer are skipped. A match whose reported range
    /// does not slice back to the reported text is dropped with a warning.
    pub fn parse(&self, text: &str) -> EntityIndex {
        let mut index = EntityIndex {
            original_text: text.to_string(),
            lines: text.split('\n').map(str::to_string).collect(),
            line_starts: line_starts(text),
            ..EntityIndex::default()
        };

        let mut line_start = 0;
        for (i, line) in text.split('\n').enumerate() {
            let line_number = i + 1;

            if is_comment(line) {
                tracing::trace!(line = line_number, "skipping comment line");
            } else if let Some(found) = self
                .recognizers
                .iter()
                .find_map(|r| r.try_match(line, line_number))
            {
                match line.get(found.range.clone()) {
                    Some(slice) if slice == found.matched => {
                        let range = SourceRange::from_bytes(
                            text,
                            line_start + found.range.start,
                            line_start + found.range.end,
                        );
                        tracing::debug!(
                            line = line_number,
                            kind = %found.entity.kind(),
                            range = %range,
                            "recognized entity"
                        );
                        index.push(found.entity, range, found.matched);
                    }
                    actual => {
                        let message = format!(
                            "{} match {:?} does not occur at {}..{} (found {:?})",
                            found.entity.kind(),
                            found.matched,
                            found.range.start,
                            found.range.end,
                            actual.unwrap_or("<out of range>")
                        );
                        tracing::warn!(line = line_number, "dropping entity: {}", message);
                        index.warnings.push(ParseWarning {
                            line: line_number,
                            message,
                        });
                    }
                }
            }

            line_start += line.len() + 1; // +1 for newline
        }

        index
    }
}

impl EntityIndex {
    fn push(&mut self, entity: Entity, range: SourceRange, raw_text: String) {
        match entity {
            Entity::Dependency(v) => self.dependencies.push(MappedEntity::new(v, range, raw_text)),
            Entity::Plugin(v) => self.plugins.push(MappedEntity::new(v, range, raw_text)),
            Entity::Repository(v) => self.repositories.push(MappedEntity::new(v, range, raw_text)),
            Entity::Property(v) => self.properties.push(MappedEntity::new(v, range, raw_text)),
        }
    }
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with('#')
}

/// Parse with the default recognizers
pub fn parse(text: &str) -> EntityIndex {
    Parser::new().parse(text)
}
