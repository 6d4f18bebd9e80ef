//! Structured editing sessions.
//!
//! A [`StructuredEditor`] owns one parsed [`EntityIndex`] and the list of
//! modifications requested against it. Every modification is anchored to a
//! range of the original text; nothing is applied here. Hand the result of
//! [`StructuredEditor::modifications`] to a [`crate::Serializer`] to get the
//! edited text.

use crate::dialect::Dialect;
use crate::edit::{Modification, ModificationKind, ModificationSet};
use crate::error::EditorError;
use crate::model::{
    Dependency, DependencyNotation, EntityKind, MappedEntity, Plugin, PluginNotation, Property,
    Repository,
};
use crate::parser::{EntityIndex, Parser};
use crate::position::SourceRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How to resolve a selector that matches more than one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Take the first match in document order
    #[default]
    FirstMatch,
    /// Fail with [`EditorError::Ambiguous`]
    RequireUnique,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Prefix for inserted lines
    pub indent: String,
    pub tie_break: TieBreak,
    /// Style for inserted lines and added version clauses
    pub dialect: Dialect,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            tie_break: TieBreak::default(),
            dialect: Dialect::default(),
        }
    }
}

/// Selects dependencies by coordinate, optionally narrowed to one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySelector {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub configuration: Option<String>,
}

impl DependencySelector {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            configuration: None,
        }
    }

    pub fn in_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    fn matches(&self, dep: &Dependency) -> bool {
        dep.group == self.group
            && dep.name == self.name
            && self
                .configuration
                .as_ref()
                .is_none_or(|c| *c == dep.configuration)
    }
}

impl fmt::Display for DependencySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.configuration {
            Some(configuration) => write!(f, "{} {}:{}", configuration, self.group, self.name),
            None => write!(f, "{}:{}", self.group, self.name),
        }
    }
}

/// Entity whose value `update_value` should change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    /// Dependency version
    Dependency(DependencySelector),
    /// Plugin version, by plugin id
    Plugin(String),
    /// Property value, by key
    Property(String),
    /// Repository url, by current url
    Repository(String),
}

/// Whether a session has pending modifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Accumulating,
}

/// An editing session over one parse of a build script
pub struct StructuredEditor {
    index: EntityIndex,
    modifications: ModificationSet,
    options: EditorOptions,
}

impl StructuredEditor {
    pub fn new(index: EntityIndex, options: EditorOptions) -> Self {
        Self {
            index,
            modifications: Vec::new(),
            options,
        }
    }

    /// Parse `text` with the default recognizers and open a session on it
    pub fn from_text(text: &str, options: EditorOptions) -> Self {
        Self::new(Parser::new().parse(text), options)
    }

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Pending modifications in the order they were requested
    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    pub fn snapshot(&self) -> ModificationSet {
        self.modifications.clone()
    }

    /// Drop pending modifications; in-memory entity values keep their updates
    pub fn clear(&mut self) {
        self.modifications.clear();
    }

    pub fn state(&self) -> SessionState {
        if self.modifications.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Accumulating
        }
    }

    pub fn into_parts(self) -> (EntityIndex, ModificationSet) {
        (self.index, self.modifications)
    }

    pub fn update_value(&mut self, target: &UpdateTarget, value: &str) -> Result<(), EditorError> {
        match target {
            UpdateTarget::Dependency(selector) => self.update_dependency_version(selector, value),
            UpdateTarget::Plugin(id) => self.update_plugin_version(id, value),
            UpdateTarget::Property(key) => self.update_property(key, value),
            UpdateTarget::Repository(url) => self.update_repository_url(url, value),
        }
    }

    /// Set the version of the dependency matching `selector`
    ///
    /// A no-op when the version is already `version`. A dependency declared
    /// without a version gets one appended to its coordinate.
    pub fn update_dependency_version(
        &mut self,
        selector: &DependencySelector,
        version: &str,
    ) -> Result<(), EditorError> {
        let i = select(
            &self.index.dependencies,
            "dependency",
            selector.to_string(),
            self.options.tie_break,
            |dep| selector.matches(dep),
        )?;

        let entity = &self.index.dependencies[i];
        let dep = &entity.value;
        if dep.version.as_deref() == Some(version) {
            return Ok(());
        }

        let coordinate = format!("{}:{}", dep.group, dep.name);
        let new_raw = match (&dep.version, dep.notation) {
            (Some(old), DependencyNotation::String) => {
                splice_after(&entity.raw_text, &format!("{coordinate}:"), old, version)
            }
            (Some(old), DependencyNotation::Map) => {
                splice_after(&entity.raw_text, "version", old, version)
            }
            (None, DependencyNotation::String) => {
                insert_after(&entity.raw_text, &coordinate, &format!(":{version}"))
            }
            (None, DependencyNotation::Map) => {
                let q = quote_of(&entity.raw_text);
                let name_literal = format!("{q}{}{q}", dep.name);
                insert_after(
                    &entity.raw_text,
                    &name_literal,
                    &format!(", version: {q}{version}{q}"),
                )
            }
        }
        .ok_or_else(|| EditorError::NotFound {
            kind: "dependency version",
            selector: selector.to_string(),
        })?;

        let description = format!(
            "update dependency {} {} -> {}",
            selector,
            dep.version.as_deref().unwrap_or("<none>"),
            version
        );
        let range = entity.range;
        self.record_replace(range, &new_raw, description);

        let entity = &mut self.index.dependencies[i];
        entity.value.version = Some(version.to_string());
        entity.raw_text = new_raw;
        Ok(())
    }

    /// Set the version of the plugin with `id` in the `plugins` block
    ///
    /// Plugins applied with `apply plugin:` carry no version and are not matched.
    pub fn update_plugin_version(&mut self, id: &str, version: &str) -> Result<(), EditorError> {
        let i = select(
            &self.index.plugins,
            "plugin",
            id.to_string(),
            self.options.tie_break,
            |plugin| plugin.id == id && plugin.notation == PluginNotation::Block,
        )?;

        let entity = &self.index.plugins[i];
        if entity.value.version.as_deref() == Some(version) {
            return Ok(());
        }

        let new_raw = match &entity.value.version {
            Some(old) => splice_after(&entity.raw_text, "version", old, version),
            None => {
                let q = quote_of(&entity.raw_text);
                Some(format!("{} version {q}{version}{q}", entity.raw_text))
            }
        }
        .ok_or_else(|| EditorError::NotFound {
            kind: "plugin version",
            selector: id.to_string(),
        })?;

        let description = format!(
            "update plugin {} {} -> {}",
            id,
            entity.value.version.as_deref().unwrap_or("<none>"),
            version
        );
        let range = entity.range;
        self.record_replace(range, &new_raw, description);

        let entity = &mut self.index.plugins[i];
        entity.value.version = Some(version.to_string());
        entity.raw_text = new_raw;
        Ok(())
    }

    /// Set the value of the property `key`, keeping the rest of its clause as written
    pub fn update_property(&mut self, key: &str, value: &str) -> Result<(), EditorError> {
        let i = select(
            &self.index.properties,
            "property",
            key.to_string(),
            self.options.tie_break,
            |prop| prop.key == key,
        )?;

        let entity = &self.index.properties[i];
        if entity.value.value == value {
            return Ok(());
        }

        let new_raw = splice_value(&entity.raw_text, &entity.value.value, value).ok_or_else(|| {
            EditorError::NotFound {
                kind: "property value",
                selector: key.to_string(),
            }
        })?;

        let description = format!("update property {} {} -> {}", key, entity.value.value, value);
        let range = entity.range;
        self.record_replace(range, &new_raw, description);

        let entity = &mut self.index.properties[i];
        entity.value.value = value.to_string();
        entity.raw_text = new_raw;
        Ok(())
    }

    /// Point the repository currently at `url` to `new_url`
    ///
    /// A no-op when a repository declared at `url` already points to `new_url`
    /// in this session.
    pub fn update_repository_url(&mut self, url: &str, new_url: &str) -> Result<(), EditorError> {
        let i = match select(
            &self.index.repositories,
            "repository",
            url.to_string(),
            self.options.tie_break,
            |repo| repo.url.as_deref() == Some(url),
        ) {
            Err(EditorError::NotFound { .. }) if self.repository_moved(url, new_url) => return Ok(()),
            found => found?,
        };

        let entity = &self.index.repositories[i];
        if url == new_url {
            return Ok(());
        }

        let new_raw = splice_value(&entity.raw_text, url, new_url).ok_or_else(|| EditorError::NotFound {
            kind: "repository url",
            selector: url.to_string(),
        })?;

        let description = format!("update repository {} -> {}", url, new_url);
        let range = entity.range;
        self.record_replace(range, &new_raw, description);

        let entity = &mut self.index.repositories[i];
        entity.value.url = Some(new_url.to_string());
        entity.raw_text = new_raw;
        Ok(())
    }

    /// Queue a new line at the end of the `dependencies` block
    pub fn insert_dependency(&mut self, dep: &Dependency) -> Result<(), EditorError> {
        let line = self.options.dialect.render_dependency(dep);
        let description = format!("add dependency {} {}", dep.configuration, dep.coordinate());
        self.insert_line(EntityKind::Dependency, &line, description)
    }

    /// Queue a new line at the end of the `plugins` block
    pub fn insert_plugin(&mut self, plugin: &Plugin) -> Result<(), EditorError> {
        let line = self.options.dialect.render_plugin(plugin);
        let description = format!("add plugin {}", plugin.id);
        self.insert_line(EntityKind::Plugin, &line, description)
    }

    /// Queue a new line at the end of the `repositories` block
    pub fn insert_repository(&mut self, repo: &Repository) -> Result<(), EditorError> {
        let line = self.options.dialect.render_repository(repo);
        let description = match &repo.url {
            Some(url) => format!("add repository {}", url),
            None => format!("add repository {}", repo.name),
        };
        self.insert_line(EntityKind::Repository, &line, description)
    }

    /// Queue a new line at the end of the `ext` (Groovy) or `extra.apply` (Kotlin) block
    pub fn insert_property(&mut self, prop: &Property) -> Result<(), EditorError> {
        let line = self.options.dialect.render_property(prop);
        let description = format!("add property {}", prop.key);
        self.insert_line(EntityKind::Property, &line, description)
    }

    /// Queue removal of the dependency matching `selector`
    ///
    /// Removes the whole line when the declaration is alone on it, otherwise
    /// only the declaration. The entity leaves the in-memory index.
    pub fn remove_dependency(&mut self, selector: &DependencySelector) -> Result<(), EditorError> {
        let i = select(
            &self.index.dependencies,
            "dependency",
            selector.to_string(),
            self.options.tie_break,
            |dep| selector.matches(dep),
        )?;

        let entity = &self.index.dependencies[i];
        let original = self.index.original_text();
        let declaration = &original[entity.range.byte_start()..entity.range.byte_end()];

        let (start, end) = self
            .index
            .line_span_with_newline(entity.line() - 1)
            .filter(|&(s, e)| original[s..e].trim() == declaration)
            .unwrap_or((entity.range.byte_start(), entity.range.byte_end()));

        let range = SourceRange::from_bytes(original, start, end);
        let modification = Modification::delete(
            range,
            &original[start..end],
            format!("remove dependency {}", selector),
        );

        let entity_range = entity.range;
        self.modifications
            .retain(|m| !(m.kind == ModificationKind::Replace && m.range == entity_range));
        self.modifications.push(modification);
        self.index.dependencies.remove(i);
        Ok(())
    }

    /// Whether a repository originally declared at `url` now points to `new_url`
    fn repository_moved(&self, url: &str, new_url: &str) -> bool {
        let original = self.index.original_text();
        self.index.repositories.iter().any(|entity| {
            entity.value.url.as_deref() == Some(new_url)
                && original[entity.range.byte_start()..entity.range.byte_end()].contains(url)
        })
    }

    fn block_name(&self, kind: EntityKind) -> &'static str {
        match (kind, self.options.dialect) {
            (EntityKind::Property, Dialect::Kotlin) => "extra.apply",
            _ => kind.block_name(),
        }
    }

    fn insert_line(&mut self, kind: EntityKind, rendered: &str, description: String) -> Result<(), EditorError> {
        let block = self.block_name(kind);
        let (_, close) = find_block(self.index.lines(), block).ok_or_else(|| EditorError::BlockNotFound {
            block: block.to_string(),
        })?;

        let original = self.index.original_text();
        let offset = self.index.line_starts()[close];
        let newline = if original.contains("\r\n") { "\r\n" } else { "\n" };
        let new_text = format!("{}{}{}", self.options.indent, rendered, newline);

        tracing::debug!(block, offset, "queueing insert");
        self.modifications.push(Modification::insert(
            SourceRange::point(original, offset),
            new_text,
            description,
        ));
        Ok(())
    }

    /// Queue a replace of `range`, folding into an earlier replace of the same range
    fn record_replace(&mut self, range: SourceRange, new_raw: &str, description: String) {
        let original = &self.index.original_text()[range.byte_start()..range.byte_end()];

        if let Some(pos) = self
            .modifications
            .iter()
            .position(|m| m.kind == ModificationKind::Replace && m.range == range)
        {
            if new_raw == original {
                self.modifications.remove(pos);
            } else {
                let pending = &mut self.modifications[pos];
                pending.new_text = new_raw.to_string();
                pending.description = description;
            }
            return;
        }

        self.modifications
            .push(Modification::replace(range, original, new_raw, description));
    }
}

/// Index of the entity to edit, per the tie-break policy
fn select<T>(
    entities: &[MappedEntity<T>],
    kind: &'static str,
    selector: String,
    tie_break: TieBreak,
    predicate: impl Fn(&T) -> bool,
) -> Result<usize, EditorError> {
    let matches: Vec<usize> = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| predicate(&e.value))
        .map(|(i, _)| i)
        .collect();

    match (matches.as_slice(), tie_break) {
        ([], _) => Err(EditorError::NotFound { kind, selector }),
        ([only], _) => Ok(*only),
        (many, TieBreak::RequireUnique) => Err(EditorError::Ambiguous {
            kind,
            selector,
            count: many.len(),
        }),
        ([first, ..], TieBreak::FirstMatch) => {
            tracing::warn!(
                kind,
                %selector,
                count = matches.len(),
                line = entities[*first].line(),
                "selector is ambiguous; using first match"
            );
            Ok(*first)
        }
    }
}

/// Quote character used in `raw`, preferring double quotes if present
fn quote_of(raw: &str) -> char {
    if raw.contains('"') { '"' } else { '\'' }
}

/// Replace the first `old` that follows the last `anchor` in `raw`
fn splice_after(raw: &str, anchor: &str, old: &str, new: &str) -> Option<String> {
    let from = raw.rfind(anchor)? + anchor.len();
    let at = from + raw[from..].find(old)?;
    Some(format!("{}{}{}", &raw[..at], new, &raw[at + old.len()..]))
}

/// Insert `text` right after the first `anchor` in `raw`
fn insert_after(raw: &str, anchor: &str, text: &str) -> Option<String> {
    let at = raw.find(anchor)? + anchor.len();
    Some(format!("{}{}{}", &raw[..at], text, &raw[at..]))
}

/// Replace the last quoted occurrence of `old`, or a trailing unquoted one
fn splice_value(raw: &str, old: &str, new: &str) -> Option<String> {
    let quoted = ['\'', '"']
        .into_iter()
        .filter_map(|q| raw.rfind(&format!("{q}{old}{q}")))
        .max();

    match quoted {
        Some(at) => {
            let start = at + 1;
            Some(format!("{}{}{}", &raw[..start], new, &raw[start + old.len()..]))
        }
        None => raw.strip_suffix(old).map(|head| format!("{head}{new}")),
    }
}

/// Lines (0-indexed) opening and closing the block `name { ... }`
///
/// Prefers a block opened at brace depth 0 and falls back to the first
/// nested one. A block that opens and closes on one line has no line to
/// insert before and is not returned.
pub fn find_block(lines: &[String], name: &str) -> Option<(usize, usize)> {
    let mut depth = 0i64;
    let mut in_comment = false;
    let mut candidates = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !in_comment && opens_block(line, name) {
            candidates.push((i, depth));
        }
        depth += brace_delta(line, &mut in_comment);
    }

    let open = candidates
        .iter()
        .find(|(_, d)| *d == 0)
        .or_else(|| candidates.first())
        .map(|(i, _)| *i)?;

    let mut depth = 0i64;
    let mut in_comment = false;
    for (i, line) in lines.iter().enumerate().skip(open) {
        for c in code_braces(line, &mut in_comment) {
            depth += if c == '{' { 1 } else { -1 };
            if depth == 0 {
                return (i != open).then_some((open, i));
            }
        }
    }

    None
}

fn opens_block(line: &str, name: &str) -> bool {
    line.trim_start()
        .strip_prefix(name)
        .is_some_and(|rest| rest.trim_start().starts_with('{'))
}

fn brace_delta(line: &str, in_comment: &mut bool) -> i64 {
    code_braces(line, in_comment)
        .iter()
        .map(|&c| if c == '{' { 1 } else { -1 })
        .sum()
}

/// Braces on `line` outside string literals and comments
///
/// `in_comment` carries an open `/* ... */` comment from one line to the next.
fn code_braces(line: &str, in_comment: &mut bool) -> Vec<char> {
    let mut braces = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if *in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_comment = false;
            }
            continue;
        }

        match quote {
            Some(q) => {
                if c == '\\' {
                    chars.next();
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    *in_comment = true;
                }
                '{' | '}' => braces.push(c),
                _ => {}
            },
        }
    }

    braces
}
