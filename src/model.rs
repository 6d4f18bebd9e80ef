use crate::position::SourceRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of entity a recognizer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Property,
    Dependency,
    Plugin,
    Repository,
}

impl EntityKind {
    /// Name of the structural block that holds entities of this kind
    pub fn block_name(&self) -> &'static str {
        match self {
            EntityKind::Property => "ext",
            EntityKind::Dependency => "dependencies",
            EntityKind::Plugin => "plugins",
            EntityKind::Repository => "repositories",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Property => "property",
            EntityKind::Dependency => "dependency",
            EntityKind::Plugin => "plugin",
            EntityKind::Repository => "repository",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a dependency coordinate is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyNotation {
    /// `implementation 'group:name:version'`
    #[default]
    String,
    /// `implementation group: 'g', name: 'n', version: 'v'`
    Map,
}

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Scope the dependency is declared under (`implementation`, `api`, ...)
    pub configuration: String,
    pub group: String,
    pub name: String,
    /// Absent when the version comes from a platform or BOM
    pub version: Option<String>,
    #[serde(default)]
    pub notation: DependencyNotation,
}

impl Dependency {
    pub fn new(
        configuration: impl Into<String>,
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<&str>,
    ) -> Self {
        Self {
            configuration: configuration.into(),
            group: group.into(),
            name: name.into(),
            version: version.map(str::to_string),
            notation: DependencyNotation::String,
        }
    }

    /// `group:name[:version]`
    pub fn coordinate(&self) -> String {
        match &self.version {
            Some(version) => format!("{}:{}:{}", self.group, self.name, version),
            None => format!("{}:{}", self.group, self.name),
        }
    }
}

/// How a plugin is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginNotation {
    /// `id 'x' version 'y'` inside a `plugins` block
    #[default]
    Block,
    /// Legacy `apply plugin: 'x'`
    Apply,
}

/// A declared plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    pub version: Option<String>,
    #[serde(default)]
    pub notation: PluginNotation,
}

impl Plugin {
    pub fn new(id: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            id: id.into(),
            version: version.map(str::to_string),
            notation: PluginNotation::Block,
        }
    }
}

/// A declared artifact repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `mavenCentral`, `google`, ... or `maven` for custom repositories
    pub name: String,
    pub url: Option<String>,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            name: name.into(),
            url: url.map(str::to_string),
        }
    }
}

/// A `key = value` property declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Any recognized entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Dependency(Dependency),
    Plugin(Plugin),
    Repository(Repository),
    Property(Property),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Dependency(_) => EntityKind::Dependency,
            Entity::Plugin(_) => EntityKind::Plugin,
            Entity::Repository(_) => EntityKind::Repository,
            Entity::Property(_) => EntityKind::Property,
        }
    }
}

/// An entity bound to the exact span of source it was read from
///
/// `raw_text` equals the original text sliced at `range` when the entity is
/// created. The editor later rewrites `value` and `raw_text` in memory but
/// never `range`, which always refers to the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedEntity<T> {
    pub value: T,
    pub range: SourceRange,
    pub raw_text: String,
}

impl<T> MappedEntity<T> {
    pub fn new(value: T, range: SourceRange, raw_text: impl Into<String>) -> Self {
        Self {
            value,
            range,
            raw_text: raw_text.into(),
        }
    }

    /// 1-indexed line the entity starts on
    pub fn line(&self) -> usize {
        self.range.start.line
    }
}
