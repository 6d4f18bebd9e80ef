use crate::model::{Dependency, DependencyNotation, Plugin, PluginNotation, Property, Repository};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Build script flavour
///
/// Decides quoting and call style for rendered lines. Recognition accepts
/// both flavours regardless of dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Groovy DSL (`build.gradle`)
    #[default]
    Groovy,
    /// Kotlin DSL (`build.gradle.kts`)
    Kotlin,
}

impl Dialect {
    /// Get the file extensions associated with this dialect
    pub fn extensions(&self) -> &[&str] {
        match self {
            Dialect::Groovy => &["gradle"],
            Dialect::Kotlin => &["kts"],
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Dialect::Groovy => "Groovy",
            Dialect::Kotlin => "Kotlin",
        }
    }

    fn quote(&self) -> char {
        match self {
            Dialect::Groovy => '\'',
            Dialect::Kotlin => '"',
        }
    }

    /// `implementation 'g:n:v'` or `implementation("g:n:v")`
    pub fn render_dependency(&self, dep: &Dependency) -> String {
        let q = self.quote();
        match (self, dep.notation) {
            (Dialect::Groovy, DependencyNotation::Map) => {
                let mut line = format!(
                    "{} group: {q}{}{q}, name: {q}{}{q}",
                    dep.configuration, dep.group, dep.name
                );
                if let Some(version) = &dep.version {
                    line.push_str(&format!(", version: {q}{version}{q}"));
                }
                line
            }
            (Dialect::Groovy, DependencyNotation::String) => {
                format!("{} {q}{}{q}", dep.configuration, dep.coordinate())
            }
            (Dialect::Kotlin, _) => format!("{}({q}{}{q})", dep.configuration, dep.coordinate()),
        }
    }

    /// `id 'x' version 'v'`, `id("x") version "v"` or `apply plugin: 'x'`
    pub fn render_plugin(&self, plugin: &Plugin) -> String {
        let q = self.quote();
        if plugin.notation == PluginNotation::Apply {
            return match self {
                Dialect::Groovy => format!("apply plugin: {q}{}{q}", plugin.id),
                Dialect::Kotlin => format!("apply(plugin = {q}{}{q})", plugin.id),
            };
        }

        let id = match self {
            Dialect::Groovy => format!("id {q}{}{q}", plugin.id),
            Dialect::Kotlin => format!("id({q}{}{q})", plugin.id),
        };
        match &plugin.version {
            Some(version) => format!("{id} version {q}{version}{q}"),
            None => id,
        }
    }

    /// `mavenCentral()` or `maven { url '...' }`
    pub fn render_repository(&self, repo: &Repository) -> String {
        let q = self.quote();
        match (&repo.url, self) {
            (None, _) => format!("{}()", repo.name),
            (Some(url), Dialect::Groovy) => format!("maven {{ url {q}{url}{q} }}"),
            (Some(url), Dialect::Kotlin) => format!("maven {{ url = uri({q}{url}{q}) }}"),
        }
    }

    /// A property line as written inside an `ext` block
    pub fn render_property(&self, prop: &Property) -> String {
        let q = self.quote();
        match self {
            Dialect::Groovy => format!("{} = {q}{}{q}", prop.key, prop.value),
            Dialect::Kotlin => format!("set({q}{}{q}, {q}{}{q})", prop.key, prop.value),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detect the dialect from a build script path
///
/// `.kts` files are Kotlin; everything else is treated as Groovy.
///
/// # Examples
/// ```
/// use gradle_splice::{Dialect, detect_dialect};
/// assert_eq!(detect_dialect("build.gradle"), Dialect::Groovy);
/// assert_eq!(detect_dialect("app/build.gradle.kts"), Dialect::Kotlin);
/// ```
pub fn detect_dialect<P: AsRef<Path>>(path: P) -> Dialect {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    [Dialect::Kotlin, Dialect::Groovy]
        .into_iter()
        .find(|dialect| dialect.extensions().contains(&extension))
        .unwrap_or_default()
}
