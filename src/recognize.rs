//! Line recognizers for build script entities.
//!
//! A recognizer looks at one line and either claims it, returning the entity
//! and the byte range of the matched text inside that line, or passes. The
//! parser owns everything else: absolute offsets, ordering, range checks.

use crate::model::{
    Dependency, DependencyNotation, Entity, EntityKind, Plugin, PluginNotation, Property,
    Repository,
};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::OnceLock;

/// A successful match on a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub entity: Entity,
    /// Byte range of the match, relative to the start of the line
    pub range: Range<usize>,
    /// Text the recognizer believes sits at `range`
    pub matched: String,
}

impl Recognition {
    fn from_decl(entity: Entity, caps: &Captures<'_>) -> Option<Self> {
        let decl = caps.name("decl")?;
        Some(Self {
            entity,
            range: decl.range(),
            matched: decl.as_str().to_string(),
        })
    }
}

/// Pluggable entity recognizer
pub trait Recognizer: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Try to recognize an entity on `line` (1-indexed `line_number`)
    fn try_match(&self, line: &str, line_number: usize) -> Option<Recognition>;
}

/// The built-in recognizers in priority order
pub fn default_recognizers() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(PropertyRecognizer),
        Box::new(DependencyRecognizer),
        Box::new(PluginRecognizer),
        Box::new(RepositoryRecognizer),
    ]
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap())
}

fn cap<'a>(caps: &'a Captures<'_>, name: &str) -> Option<&'a str> {
    caps.name(name).map(|m| m.as_str())
}

/// `ext.key = 'v'`, `def key = "v"`, `set("key", "v")`, `key=value`, ...
pub struct PropertyRecognizer;

/// Keys that look like assignments but belong to another recognizer
const RESERVED_KEYS: &[&str] = &["url", "id"];

impl Recognizer for PropertyRecognizer {
    fn kind(&self) -> EntityKind {
        EntityKind::Property
    }

    fn try_match(&self, line: &str, _line_number: usize) -> Option<Recognition> {
        static EXT: OnceLock<Regex> = OnceLock::new();
        static SET: OnceLock<Regex> = OnceLock::new();
        static ASSIGN: OnceLock<Regex> = OnceLock::new();
        static PLAIN: OnceLock<Regex> = OnceLock::new();

        let ext = regex(
            &EXT,
            r#"^\s*(?P<decl>(?:project\.)?(?:ext|extra)(?:\.(?P<dotted>[A-Za-z_][\w.]*)|\[\s*['"](?P<indexed>[^'"]+)['"]\s*\])\s*=\s*['"](?P<value>[^'"]*)['"])"#,
        );
        let set = regex(
            &SET,
            r#"^\s*(?P<decl>(?:(?:project\.)?(?:ext|extra)\.)?set\s*\(\s*['"](?P<key>[^'"]+)['"]\s*,\s*['"](?P<value>[^'"]*)['"]\s*\))"#,
        );
        let assign = regex(
            &ASSIGN,
            r#"^\s*(?P<decl>(?:(?:def|val|var)\s+)?(?P<key>[A-Za-z_][\w.]*)(?:\s*:\s*String)?\s*=\s*['"](?P<value>[^'"]*)['"])"#,
        );
        let plain = regex(
            &PLAIN,
            r#"^(?P<decl>(?P<key>[A-Za-z_][\w.\-]*)=(?P<value>[^'"\s]\S*))\s*$"#,
        );

        if let Some(caps) = ext.captures(line) {
            let key = cap(&caps, "dotted").or_else(|| cap(&caps, "indexed"))?;
            let property = Property::new(key, cap(&caps, "value")?);
            return Recognition::from_decl(Entity::Property(property), &caps);
        }

        for pattern in [set, assign, plain] {
            if let Some(caps) = pattern.captures(line) {
                let key = cap(&caps, "key")?;
                if RESERVED_KEYS.contains(&key) {
                    return None;
                }
                let property = Property::new(key, cap(&caps, "value")?);
                return Recognition::from_decl(Entity::Property(property), &caps);
            }
        }

        None
    }
}

/// `implementation 'g:n:v'`, `api("g:n")`, `testImplementation group: 'g', name: 'n', version: 'v'`
pub struct DependencyRecognizer;

impl Recognizer for DependencyRecognizer {
    fn kind(&self) -> EntityKind {
        EntityKind::Dependency
    }

    fn try_match(&self, line: &str, _line_number: usize) -> Option<Recognition> {
        static STRING: OnceLock<Regex> = OnceLock::new();
        static MAP: OnceLock<Regex> = OnceLock::new();

        let string = regex(
            &STRING,
            r#"^\s*(?P<decl>(?P<conf>[A-Za-z_]\w*)\s*\(?\s*['"](?P<group>[\w.\-]+):(?P<name>[\w.\-]+)(?::(?P<version>[^:'"\s@]+))?(?::[\w.\-]+)?(?:@\w+)?['"](?:\s*\))?)"#,
        );
        let map = regex(
            &MAP,
            r#"^\s*(?P<decl>(?P<conf>[A-Za-z_]\w*)\s*\(?\s*group\s*:\s*['"](?P<group>[^'"]+)['"]\s*,\s*name\s*:\s*['"](?P<name>[^'"]+)['"](?:\s*,\s*version\s*:\s*['"](?P<version>[^'"]+)['"])?(?:\s*\))?)"#,
        );

        let (caps, notation) = match map.captures(line) {
            Some(caps) => (caps, DependencyNotation::Map),
            None => (string.captures(line)?, DependencyNotation::String),
        };

        let configuration = cap(&caps, "conf")?;
        if matches!(configuration, "id" | "version" | "apply" | "url" | "maven") {
            return None;
        }

        let dependency = Dependency {
            configuration: configuration.to_string(),
            group: cap(&caps, "group")?.to_string(),
            name: cap(&caps, "name")?.to_string(),
            version: cap(&caps, "version").map(str::to_string),
            notation,
        };
        Recognition::from_decl(Entity::Dependency(dependency), &caps)
    }
}

/// `id 'x' version 'y'`, `id("x") version "y"`, `kotlin("jvm") version "y"`, `apply plugin: 'x'`
pub struct PluginRecognizer;

impl Recognizer for PluginRecognizer {
    fn kind(&self) -> EntityKind {
        EntityKind::Plugin
    }

    fn try_match(&self, line: &str, _line_number: usize) -> Option<Recognition> {
        static BLOCK: OnceLock<Regex> = OnceLock::new();
        static KOTLIN: OnceLock<Regex> = OnceLock::new();
        static APPLY: OnceLock<Regex> = OnceLock::new();

        let block = regex(
            &BLOCK,
            r#"^\s*(?P<decl>id\s*\(?\s*['"](?P<id>[^'"]+)['"](?:\s*\))?(?:\s+version\s*\(?\s*['"](?P<version>[^'"]+)['"](?:\s*\))?)?)"#,
        );
        let kotlin = regex(
            &KOTLIN,
            r#"^\s*(?P<decl>kotlin\s*\(\s*"(?P<module>[^"]+)"\s*\)(?:\s+version\s+"(?P<version>[^"]+)")?)"#,
        );
        let apply = regex(
            &APPLY,
            r#"^\s*(?P<decl>apply\s*\(?\s*plugin\s*[:=]\s*['"](?P<id>[^'"]+)['"](?:\s*\))?)"#,
        );

        if let Some(caps) = block.captures(line) {
            let plugin = Plugin {
                id: cap(&caps, "id")?.to_string(),
                version: cap(&caps, "version").map(str::to_string),
                notation: PluginNotation::Block,
            };
            return Recognition::from_decl(Entity::Plugin(plugin), &caps);
        }

        if let Some(caps) = kotlin.captures(line) {
            let plugin = Plugin {
                id: format!("org.jetbrains.kotlin.{}", cap(&caps, "module")?),
                version: cap(&caps, "version").map(str::to_string),
                notation: PluginNotation::Block,
            };
            return Recognition::from_decl(Entity::Plugin(plugin), &caps);
        }

        let caps = apply.captures(line)?;
        let plugin = Plugin {
            id: cap(&caps, "id")?.to_string(),
            version: None,
            notation: PluginNotation::Apply,
        };
        Recognition::from_decl(Entity::Plugin(plugin), &caps)
    }
}

/// `mavenCentral()`, `maven { url '...' }`, `maven("...")`, or a bare `url` line
pub struct RepositoryRecognizer;

impl Recognizer for RepositoryRecognizer {
    fn kind(&self) -> EntityKind {
        EntityKind::Repository
    }

    fn try_match(&self, line: &str, _line_number: usize) -> Option<Recognition> {
        static WELL_KNOWN: OnceLock<Regex> = OnceLock::new();
        static MAVEN_BLOCK: OnceLock<Regex> = OnceLock::new();
        static MAVEN_CALL: OnceLock<Regex> = OnceLock::new();
        static URL: OnceLock<Regex> = OnceLock::new();

        let well_known = regex(
            &WELL_KNOWN,
            r#"^\s*(?P<decl>(?P<name>mavenCentral|mavenLocal|google|jcenter|gradlePluginPortal)\s*\(\s*\))"#,
        );
        let maven_block = regex(
            &MAVEN_BLOCK,
            r#"^\s*(?P<decl>maven\s*\{\s*url\s*=?\s*(?:uri\s*\(\s*)?['"](?P<url>[^'"]+)['"](?:\s*\))?\s*\})"#,
        );
        let maven_call = regex(
            &MAVEN_CALL,
            r#"^\s*(?P<decl>maven\s*\(\s*(?:url\s*=\s*)?(?:uri\s*\(\s*)?['"](?P<url>[^'"]+)['"](?:\s*\))?\s*\))"#,
        );
        let url = regex(
            &URL,
            r#"^\s*(?P<decl>url\s*=?\s*(?:uri\s*\(\s*)?['"](?P<url>[^'"]+)['"](?:\s*\))?)"#,
        );

        if let Some(caps) = well_known.captures(line) {
            let repository = Repository::new(cap(&caps, "name")?, None);
            return Recognition::from_decl(Entity::Repository(repository), &caps);
        }

        for pattern in [maven_block, maven_call, url] {
            if let Some(caps) = pattern.captures(line) {
                let repository = Repository::new("maven", cap(&caps, "url"));
                return Recognition::from_decl(Entity::Repository(repository), &caps);
            }
        }

        None
    }
}
