// Position tracking module
pub mod position;

// Entity model
pub mod model;

// Line recognizers
pub mod recognize;

// Source-mapped parser
pub mod parser;

// Structured editor
pub mod editor;

// Modification application engine
pub mod edit;

// Diff and summary rendering
pub mod diff;

// Error types
pub mod error;

// Groovy/Kotlin dialect handling
pub mod dialect;

// Configuration module
pub mod config;

// File operations module
pub mod file;

// JSON request/response module
pub mod json;

// Re-exports
pub use position::{SourcePosition, SourceRange, byte_to_line_column};
pub use model::{
    Dependency, DependencyNotation, Entity, EntityKind, MappedEntity, Plugin, PluginNotation,
    Property, Repository,
};
pub use recognize::{Recognition, Recognizer, default_recognizers};
pub use parser::{EntityIndex, ParseWarning, Parser, parse};
pub use editor::{
    DependencySelector, EditorOptions, SessionState, StructuredEditor, TieBreak, UpdateTarget,
    find_block,
};
pub use edit::{
    ApplyOptions, Modification, ModificationKind, ModificationSet, Serializer,
    apply_modifications, sort_modifications_descending, validate_modifications,
};
pub use diff::{DiffKind, DiffLine, Summary, diff, render_diff, summarize};
pub use error::{ApplyError, EditorError, ValidationError};
pub use dialect::{Dialect, detect_dialect};
pub use config::{Config, ConfigError};
pub use file::{FileContent, FileError, checksum, read_file, write_file};
pub use json::{EditRequest, EditResponse, Execution, Operation, OperationFailure, execute, generate_execution_id};
