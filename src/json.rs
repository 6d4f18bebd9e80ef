//! JSON wire format for operation requests and their responses.

use crate::diff::{DiffLine, Summary};
use crate::edit::{ApplyOptions, Serializer};
use crate::editor::{DependencySelector, EditorOptions, StructuredEditor};
use crate::error::EditorError;
use crate::file::{FileContent, checksum};
use crate::model::{Dependency, DependencyNotation, Plugin, PluginNotation, Property, Repository};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A batch of operations against one build script
#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    /// Caller supplied id, or "auto" to generate one
    #[serde(default = "auto")]
    pub execution_id: String,
    /// BLAKE3 hex of the file the operations were written against
    #[serde(default)]
    pub expected_checksum: Option<String>,
    pub operations: Vec<Operation>,
}

fn auto() -> String {
    "auto".to_string()
}

/// One requested edit
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    UpdateDependency {
        group: String,
        name: String,
        #[serde(default)]
        configuration: Option<String>,
        version: String,
    },
    UpdatePlugin {
        id: String,
        version: String,
    },
    UpdateProperty {
        key: String,
        value: String,
    },
    UpdateRepository {
        url: String,
        new_url: String,
    },
    AddDependency {
        configuration: String,
        group: String,
        name: String,
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        notation: DependencyNotation,
    },
    AddPlugin {
        id: String,
        #[serde(default)]
        version: Option<String>,
    },
    AddRepository {
        name: String,
        #[serde(default)]
        url: Option<String>,
    },
    AddProperty {
        key: String,
        value: String,
    },
    RemoveDependency {
        group: String,
        name: String,
        #[serde(default)]
        configuration: Option<String>,
    },
}

fn selector(group: &str, name: &str, configuration: &Option<String>) -> DependencySelector {
    DependencySelector {
        group: group.to_string(),
        name: name.to_string(),
        configuration: configuration.clone(),
    }
}

impl Operation {
    /// Record this operation in `editor`
    pub fn apply_to(&self, editor: &mut StructuredEditor) -> Result<(), EditorError> {
        match self {
            Operation::UpdateDependency {
                group,
                name,
                configuration,
                version,
            } => editor.update_dependency_version(&selector(group, name, configuration), version),
            Operation::UpdatePlugin { id, version } => editor.update_plugin_version(id, version),
            Operation::UpdateProperty { key, value } => editor.update_property(key, value),
            Operation::UpdateRepository { url, new_url } => editor.update_repository_url(url, new_url),
            Operation::AddDependency {
                configuration,
                group,
                name,
                version,
                notation,
            } => editor.insert_dependency(&Dependency {
                configuration: configuration.clone(),
                group: group.clone(),
                name: name.clone(),
                version: version.clone(),
                notation: *notation,
            }),
            Operation::AddPlugin { id, version } => editor.insert_plugin(&Plugin {
                id: id.clone(),
                version: version.clone(),
                notation: PluginNotation::Block,
            }),
            Operation::AddRepository { name, url } => {
                editor.insert_repository(&Repository::new(name.as_str(), url.as_deref()))
            }
            Operation::AddProperty { key, value } => {
                editor.insert_property(&Property::new(key.as_str(), value.as_str()))
            }
            Operation::RemoveDependency {
                group,
                name,
                configuration,
            } => editor.remove_dependency(&selector(group, name, configuration)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::UpdateDependency { group, name, version, .. } => {
                write!(f, "update_dependency {}:{} -> {}", group, name, version)
            }
            Operation::UpdatePlugin { id, version } => write!(f, "update_plugin {} -> {}", id, version),
            Operation::UpdateProperty { key, value } => write!(f, "update_property {} -> {}", key, value),
            Operation::UpdateRepository { url, new_url } => {
                write!(f, "update_repository {} -> {}", url, new_url)
            }
            Operation::AddDependency { group, name, .. } => write!(f, "add_dependency {}:{}", group, name),
            Operation::AddPlugin { id, .. } => write!(f, "add_plugin {}", id),
            Operation::AddRepository { name, url } => {
                write!(f, "add_repository {}", url.as_deref().unwrap_or(name))
            }
            Operation::AddProperty { key, .. } => write!(f, "add_property {}", key),
            Operation::RemoveDependency { group, name, .. } => {
                write!(f, "remove_dependency {}:{}", group, name)
            }
        }
    }
}

/// An operation the editor rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    /// Position of the operation in the request
    pub index: usize,
    pub operation: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditResponse {
    pub execution_id: String,
    pub success: bool,
    pub original_checksum: String,
    pub final_checksum: String,
    pub applied_count: usize,
    pub failed_count: usize,
    pub summary: Option<Summary>,
    pub diff: Vec<DiffLine>,
    pub failures: Vec<OperationFailure>,
    pub error: Option<String>,
}

impl EditResponse {
    pub fn failure(execution_id: String, original_checksum: String, error: String) -> Self {
        Self {
            execution_id,
            success: false,
            final_checksum: original_checksum.clone(),
            original_checksum,
            applied_count: 0,
            failed_count: 0,
            summary: None,
            diff: Vec::new(),
            failures: Vec::new(),
            error: Some(error),
        }
    }
}

/// Generate a fresh execution id (UUID v4)
pub fn generate_execution_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Response plus the edited text, present only when every operation succeeded
#[derive(Debug, Clone)]
pub struct Execution {
    pub response: EditResponse,
    pub content: Option<String>,
}

/// Run every operation of `request` against `file` and apply the result
///
/// Rejected operations are reported and skipped; the others still run. The
/// edited text is returned only when nothing was rejected and applying
/// succeeded.
pub fn execute(
    request: &EditRequest,
    file: &FileContent,
    editor_options: EditorOptions,
    apply_options: ApplyOptions,
) -> Execution {
    let execution_id = if request.execution_id == "auto" {
        generate_execution_id()
    } else {
        request.execution_id.clone()
    };

    if let Some(expected) = &request.expected_checksum {
        if *expected != file.checksum {
            let error = format!("Checksum mismatch: expected {}, got {}", expected, file.checksum);
            return Execution {
                response: EditResponse::failure(execution_id, file.checksum.clone(), error),
                content: None,
            };
        }
    }

    let mut editor = StructuredEditor::from_text(&file.content, editor_options);
    let mut failures = Vec::new();

    for (index, operation) in request.operations.iter().enumerate() {
        if let Err(err) = operation.apply_to(&mut editor) {
            tracing::warn!(index, %operation, "operation rejected: {}", err);
            failures.push(OperationFailure {
                index,
                operation: operation.to_string(),
                error: err.to_string(),
            });
        }
    }

    let serializer = Serializer::with_options(&file.content, apply_options);
    let mods = editor.modifications();

    let new_content = match serializer.apply(mods) {
        Ok(content) => content,
        Err(err) => {
            return Execution {
                response: EditResponse::failure(
                    execution_id,
                    file.checksum.clone(),
                    format!("Failed to apply modifications: {}", err),
                ),
                content: None,
            };
        }
    };

    let success = failures.is_empty();
    let response = EditResponse {
        execution_id,
        success,
        original_checksum: file.checksum.clone(),
        final_checksum: checksum(&new_content),
        applied_count: mods.len(),
        failed_count: failures.len(),
        summary: Some(serializer.summarize(mods)),
        diff: serializer.diff(mods),
        failures,
        error: (!success).then(|| "One or more operations were rejected".to_string()),
    };

    Execution {
        response,
        content: success.then_some(new_content),
    }
}
