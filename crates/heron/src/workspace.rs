use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::systems::System;

/// File tools over the directory the agent was started in: read a file, list
/// a tree, apply a string edit.
pub struct WorkspaceSystem {
    tools: Vec<Tool>,
    root: PathBuf,
}

impl WorkspaceSystem {
    pub fn new() -> Self {
        Self::with_root(std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// Root all relative paths at `root` instead of the process cwd.
    pub fn with_root(root: PathBuf) -> Self {
        let read_file_tool = Tool::new(
            "read_file",
            "Read the contents of a given relative file path. Use this when you want to see \
             what is inside a file. Do not use this with directory names.",
            json!({
                "type": "object",
                "required": ["path"],
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The relative path of a file in the working directory."
                    }
                }
            }),
        );

        let list_files_tool = Tool::new(
            "list_files",
            "List files and directories at a given path. If no path is provided, lists files \
             in the current directory.",
            json!({
                "type": "object",
                "required": [],
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Optional relative path to list files from. Defaults to the current directory."
                    }
                }
            }),
        );

        let edit_file_tool = Tool::new(
            "edit_file",
            "Make edits to a text file. Replaces 'old_str' with 'new_str' in the given file. \
             'old_str' must appear exactly once in the file and must differ from 'new_str'. \
             If the file does not exist and 'old_str' is empty, the file is created with \
             'new_str' as its content.",
            json!({
                "type": "object",
                "required": ["path", "old_str", "new_str"],
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path to the file."
                    },
                    "old_str": {
                        "type": "string",
                        "description": "Text to search for. Must match exactly one location in the file."
                    },
                    "new_str": {
                        "type": "string",
                        "description": "Text to replace old_str with."
                    }
                }
            }),
        );

        Self {
            tools: vec![read_file_tool, list_files_tool, edit_file_tool],
            root,
        }
    }

    fn resolve_path(&self, path_str: &str) -> PathBuf {
        let path = Path::new(path_str);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn require_str<'a>(params: &'a Value, key: &str) -> AgentResult<&'a str> {
        params
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::InvalidParameters(format!("Missing '{}' parameter", key)))
    }

    async fn read_file(&self, params: Value) -> AgentResult<String> {
        let path = self.resolve_path(Self::require_str(&params, "path")?);

        std::fs::read_to_string(&path)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to read file: {}", e)))
    }

    async fn list_files(&self, params: Value) -> AgentResult<String> {
        let path_str = params.get("path").and_then(|v| v.as_str()).unwrap_or("");
        let dir = if path_str.is_empty() {
            self.root.clone()
        } else {
            self.resolve_path(path_str)
        };

        if !dir.is_dir() {
            return Err(AgentError::InvalidParameters(format!(
                "The directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut entries = Vec::new();
        walk(&dir, &dir, &mut entries)?;
        entries.sort();

        serde_json::to_string(&entries)
            .map_err(|e| AgentError::Internal(format!("Failed to encode listing: {}", e)))
    }

    async fn edit_file(&self, params: Value) -> AgentResult<String> {
        let path_str = Self::require_str(&params, "path")?;
        let old_str = Self::require_str(&params, "old_str")?;
        let new_str = Self::require_str(&params, "new_str")?;

        if path_str.is_empty() {
            return Err(AgentError::InvalidParameters(
                "'path' must not be empty".into(),
            ));
        }
        if old_str == new_str {
            return Err(AgentError::InvalidParameters(
                "'old_str' and 'new_str' must differ".into(),
            ));
        }

        let path = self.resolve_path(path_str);

        if !path.exists() {
            if old_str.is_empty() {
                return self.create_file(&path, new_str);
            }
            return Err(AgentError::ExecutionError(format!(
                "File '{}' does not exist",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to read file: {}", e)))?;

        // Require exactly one match so the model can't silently clobber
        // repeated occurrences it did not see.
        match content.matches(old_str).count() {
            0 => {
                return Err(AgentError::InvalidParameters(
                    "'old_str' was not found in the file".into(),
                ))
            }
            1 => {}
            n => {
                return Err(AgentError::InvalidParameters(format!(
                    "'old_str' appears {} times in the file, it must appear exactly once",
                    n
                )))
            }
        }

        let new_content = content.replacen(old_str, new_str, 1);
        std::fs::write(&path, new_content)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to write file: {}", e)))?;

        Ok("Successfully replaced text".to_string())
    }

    fn create_file(&self, path: &Path, content: &str) -> AgentResult<String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AgentError::ExecutionError(format!("Failed to create directory: {}", e))
                })?;
            }
        }
        std::fs::write(path, content)
            .map_err(|e| AgentError::ExecutionError(format!("Failed to write file: {}", e)))?;

        Ok(format!("Successfully created file {}", path.display()))
    }
}

impl Default for WorkspaceSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect paths under `dir` relative to `root`, directories marked with a
/// trailing slash.
fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> AgentResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| AgentError::ExecutionError(format!("Failed to read directory: {}", e)))?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            AgentError::ExecutionError(format!("Failed to read directory entry: {}", e))
        })?;
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(&path);

        if path.is_dir() {
            out.push(format!("{}/", rel.display()));
            walk(root, &path, out)?;
        } else {
            out.push(rel.display().to_string());
        }
    }
    Ok(())
}

#[async_trait]
impl System for WorkspaceSystem {
    fn name(&self) -> &str {
        "workspace"
    }

    fn description(&self) -> &str {
        "A system that reads, lists and edits files in the working directory"
    }

    fn instructions(&self) -> &str {
        "Use read_file to inspect a file, list_files to explore the tree, and edit_file to \
         change file contents. Read a file before editing it so your edits match the text \
         exactly."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<String> {
        match tool_call.name.as_str() {
            "read_file" => self.read_file(tool_call.arguments).await,
            "list_files" => self.list_files(tool_call.arguments).await,
            "edit_file" => self.edit_file(tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}
