//! Prompt library: built-in definitions plus workspace overrides.

use crate::builder::render_prompt;
use crate::types::PromptDefinition;
use architect_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

/// Built-in prompt definitions, embedded at compile time.
const BUILTIN_PROMPTS: [(&str, &str); 6] = [
    ("rag.expand", include_str!("../prompts/rag.expand.yml")),
    ("rag.answer", include_str!("../prompts/rag.answer.yml")),
    ("rag.critic", include_str!("../prompts/rag.critic.yml")),
    ("rag.refine", include_str!("../prompts/rag.refine.yml")),
    ("rag.verify", include_str!("../prompts/rag.verify.yml")),
    ("rag.web", include_str!("../prompts/rag.web.yml")),
];

/// A set of prompt definitions keyed by id.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library containing only the built-in prompts.
    pub fn builtin() -> AppResult<Self> {
        let mut prompts = HashMap::new();

        for (name, source) in BUILTIN_PROMPTS {
            let definition = parse_prompt(source)
                .map_err(|e| AppError::Prompt(format!("Built-in prompt '{}': {}", name, e)))?;
            prompts.insert(definition.id.clone(), definition);
        }

        Ok(Self { prompts })
    }

    /// Built-in prompts overridden by any `<id>.yml` in `.architect/prompts/`.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let mut library = Self::builtin()?;
        let prompts_dir = workspace_path.join(".architect/prompts");

        if !prompts_dir.exists() {
            return Ok(library);
        }

        for entry in walkdir::WalkDir::new(&prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("yml") {
                continue;
            }

            let contents = std::fs::read_to_string(path).map_err(|e| {
                AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
            })?;
            let definition = parse_prompt(&contents)
                .map_err(|e| AppError::Prompt(format!("Prompt file {:?}: {}", path, e)))?;

            tracing::info!("Loaded prompt override: {} ({})", definition.id, definition.title);
            library.insert(definition);
        }

        Ok(library)
    }

    /// Add or replace a definition.
    pub fn insert(&mut self, definition: PromptDefinition) {
        self.prompts.insert(definition.id.clone(), definition);
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.prompts
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Prompt not found: {}", id)))
    }

    /// Render the prompt `id` with `variables`.
    pub fn render(&self, id: &str, variables: &HashMap<String, String>) -> AppResult<String> {
        render_prompt(self.get(id)?, variables)
    }

    /// All prompt ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.prompts.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Parse and validate one YAML definition.
fn parse_prompt(source: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(source)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML: {}", e)))?;
    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Simple x.y check
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
