//! Prompt rendering.

use crate::types::PromptDefinition;
use architect_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a prompt definition with the given variables.
///
/// Every variable the definition declares must be supplied. Rendering runs
/// in strict mode, so a template referencing an undeclared, unsupplied
/// variable fails too.
///
/// # Example
/// ```no_run
/// use architect_prompt::{render_prompt, PromptLibrary};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let library = PromptLibrary::builtin()?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is Omniverse?".to_string());
/// vars.insert("count".to_string(), "3".to_string());
///
/// let prompt = render_prompt(library.get("rag.expand")?, &vars)?;
/// println!("{}", prompt);
/// # Ok(())
/// # }
/// ```
pub fn render_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    if let Some(missing) = definition
        .variables
        .iter()
        .find(|name| !variables.contains_key(name.as_str()))
    {
        return Err(AppError::Prompt(format!(
            "Prompt '{}' is missing variable '{}'",
            definition.id, missing
        )));
    }

    render_template(&definition.id, &definition.template, variables)
}

/// Render a Handlebars template with variables.
fn render_template(
    name: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template '{}': {}", name, e)))?;

    handlebars
        .render(name, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", name, e)))
}
