//! Assembly of the final script.

use crate::Shell;
use crate::context::Context;
use crate::error::{GenerateError, Result};

/// The backend-specific parts of a script.
#[derive(Debug, Default)]
pub struct Sections {
    /// Line that must come first (`#compdef` for Zsh).
    pub header: Option<String>,
    /// Node functions and other generated code.
    pub body: String,
    /// Code that hooks the script into the shell.
    pub registration: String,
}

const NOTICE: &str = "\
# This completion script was generated by completion-schema.
# Changes made by hand will be lost when it is regenerated.";

fn modeline(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash => "# vim: ft=sh ts=2 sts=2 sw=2 et",
        Shell::Fish => "# vim: ft=fish ts=4 sts=4 sw=4 et",
        Shell::Zsh => "# vim: ft=zsh ts=2 sts=2 sw=2 et",
    }
}

/// Joins header, notice, includes, helpers, body, registration and modeline.
pub fn assemble(ctx: &Context<'_>, sections: Sections) -> Result<String> {
    let mut parts: Vec<String> = Vec::new();

    let mut top = String::new();
    if let Some(header) = sections.header {
        top.push_str(&header);
        top.push('\n');
    }
    top.push_str(NOTICE);
    parts.push(top);

    for path in &ctx.config.include_files {
        let content = std::fs::read_to_string(path).map_err(|source| GenerateError::Include {
            path: path.clone(),
            source,
        })?;
        parts.push(content.trim_end().to_string());
    }

    let helpers = ctx
        .helpers
        .render()
        .map_err(|e| GenerateError::Internal(format!("helper template: {e}")))?;
    parts.push(helpers);
    parts.push(sections.body.trim_end().to_string());
    parts.push(sections.registration.trim_end().to_string());
    if ctx.config.vim_modeline {
        parts.push(modeline(ctx.shell).to_string());
    }

    let mut script = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    script.push('\n');
    Ok(script)
}
