//! Model management commands for Parley
//!
//! Lists the models installed on the backend, shows the configured model,
//! and saves a new active model. A saved change only takes effect after a
//! restart; the interactive menu performs that restart itself.

use crate::app::AppContext;
use crate::commands::display::{format_size, print_error};
use crate::commands::prompt::{Prompted, Prompter};
use crate::commands::Flow;
use crate::config::ConfigChange;
use crate::error::{ParleyError, Result};
use crate::providers::ModelInfo;
use colored::Colorize;
use prettytable::{format, row, Table};

/// List models installed on the backend
///
/// # Examples
///
/// ```no_run
/// use parley::app::AppContext;
/// use parley::commands::models::list_models;
/// use parley::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let app = AppContext::from_config(Config::default(), "config/config.yaml")?;
/// list_models(&app, false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn list_models(app: &AppContext, json: bool) -> Result<()> {
    tracing::info!(host = %app.config.ollama.host, "Listing models");
    let models = app.provider.list_models().await?;

    if json {
        let json = serde_json::to_string_pretty(&models).map_err(ParleyError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    if models.is_empty() {
        println!("{}", "No models found. Run 'ollama pull <model>'".red());
        return Ok(());
    }

    output_models_table(&models, app.model());
    Ok(())
}

/// Show the configured model
pub fn show_current_model(app: &AppContext) {
    println!("\nCurrent Model Information\n");
    println!("Host:           {}", app.config.ollama.host);
    println!("Active Model:   {}", app.model());
    println!();
}

/// Save `name` as the active model after checking it is installed
///
/// # Errors
///
/// Returns `ParleyError::NotFound` when the backend does not have the model.
pub async fn set_model(app: &AppContext, name: &str) -> Result<ConfigChange> {
    let name = name.trim();
    let models = app.provider.list_models().await?;
    if !models.iter().any(|m| m.name == name) {
        return Err(ParleyError::NotFound(format!(
            "Model '{}' is not installed; run 'ollama pull {}'",
            name, name
        ))
        .into());
    }

    let change = apply_model_change(app, name).await?;
    match &change {
        ConfigChange::Unchanged => println!("{}", format!("Already using '{}'.", name).yellow()),
        ConfigChange::RestartRequired { current, .. } => println!(
            "{}",
            format!("Saved '{}'. It will be used from the next start.", current).green()
        ),
    }
    Ok(change)
}

/// Resolve a selection typed at the model picker: a 1-based number or an
/// exact model name
///
/// # Errors
///
/// Returns `ParleyError::InvalidInput` when nothing matches.
pub fn select_model(input: &str, models: &[ModelInfo]) -> std::result::Result<String, ParleyError> {
    let choice = input.trim();
    if let Ok(number) = choice.parse::<usize>() {
        if let Some(model) = number.checked_sub(1).and_then(|i| models.get(i)) {
            return Ok(model.name.clone());
        }
    }
    models
        .iter()
        .find(|m| m.name == choice)
        .map(|m| m.name.clone())
        .ok_or_else(|| ParleyError::InvalidInput(format!("Invalid model: {}", choice)))
}

/// Persist the model and release the previous one on the backend
async fn apply_model_change(app: &AppContext, model: &str) -> Result<ConfigChange> {
    let change = app.config.persist_model(&app.config_path, model)?;
    if let ConfigChange::RestartRequired { previous, .. } = &change {
        if let Err(e) = app.provider.unload_model(previous).await {
            tracing::warn!(model = %previous, "Failed to unload previous model: {}", e);
        }
    }
    Ok(change)
}

/// Interactive model picker
pub(crate) async fn switch_model_menu(app: &AppContext, prompter: &mut Prompter) -> Result<Flow> {
    println!("\n{}", "Available Models:".bold());
    let models = match app.provider.list_models().await {
        Ok(models) => models,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };
    if models.is_empty() {
        println!("{}", "No models found. Run 'ollama pull <model>'".red());
        return Ok(Flow::Back);
    }

    for (i, model) in models.iter().enumerate() {
        let status = if model.name == app.model() {
            "active".green().to_string()
        } else {
            String::new()
        };
        println!(
            "{} {} {}",
            format!("{}.", i + 1).yellow(),
            model.name.magenta(),
            status
        );
    }

    let line = match prompter.read("\nEnter model name or # (or 'exit'): ")? {
        Prompted::Exit => return Ok(Flow::Exit),
        Prompted::Line(line) => line,
    };
    if line.is_empty() {
        return Ok(Flow::Back);
    }

    let selected = match select_model(&line, &models) {
        Ok(selected) => selected,
        Err(e) => {
            print_error(e);
            return Ok(Flow::Back);
        }
    };

    match apply_model_change(app, &selected).await {
        Ok(ConfigChange::Unchanged) => {
            println!("{}", format!("Already using '{}'.", selected).yellow());
            Ok(Flow::Back)
        }
        Ok(ConfigChange::RestartRequired { .. }) => {
            println!(
                "{}",
                format!("Switching to '{}'... restarting.", selected).yellow()
            );
            Ok(Flow::Restart)
        }
        Err(e) => {
            print_error(e);
            Ok(Flow::Back)
        }
    }
}

/// Output models in table format
fn output_models_table(models: &[ModelInfo], active: &str) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["#", "Model Name", "Size", "Modified", ""]);

    for (i, model) in models.iter().enumerate() {
        let marker = if model.name == active { "active" } else { "" };
        table.add_row(row![
            i + 1,
            model.name,
            format_size(model.size),
            model.modified_at,
            marker
        ]);
    }

    println!("\nAvailable models:\n");
    table.printstd();
    println!();
}
