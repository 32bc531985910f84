//! `kippo commands`: list the sub-commands and their aliases.

use anyhow::Result;
use kippo_commands::{default_registry, CommandRegistry};

use crate::runtime::Runtime;
use crate::terminal_output::{render_table, Column};

const FALLBACK_SLASH_COMMAND: &str = "/kippo";

pub fn run(runtime: &Runtime) -> Result<()> {
    let registry = default_registry()?;
    let slash = runtime
        .config
        .organizations
        .first()
        .map(|org| {
            let name = org.slack_command_name.trim_start_matches('/');
            format!("/{name}")
        })
        .filter(|slash| slash.len() > 1)
        .unwrap_or_else(|| FALLBACK_SLASH_COMMAND.to_string());
    print!("{}", render(&registry, &slash));
    Ok(())
}

fn render(registry: &CommandRegistry, slash_command: &str) -> String {
    let columns = [
        Column::left("Name"),
        Column::left("Aliases").max_width(40),
        Column::left("Description").max_width(80),
    ];
    let rows: Vec<Vec<String>> = registry
        .list_all()
        .map(|d| {
            vec![
                d.name.to_string(),
                d.aliases_display(),
                d.description_for(slash_command),
            ]
        })
        .collect();
    render_table(&columns, &rows)
}
