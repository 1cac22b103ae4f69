//! Commands changing the persisted configuration: recurring meetings, known projects and aliases.

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use crate::{
    engine::{
        calendar::{remove_rule, upsert_rule, DayToken, ObligationRule},
        error::TrackError,
    },
    storage::json_store::Store,
    utils::percentage::Amount,
};

use super::Session;

#[derive(Subcommand, Debug)]
pub enum MeetingCommand {
    #[command(
        about = "Add a recurring meeting or update the one with the same name. Days are comma separated: mon,tue,wed,thu,fri,sat,sun,daily,weekdays"
    )]
    Add {
        name: String,
        amount: Amount,
        days: String,
    },
    #[command(alias = "remove", about = "Remove a recurring meeting")]
    Rm { name: String },
    #[command(about = "List recurring meetings")]
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProjectsCommand {
    #[command(about = "Replace known projects with a comma separated list")]
    Set { list: String },
    #[command(
        about = "Take known projects from a pasted spreadsheet header. The first and last columns are dropped and aliases are generated"
    )]
    Parse { header: String },
    #[command(about = "List every project found in tracked time")]
    List,
}

#[derive(Subcommand, Debug)]
pub enum AliasCommand {
    #[command(about = "Point a short alias at a project")]
    Set {
        alias: String,
        #[arg(required = true, num_args = 1..)]
        project: Vec<String>,
    },
    #[command(alias = "remove", about = "Remove an alias")]
    Rm { alias: String },
    #[command(about = "List aliases")]
    List,
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(|v| v.trim().to_string()).collect()
}

fn format_days(days: &[DayToken]) -> String {
    days.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

pub async fn process_meeting_command<S: Store>(
    session: &mut Session<S>,
    command: MeetingCommand,
) -> Result<()> {
    match command {
        MeetingCommand::Add { name, amount, days } => {
            let active_days = DayToken::parse_list(&days)?;
            if active_days.is_empty() {
                return Err(TrackError::InvalidDayToken(days).into());
            }
            let capacity_percent = amount.to_percentage();
            let message = format!(
                "recurring meeting: {name} ({capacity_percent} on {})",
                format_days(&active_days)
            );
            let updated = upsert_rule(
                &mut session.settings.obligations,
                ObligationRule {
                    name,
                    capacity_percent,
                    active_days,
                },
            );
            session.save_settings().await?;
            info!("Saved {message}");
            if updated {
                println!("Updated {message}");
            } else {
                println!("Added {message}");
            }
        }
        MeetingCommand::Rm { name } => {
            remove_rule(&mut session.settings.obligations, &name)?;
            session.save_settings().await?;
            info!("Removed recurring meeting {name}");
            println!("Removed recurring meeting: {name}");
        }
        MeetingCommand::List => {
            if session.settings.obligations.is_empty() {
                println!("No recurring meetings configured");
            }
            for rule in &session.settings.obligations {
                println!(
                    "{}: {} ({:.2} hours) on {}",
                    rule.name,
                    rule.capacity_percent,
                    rule.capacity_percent.as_hours(),
                    format_days(&rule.active_days)
                );
            }
        }
    }
    Ok(())
}

pub async fn process_projects_command<S: Store>(
    session: &mut Session<S>,
    command: ProjectsCommand,
) -> Result<()> {
    match command {
        ProjectsCommand::Set { list } => {
            let projects = split_list(&list);
            let count = projects.len();
            session.settings.registry.set_projects(projects);
            session.save_settings().await?;
            println!("Set {count} project columns");
        }
        ProjectsCommand::Parse { header } => {
            let mut columns = split_list(&header);
            if columns.len() > 2 {
                columns = columns[1..columns.len() - 1].to_vec();
            }
            let created = session.settings.registry.adopt_projects(columns);
            session.save_settings().await?;
            info!("Adopted {} projects", created.len());
            println!("Set {} project columns with aliases:", created.len());
            for (alias, project) in created {
                println!("  {alias} → {project}");
            }
        }
        ProjectsCommand::List => {
            let projects = session.book.projects();
            if projects.is_empty() {
                println!("No projects found in tracked time");
                return Ok(());
            }
            println!("Projects (auto-discovered from your time tracking):");
            for (index, project) in projects.iter().enumerate() {
                println!("{}. {project}", index + 1);
            }
        }
    }
    Ok(())
}

pub async fn process_alias_command<S: Store>(
    session: &mut Session<S>,
    command: AliasCommand,
) -> Result<()> {
    match command {
        AliasCommand::Set { alias, project } => {
            let project = project.join(" ");
            session.settings.registry.set_alias(&alias, project.clone());
            session.save_settings().await?;
            info!("Alias {alias} now points to {project}");
            println!("Alias set: {} → {project}", alias.to_lowercase());
        }
        AliasCommand::Rm { alias } => {
            let project = session.settings.registry.remove_alias(&alias)?;
            session.save_settings().await?;
            info!("Removed alias {alias} of {project}");
            println!("Removed alias: {}", alias.to_lowercase());
        }
        AliasCommand::List => {
            let aliases = session.settings.registry.aliases();
            if aliases.is_empty() {
                println!("No aliases configured");
            }
            for (alias, project) in aliases {
                println!("{alias} → {project}");
            }
        }
    }
    Ok(())
}
