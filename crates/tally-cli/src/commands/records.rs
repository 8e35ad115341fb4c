//! Task and project records that entries aggregate into.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tally_core::{ProjectId, ProjectRecord, TaskId, TaskRecord, WorkspaceId};
use tally_db::Database;

use crate::Config;
use crate::cli::{ProjectsAction, TasksAction};
use crate::commands::format::{format_duration, format_hours, write_json};

pub fn tasks<W: Write>(
    writer: &mut W,
    db: &mut Database,
    action: &TasksAction,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        TasksAction::Add {
            name,
            project,
            id,
            output,
        } => {
            let id = match id {
                Some(id) => TaskId::parse(id)?,
                None => TaskId::from_uuid(Uuid::new_v4()),
            };
            let project_id = ProjectId::parse_or_none(project.as_deref())?;
            let task = TaskRecord::new(id, project_id, name.trim(), now);
            db.insert_task(&task)
                .with_context(|| format!("failed to create task {id}"))?;
            tracing::info!(task_id = %task.id, "created task");

            if output.json {
                return write_json(writer, &task);
            }
            writeln!(writer, "Created task {} ({})", task.id, task.name)?;
        }
        TasksAction::Show { id, output } => {
            let task = db
                .get_task(&TaskId::parse(id)?)
                .with_context(|| format!("failed to load task {id}"))?;
            if output.json {
                return write_json(writer, &task);
            }
            writeln!(writer, "Task:     {} ({})", task.id, task.name)?;
            if !task.project_id.is_none() {
                writeln!(writer, "Project:  {}", task.project_id)?;
            }
            writeln!(
                writer,
                "Tracked:  {}",
                format_duration(task.tracked_seconds)
            )?;
            writeln!(
                writer,
                "Updated:  {}",
                task.date_updated.format(&config.date_format)
            )?;
        }
    }
    Ok(())
}

pub fn projects<W: Write>(
    writer: &mut W,
    db: &mut Database,
    action: &ProjectsAction,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    match action {
        ProjectsAction::Add {
            name,
            workspace,
            auto_estimates,
            id,
            output,
        } => {
            let id = match id {
                Some(id) => ProjectId::parse(id)?,
                None => ProjectId::from_uuid(Uuid::new_v4()),
            };
            let workspace = workspace
                .as_deref()
                .or(config.workspace_id.as_deref())
                .context("no workspace given and workspace_id is not configured")?;
            let workspace_id = WorkspaceId::parse(workspace)?;
            let project = ProjectRecord::new(id, workspace_id, name.trim(), *auto_estimates, now);
            db.insert_project(&project)
                .with_context(|| format!("failed to create project {id}"))?;
            tracing::info!(project_id = %project.id, "created project");

            if output.json {
                return write_json(writer, &project);
            }
            writeln!(writer, "Created project {} ({})", project.id, project.name)?;
        }
        ProjectsAction::Show { id, output } => {
            let project = db
                .get_project(&ProjectId::parse(id)?)
                .with_context(|| format!("failed to load project {id}"))?;
            if output.json {
                return write_json(writer, &project);
            }
            writeln!(writer, "Project:   {} ({})", project.id, project.name)?;
            writeln!(writer, "Workspace: {}", project.workspace_id)?;
            writeln!(
                writer,
                "Estimate:  {}{}",
                format_hours(project.estimated_hours),
                if project.auto_estimates {
                    ""
                } else {
                    " (manual)"
                }
            )?;
            writeln!(
                writer,
                "Updated:   {}",
                project.date_updated.format(&config.date_format)
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;

    use crate::cli::OutputArgs;

    const WORKSPACE: &str = "00000000-0000-0000-0000-0000000000b1";
    const PROJECT: &str = "00000000-0000-0000-0000-0000000000c1";
    const TASK: &str = "00000000-0000-0000-0000-0000000000d1";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 1, 8, 0, 0).unwrap()
    }

    fn config() -> Config {
        Config {
            workspace_id: Some(WORKSPACE.to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_add_and_show_project_and_task() {
        let mut db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();

        projects(
            &mut output,
            &mut db,
            &ProjectsAction::Add {
                name: "Backend".to_string(),
                workspace: None,
                auto_estimates: false,
                id: Some(PROJECT.to_string()),
                output: OutputArgs::default(),
            },
            &config(),
            now(),
        )
        .unwrap();
        tasks(
            &mut output,
            &mut db,
            &TasksAction::Add {
                name: " Sync engine ".to_string(),
                project: Some(PROJECT.to_string()),
                id: Some(TASK.to_string()),
                output: OutputArgs::default(),
            },
            &config(),
            now(),
        )
        .unwrap();
        projects(
            &mut output,
            &mut db,
            &ProjectsAction::Show {
                id: PROJECT.to_string(),
                output: OutputArgs::default(),
            },
            &config(),
            now(),
        )
        .unwrap();
        tasks(
            &mut output,
            &mut db,
            &TasksAction::Show {
                id: TASK.to_string(),
                output: OutputArgs::default(),
            },
            &config(),
            now(),
        )
        .unwrap();

        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        Created project 00000000-0000-0000-0000-0000000000c1 (Backend)
        Created task 00000000-0000-0000-0000-0000000000d1 (Sync engine)
        Project:   00000000-0000-0000-0000-0000000000c1 (Backend)
        Workspace: 00000000-0000-0000-0000-0000000000b1
        Estimate:  0.00h (manual)
        Updated:   2021-10-01 08:00
        Task:     00000000-0000-0000-0000-0000000000d1 (Sync engine)
        Project:  00000000-0000-0000-0000-0000000000c1
        Tracked:  0s
        Updated:  2021-10-01 08:00
        ");
    }

    #[test]
    fn test_project_requires_a_workspace() {
        let mut db = Database::open_in_memory().unwrap();
        let err = projects(
            &mut std::io::sink(),
            &mut db,
            &ProjectsAction::Add {
                name: "Backend".to_string(),
                workspace: None,
                auto_estimates: true,
                id: None,
                output: OutputArgs::default(),
            },
            &Config::default(),
            now(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("workspace_id is not configured"));
    }

    #[test]
    fn test_duplicate_task_id_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let add = TasksAction::Add {
            name: "Task".to_string(),
            project: None,
            id: Some(TASK.to_string()),
            output: OutputArgs { json: true },
        };
        tasks(&mut std::io::sink(), &mut db, &add, &config(), now()).unwrap();
        let err = tasks(&mut std::io::sink(), &mut db, &add, &config(), now()).unwrap_err();
        assert!(err.to_string().starts_with("failed to create task"));
    }
}
