use crate::{
    db::{
        db::Db,
        migrations::{get_db_version, needs_migration, MigrationManager},
    },
    libs::{config::Config, messages::Message, response::Responder},
    msg_info,
};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    command: MigrationsCommand,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    /// Show the current schema version
    Status,
    /// Show applied migrations
    History,
}

#[derive(Debug, Serialize)]
struct AppliedMigration {
    version: u32,
    name: String,
    applied_at: String,
}

pub fn cmd(args: MigrationsArgs, out: &Responder) -> Result<()> {
    // Inspect the file as it is; opening through `Db` would migrate it first.
    let conn = Db::new_without_migrations(Config::read()?.database_path()?)?;

    match args.command {
        MigrationsCommand::Status => {
            let version = get_db_version(&conn)?;
            let pending = needs_migration(&conn)?;
            out.data(
                Message::DatabaseVersion(version),
                &serde_json::json!({ "version": version, "needs_migration": pending }),
                |_| {
                    if pending {
                        msg_info!(Message::DatabaseNeedsUpdate);
                    } else {
                        msg_info!(Message::DatabaseUpToDate);
                    }
                },
            )
        }
        MigrationsCommand::History => {
            let history: Vec<AppliedMigration> = MigrationManager::new()
                .get_migration_history(&conn)
                .unwrap_or_default()
                .into_iter()
                .map(|(version, name, applied_at)| AppliedMigration { version, name, applied_at })
                .collect();
            out.list(Message::MigrationHistory(history.len()), Message::NoMigrationsApplied, &history, |items| {
                for m in items {
                    println!("  v{}: {} (applied: {})", m.version, m.name, m.applied_at);
                }
            })
        }
    }
}
