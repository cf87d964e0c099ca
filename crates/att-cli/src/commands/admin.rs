//! Backup and restore of the database file.
//!
//! Restore runs with no database handle open: the backup is verified, copied
//! next to the live database and renamed over it, then reopened so the schema
//! is brought up to date.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use att_db::Database;
use chrono::{Local, NaiveDateTime};

use crate::Config;

/// `database_backup_YYYYMMDD_HHMMSS.db`
pub fn backup_file_name(at: NaiveDateTime) -> String {
    format!("database_backup_{}.db", at.format("%Y%m%d_%H%M%S"))
}

pub fn backup<W: Write>(writer: &mut W, db: &Database, config: &Config) -> Result<PathBuf> {
    backup_at(writer, db, config, Local::now().naive_local())
}

fn backup_at<W: Write>(
    writer: &mut W,
    db: &Database,
    config: &Config,
    at: NaiveDateTime,
) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.backup_dir).with_context(|| {
        format!(
            "failed to create backup directory {}",
            config.backup_dir.display()
        )
    })?;
    let dest = config.backup_dir.join(backup_file_name(at));
    db.backup_to(&dest)
        .with_context(|| format!("failed to write backup {}", dest.display()))?;

    tracing::info!(dest = %dest.display(), "backup written");
    writeln!(writer, "Backup written to {}", dest.display())?;
    Ok(dest)
}

/// Sibling of the database used to stage a restore.
fn staging_path(database_path: &Path) -> PathBuf {
    let mut name = database_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".restore");
    database_path.with_file_name(name)
}

pub fn restore<W: Write>(writer: &mut W, source: &Path, config: &Config) -> Result<()> {
    Database::verify(source)?;

    let target = &config.database_path;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    let staging = staging_path(target);
    std::fs::copy(source, &staging)
        .with_context(|| format!("failed to copy {} to {}", source.display(), staging.display()))?;
    std::fs::rename(&staging, target)
        .with_context(|| format!("failed to replace {}", target.display()))?;

    Database::open(target)
        .with_context(|| format!("failed to reopen {}", target.display()))?;

    tracing::info!(source = %source.display(), "database restored");
    writeln!(writer, "Restored database from {}", source.display())?;
    Ok(())
}
