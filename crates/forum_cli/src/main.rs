//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `forum_core` linkage and open the configured store.
//! - Print schema version and per-table row counts for quick sanity checks.

use forum_core::db::migrations::current_user_version;
use forum_core::repo::query::{count, EntityFilter};
use forum_core::{EntityKind, ForumConfig, ForumService, ServiceError};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("forum_core ping={}", forum_core::ping());
    println!("forum_core version={}", forum_core::core_version());

    match probe(&ForumConfig::from_env()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("forum_cli error_code={} error={err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn probe(config: &ForumConfig) -> Result<(), ServiceError> {
    let service = ForumService::open(config)?;
    let conn = service.gateway().connection();

    let store = config
        .db_path
        .as_ref()
        .map_or_else(|| ":memory:".to_string(), |path| path.display().to_string());
    println!("forum store={store}");
    println!("forum schema_version={}", current_user_version(conn)?);

    for kind in [EntityKind::Category, EntityKind::Post, EntityKind::Comment] {
        let rows = count(conn, kind, &EntityFilter::all())?;
        println!("forum table={} rows={rows}", kind.label());
        info!("event=cli_probe module=cli status=ok table={} rows={rows}", kind.label());
    }

    service.close()
}
