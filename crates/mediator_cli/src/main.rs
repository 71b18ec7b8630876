//! CLI smoke entry point.
//!
//! # Responsibility
//! - Wire a registry, one mediator, two repositories and a mirror cache.
//! - Print deterministic `key=value` lines for quick local sanity checks.
//! - With an absolute directory as first argument, also write core logs there
//!   at the build-mode default level.

use mediator_core::{
    default_log_level, init_logging, EntityRepository, InMemoryRepository, MediatorConfig,
    MediatorRegistry, MirrorCache, Record, RepoResult, RepositoryConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Some(log_dir) = std::env::args().nth(1) {
        let level = default_log_level();
        if let Err(err) = init_logging(level, &log_dir) {
            eprintln!("mediator_cli logging_error={err}");
            return ExitCode::FAILURE;
        }
        println!("log_level={level} log_dir={log_dir}");
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mediator_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> RepoResult<()> {
    println!("mediator_core version={}", mediator_core::core_version());

    let registry = MediatorRegistry::new();
    let mediator = registry.register_repository_mediator::<Record>(MediatorConfig::default())?;

    let cache = MirrorCache::new();
    cache.attach(&mediator);

    let primary =
        InMemoryRepository::<Record>::from_registry(&registry, RepositoryConfig::default())?;
    let secondary = InMemoryRepository::new(mediator);

    let record = Record::with_payload(1, "smoke");
    primary.add(record.clone())?;
    secondary.add(Record::new(2))?;
    println!("cache_len_after_add={}", cache.len());

    let fetched = primary.get(&record.id)?;
    println!("fetched_id={} cache_hits={}", fetched.id, cache.hits());

    primary.delete(&record)?;
    println!("cache_len_after_delete={}", cache.len());
    Ok(())
}
