mod config;
pub mod content;
pub mod garrison;
pub mod persistence;
pub mod player;
pub mod service;
pub mod telemetry;
#[cfg(test)]
mod test_support;
pub mod world;

pub use config::AppConfig;

use content::tables::{ContentTables, WorldTables};
use garrison::GarrisonStaticData;
use persistence::store::FileRowStore;
use service::GarrisonService;
use std::sync::Arc;

/// Loads content and world tables from the configured paths.
pub fn load_static_data(config: &AppConfig) -> Result<GarrisonStaticData, String> {
    let content = ContentTables::load(&config.content_path).map_err(|err| err.to_string())?;
    let world = WorldTables::load_optional(&config.world_tables_path).map_err(|err| err.to_string())?;
    Ok(GarrisonStaticData::initialize(content, world))
}

pub fn run(args: &[String]) -> Result<GarrisonService, String> {
    let config = AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root)?;
    let data = load_static_data(&config)?;
    let summary = data.summary();
    for warning in data.warnings() {
        telemetry::logging::log_error(&format!("static data: {}", warning));
    }

    let store = FileRowStore::from_root(&config.root, config.cache_size.get());
    let save_report = store.validate();
    for err in &save_report.errors {
        eprintln!("garrison: save validate {}", err);
    }
    let strict_unlearn = config.strict_unlearn;
    let service = GarrisonService::new(
        Arc::new(data),
        Box::new(store),
        config.autosave,
        strict_unlearn,
        std::time::Instant::now(),
    )
    .map_err(|err| format!("garrison service start failed: {}", err))?;

    println!("garrison: content scan");
    println!("- root: {}", config.root.display());
    println!("- content: {}", config.content_path.display());
    println!(
        "- site levels: {}, plot instances: {}, buildings: {}",
        summary.site_levels, summary.plot_instances, summary.buildings
    );
    println!(
        "- followers: {}, abilities: {}, random traits: {}, class spec pools: {}",
        summary.followers, summary.abilities, summary.random_traits, summary.class_spec_pools
    );
    println!("- finalize decorations: {}", summary.finalize_entries);
    if summary.warnings > 0 {
        println!("- static data warnings: {} (see log/error.log)", summary.warnings);
    }
    if save_report.missing_dir {
        println!("- save garrisons: missing save/garrisons directory");
    } else {
        println!(
            "- save garrisons: files={}, parsed={}, errors={}, skipped={}",
            save_report.garrison_files,
            save_report.parsed,
            save_report.errors.len(),
            save_report.skipped
        );
    }
    println!("- next follower id: {}", service.ids().peek_next());
    if let Some(interval) = config.autosave.interval() {
        println!("- autosave: every {}s", interval.as_secs());
    }
    if strict_unlearn {
        println!("- strict blueprint unlearn: on");
    }
    telemetry::logging::log_game(&format!(
        "content scan: site_levels={}, buildings={}, followers={}, abilities={}, warnings={}, save_files={}",
        summary.site_levels,
        summary.buildings,
        summary.followers,
        summary.abilities,
        summary.warnings,
        save_report.garrison_files
    ));
    Ok(service)
}
