use garrison::persistence::store::FileRowStore;
use garrison::{load_static_data, AppConfig};

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::from_args(&args)?;
    let data = load_static_data(&config)?;
    let summary = data.summary();

    println!(
        "content: site_levels={}, plot_instances={}, buildings={}, followers={}, abilities={}, random_traits={}, class_spec_pools={}, finalize={}",
        summary.site_levels,
        summary.plot_instances,
        summary.buildings,
        summary.followers,
        summary.abilities,
        summary.random_traits,
        summary.class_spec_pools,
        summary.finalize_entries
    );
    for warning in data.warnings() {
        println!("warning: {}", warning);
    }

    let store = FileRowStore::from_root(&config.root, config.cache_size.get());
    let report = store.validate();
    if report.missing_dir {
        println!("saves: missing {}", store.dir().display());
    } else {
        println!(
            "saves: files={}, parsed={}, skipped={}, errors={}",
            report.garrison_files,
            report.parsed,
            report.skipped,
            report.errors.len()
        );
    }
    for err in &report.errors {
        println!("error: {}", err);
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(format!("{} garrison saves failed validation", report.errors.len()))
    }
}
