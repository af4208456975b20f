use crate::persistence::autosave::AutosaveConfig;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

const DEFAULT_CACHE_SIZE: usize = 256;

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub content_path: PathBuf,
    pub world_tables_path: PathBuf,
    pub cache_size: NonZeroUsize,
    pub autosave: AutosaveConfig,
    pub strict_unlearn: bool,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        Self::from_args_with_env(args, |key| std::env::var(key).ok())
    }

    fn from_args_with_env(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: garrison <asset-root>".to_string());
        }
        let root = Path::new(&args[1]).to_path_buf();
        let var = |key: &str| {
            env(key).and_then(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let content_path = var("GARRISON_CONTENT")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("garrison").join("content.yml"));
        let world_tables_path = var("GARRISON_WORLD_TABLES")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("garrison").join("world.yml"));
        let cache_size = match var("GARRISON_CACHE_SIZE") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .and_then(NonZeroUsize::new)
                .ok_or_else(|| format!("invalid GARRISON_CACHE_SIZE '{}'", value))?,
            None => NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN),
        };
        let autosave_secs = match var("GARRISON_AUTOSAVE_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) => secs,
                Err(_) => {
                    eprintln!(
                        "garrison: invalid GARRISON_AUTOSAVE_SECS '{}', autosave disabled",
                        value
                    );
                    0
                }
            },
            None => 0,
        };
        let strict_unlearn = var("GARRISON_STRICT_UNLEARN").map_or(false, |value| value == "1");

        Ok(Self {
            root,
            content_path,
            world_tables_path,
            cache_size,
            autosave: AutosaveConfig {
                interval_seconds: autosave_secs,
            },
            strict_unlearn,
        })
    }
}
