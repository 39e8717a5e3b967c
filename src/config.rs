use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recipebox", about = "Your recipe collection, online and offline")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the recipes API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and start a session
    Signin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Signout,
    /// Show the signed-in user
    Whoami,
    /// List recipes
    List {
        #[arg(long, value_enum, default_value_t = Layout::List)]
        layout: Layout,
        /// Show the local mirror without contacting the server
        #[arg(long)]
        offline: bool,
    },
    /// Show one recipe
    Show { id: String },
    /// Add a recipe
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image_url: String,
        #[arg(long, default_value = "")]
        ingredients: String,
        #[arg(long, default_value = "")]
        steps: String,
    },
    /// Edit a recipe; omitted fields keep their current value
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        ingredients: Option<String>,
        #[arg(long)]
        steps: Option<String>,
    },
    /// Delete a recipe
    Delete { id: String },
    /// Download an image and report its size
    Image { url: String },
    /// Run a kitchen countdown
    Timer {
        #[arg(long, default_value_t = 0)]
        hours: u32,
        #[arg(long, default_value_t = 0)]
        minutes: u32,
        #[arg(long, default_value_t = 0)]
        seconds: u32,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    Grid,
    #[default]
    List,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub images: ImagesConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ImagesConfig {
    /// Byte budget for the in-memory image cache.
    pub cache_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://recipes-api-f0710.web.app/api/v1/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            cache_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref api_url) = cli.api_url {
            config.api.base_url = api_url.clone();
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("recipebox.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".recipebox")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("recipebox.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(config: Option<PathBuf>, api_url: Option<&str>, data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config,
            api_url: api_url.map(str::to_string),
            data_dir,
            command: Command::Whoami,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(config.api.base_url.ends_with("/api/v1/"));
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.images.cache_bytes, 50 * 1024 * 1024);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli(None, None, Some(PathBuf::from("/tmp/test-recipebox")));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-recipebox"));
    }

    #[test]
    fn data_dir_defaults_to_dot_recipebox() {
        let cli = cli(None, None, None);
        assert!(Config::data_dir(&cli).ends_with(".recipebox"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = cli(None, None, Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.db_path(), tmp.path().join("recipebox.db"));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[api]
base_url = "http://localhost:8080/api/v1/"
timeout_secs = 5

[images]
cache_bytes = 1024
"#,
        )
        .unwrap();

        let cli = cli(Some(config_path), None, Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1/");
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.images.cache_bytes, 1024);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[api]
base_url = "http://config-file/"
"#,
        )
        .unwrap();

        let cli = cli(
            Some(config_path),
            Some("http://from-cli/"),
            Some(tmp.path().to_path_buf()),
        );
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api.base_url, "http://from-cli/");
    }

    #[test]
    fn parses_list_subcommand() {
        let cli = Cli::parse_from(["recipebox", "list", "--layout", "grid", "--offline"]);
        match cli.command {
            Command::List { layout, offline } => {
                assert_eq!(layout, Layout::Grid);
                assert!(offline);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
