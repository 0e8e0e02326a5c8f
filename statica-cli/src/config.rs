use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File, FileFormat, Map};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use statica_core::SiteConfig;
use statica_dev_server::PreviewServerConfig;

pub const ENV_FILE: &str = ".env";
pub const CONFIG_FILE: &str = "statica.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults.
/// Keys match the environment variable names, lowercased.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticaConfig {
    /// Host for the preview server
    pub server_host: String,
    /// Port for the preview server
    pub server_port: u16,
    pub src_folder: String,
    pub output_path: String,
    pub input_path: String,
    pub static_folder: String,
    pub templates_folder: String,
    pub assets_input_path: String,
    pub assets_output_path: String,
    /// Section names, in render order
    #[serde(deserialize_with = "comma_separated")]
    pub sections: Vec<String>,
    /// Sitemap URL prefix; derived from the domain or the server address when unset
    pub site_url: Option<String>,
    pub sitemap: bool,
    /// Watch mode debounce window in milliseconds
    pub debounce_ms: u64,
    /// Open browser when serving
    pub open: bool,
    /// Directory the site lives in, also used as the sitemap host
    #[serde(skip)]
    pub domain: Option<String>,
}

impl Default for StaticaConfig {
    fn default() -> Self {
        Self {
            server_host: "localhost".to_string(),
            server_port: 8000,
            src_folder: "src".to_string(),
            output_path: "dist".to_string(),
            input_path: "src/content".to_string(),
            static_folder: "src/static".to_string(),
            templates_folder: "src/templates".to_string(),
            assets_input_path: "src/assets".to_string(),
            assets_output_path: "dist/assets".to_string(),
            sections: Vec::new(),
            site_url: None,
            sitemap: true,
            debounce_ms: 3000,
            open: false,
            domain: None,
        }
    }
}

/// Accepts `"blog, news"` from `.env` files and environment variables, or a
/// list from TOML.
fn comma_separated<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Sections {
        Joined(String),
        List(Vec<String>),
    }

    let names = match Sections::deserialize(deserializer)? {
        Sections::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        Sections::List(list) => list,
    };

    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}

impl StaticaConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (SERVER_PORT, SECTIONS, ...)
    /// 3. `{domain}/statica.toml`
    /// 4. `{domain}/.env`
    /// 5. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let domain = args.get_one::<String>("domain").cloned();
        let root = site_root(domain.as_deref());

        let mut builder = ConfigBuilder::builder();

        // 1. Start with defaults
        let defaults = Self::default();
        builder = builder.add_source(ConfigBuilder::try_from(&defaults)?);

        // 2. Add configuration files if they exist
        let env_file = root.join(ENV_FILE);
        if env_file.is_file() {
            let vars = read_env_file(&env_file)?;
            builder = builder.add_source(Environment::default().source(Some(vars)));
        }
        let config_file = root.join(CONFIG_FILE);
        if config_file.is_file() {
            builder = builder.add_source(File::from(config_file).format(FileFormat::Toml));
        }

        // 3. Add environment variables
        builder = builder.add_source(Environment::default());

        // 4. Override with CLI arguments (highest priority)
        let mut cli_overrides = std::collections::HashMap::new();

        if let Some(host) = args.try_get_one::<String>("host").unwrap_or(None) {
            cli_overrides.insert("server_host".to_string(), host.clone());
        }
        if let Some(port) = args.try_get_one::<u16>("port").unwrap_or(None) {
            cli_overrides.insert("server_port".to_string(), port.to_string());
        }
        if let Some(output) = args.try_get_one::<String>("output").unwrap_or(None) {
            cli_overrides.insert("output_path".to_string(), output.clone());
        }
        if args.try_get_one::<bool>("open").unwrap_or(None).copied().unwrap_or(false) {
            cli_overrides.insert("open".to_string(), "true".to_string());
        }

        if !cli_overrides.is_empty() {
            builder = builder.add_source(ConfigBuilder::try_from(&cli_overrides)?);
        }

        let config = builder.build()?;
        let mut statica_config: StaticaConfig = config.try_deserialize()?;
        statica_config.domain = domain;

        Ok(statica_config)
    }

    pub fn root(&self) -> PathBuf {
        site_root(self.domain.as_deref())
    }

    pub fn base_url(&self) -> String {
        match (&self.site_url, &self.domain) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, Some(domain)) => format!("https://{}", domain.trim_end_matches('/')),
            (None, None) => format!("http://{}:{}", self.server_host, self.server_port),
        }
    }

    /// Resolve into the settings the build pipeline runs on. Relative paths
    /// are taken from the site root.
    pub fn site_config(&self) -> Result<SiteConfig> {
        let site = SiteConfig {
            src_dir: PathBuf::from(&self.src_folder),
            output_dir: PathBuf::from(&self.output_path),
            content_dir: PathBuf::from(&self.input_path),
            static_dir: PathBuf::from(&self.static_folder),
            templates_dir: PathBuf::from(&self.templates_folder),
            assets_input: PathBuf::from(&self.assets_input_path),
            assets_output: PathBuf::from(&self.assets_output_path),
            sections: self.sections.clone(),
            base_url: self.base_url(),
            sitemap: self.sitemap,
            debounce: Duration::from_millis(self.debounce_ms),
        };
        site.validate()?;

        Ok(site.resolve_paths(self.root()))
    }

    pub fn server_config(&self) -> Result<PreviewServerConfig> {
        Ok(PreviewServerConfig {
            host: self.server_host.clone(),
            port: self.server_port,
            root: self.site_config()?.output_dir,
            open: self.open,
        })
    }
}

/// `KEY=value` pairs read through the INI format. Keys keep their case here;
/// the `Environment` source they are fed into lowercases them.
fn read_env_file(path: &Path) -> Result<Map<String, String>> {
    let vars = ConfigBuilder::builder()
        .add_source(File::from(path).format(FileFormat::Ini))
        .build()?
        .try_deserialize()?;

    Ok(vars)
}

fn site_root(domain: Option<&str>) -> PathBuf {
    match domain {
        Some(domain) => Path::new(".").join(domain),
        None => PathBuf::from("."),
    }
}
