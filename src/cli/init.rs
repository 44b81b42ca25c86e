//! Init command implementation
//!
//! Scaffolds `council.toml` and `.env.example` for a new deployment.

use super::output::Output;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
#[derive(Debug, PartialEq, Eq)]
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (council.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing council project");

    let base_path = &config.path;
    let config_path = base_path.join("council.toml");
    if config_path.exists() && !config.force {
        output.warning("council.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    if !base_path.exists()
        && let Err(e) = fs::create_dir_all(base_path)
    {
        output.error(&format!("Failed to create {}: {}", base_path.display(), e));
        return InitResult::Error(e.to_string());
    }

    output.subheader("Creating configuration files");

    let files = [
        ("config", "council.toml", COUNCIL_TOML),
        ("env", ".env.example", ENV_EXAMPLE),
    ];
    for (kind, name, content) in files {
        if let Err(e) = write_file(&base_path.join(name), content, config.force) {
            output.error(&format!("Failed to create {}: {}", name, e));
            return InitResult::Error(e.to_string());
        }
        output.created(kind, name);
    }

    output.complete("Council project initialized successfully!");

    output.header("Next Steps");
    output.newline();
    output.info("1. Set the API keys referenced by council.toml:");
    output.command("cp .env.example .env");
    output.newline();
    output.info("2. Check the configuration:");
    output.command("council-server config --validate");
    output.newline();
    output.info("3. Start the server:");
    output.command("council-server");

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

const COUNCIL_TOML: &str = r#"# Ares Council configuration

[server]
host = "127.0.0.1"
port = 8000
log_level = "info"
cors_permissive = true

[search]
# tavily | duckduckgo | disabled
backend = "tavily"
api_key_env = "TAVILY_API_KEY"
max_results = 5
timeout_secs = 30

[pipeline]
request_timeout_secs = 60
connect_timeout_secs = 10
context_results = 3
event_buffer = 32

# Research providers run in parallel, reports are merged in this order
[[providers]]
model = "deepseek-reasoner"
base_url = "https://api.deepseek.com"
api_key_env = "DEEPSEEK_API_KEY"
# Reasoning models take the instructions in the user turn
merge_system_prompt = true

[[providers]]
model = "moonshot-v1-8k"
base_url = "https://api.moonshot.cn/v1"
api_key_env = "KIMI_API_KEY"

# Writes the final answer from the provider reports
[solver]
model = "deepseek-chat"
base_url = "https://api.deepseek.com"
api_key_env = "DEEPSEEK_API_KEY"
"#;

const ENV_EXAMPLE: &str = r#"# API keys referenced by council.toml
DEEPSEEK_API_KEY=
KIMI_API_KEY=
TAVILY_API_KEY=

# Optional log filter, overrides [server].log_level
# RUST_LOG=council=debug,tower_http=info
"#;
