//! Config command implementation
//!
//! Prints the effective configuration, including which credentials are
//! present in the environment. Key values are never printed.

use super::output::Output;
use crate::utils::toml_config::{CouncilConfig, ProviderSettings, SearchBackend};
use std::path::Path;

/// Load, optionally validate, and print the configuration.
///
/// Returns false when the file cannot be loaded.
pub fn run(path: &Path, validate: bool, output: &Output) -> bool {
    let config = match CouncilConfig::load(path) {
        Ok(config) => config,
        Err(e) => {
            output.error(&format!("{}: {}", path.display(), e));
            output.hint("Run 'council-server init' to create a configuration");
            return false;
        }
    };

    if validate {
        output.success(&format!("{} is valid", path.display()));
    }

    output.header("Server");
    output.kv("address", &format!("{}:{}", config.server.host, config.server.port));
    output.kv("log level", &config.server.log_level);
    output.kv("permissive CORS", &config.server.cors_permissive.to_string());

    output.header("Search");
    output.kv("backend", config.search.backend.as_str());
    if config.search.backend == SearchBackend::Tavily {
        let present = config.resolve_env(&config.search.api_key_env).is_some();
        output.kv(
            "credential",
            &credential_status(&config.search.api_key_env, present),
        );
    }
    output.kv("max results", &config.search.max_results.to_string());

    output.header("Research providers");
    if config.providers.is_empty() {
        output.warning("No research providers configured; every request will fail");
    }
    for provider in &config.providers {
        print_provider(&config, provider, output);
    }

    output.header("Solver");
    match &config.solver {
        Some(solver) => print_provider(&config, solver, output),
        None => output.warning("No solver configured; every request will fail"),
    }

    output.newline();
    true
}

fn print_provider(config: &CouncilConfig, provider: &ProviderSettings, output: &Output) {
    let present = config.resolve_env(&provider.api_key_env).is_some();
    output.subheader(&provider.model);
    output.kv("endpoint", &provider.base_url);
    output.kv("credential", &credential_status(&provider.api_key_env, present));
    output.kv(
        "merged system prompt",
        &provider.merge_system_prompt().to_string(),
    );
    if !present {
        output.warning(&format!("{} is not set", provider.api_key_env));
    }
}

fn credential_status(env: &str, present: bool) -> String {
    if present {
        format!("{} (set)", env)
    } else {
        format!("{} (missing)", env)
    }
}
