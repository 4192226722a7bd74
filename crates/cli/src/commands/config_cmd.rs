//! `trialmind config`: configuration management commands.

use trialmind_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();

            if config.api_key.is_none() {
                warnings.push("No API key set (set TRIALMIND_API_KEY or OPENAI_API_KEY)".to_string());
            }

            for (benchmark, path) in config
                .prompts
                .examples
                .iter()
                .chain(config.prompts.reflect_examples.iter())
            {
                if !std::path::Path::new(path).is_file() {
                    warnings.push(format!("Example file for '{benchmark}' not found: {path}"));
                }
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            let agent = &config.agent;
            println!();
            println!("   Provider:    {}", config.default_provider);
            println!("   Model:       {}", config.default_model);
            println!("   Steps:       {} (prompt budget {} tokens)", agent.max_steps, agent.max_tokens);
            println!(
                "   Trials:      {} (patience {}, strategy {})",
                agent.max_trials,
                agent.effective_patience(),
                agent.reflect_strategy
            );
            println!("   Critiques:   {} (tools {})", agent.max_interactions, agent.use_tool);
            println!("   Docstore:    {}", config.tools.docstore);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let mut redacted = config.clone();
    if redacted.api_key.is_some() {
        redacted.api_key = Some("[REDACTED]".into());
    }
    for provider in redacted.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("[REDACTED]".into());
        }
    }
    println!("{}", toml::to_string_pretty(&redacted)?);
    Ok(())
}

pub async fn default() -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", AppConfig::default_toml());
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
