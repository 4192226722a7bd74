//! `trialmind doctor`: diagnose the local setup.

use trialmind_config::AppConfig;
use trialmind_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("trialmind doctor: system diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                AppConfig::default()
            }
        }
    } else {
        println!("  ⚠️  No config file at {}; using defaults", config_path.display());
        AppConfig::default()
    };

    // Check API key
    if config.has_api_key() || config.providers.values().any(|p| p.api_key.is_some()) {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured (set TRIALMIND_API_KEY or add api_key to config.toml)");
        issues += 1;
    }

    // Check the provider endpoint
    let router = trialmind_providers::router::build_from_config(&config);
    if let Some(provider) = router.default() {
        match provider.health_check().await {
            Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
            Ok(false) => {
                println!("  ⚠️  Provider '{}' answered but rejected the request", provider.name());
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                issues += 1;
            }
        }
    }

    // Check the interpreter used by math and code benchmarks
    let python = &config.tools.python_bin;
    match tokio::process::Command::new(python).arg("--version").output().await {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout);
            let version = if version.trim().is_empty() {
                String::from_utf8_lossy(&out.stderr).trim().to_string()
            } else {
                version.trim().to_string()
            };
            println!("  ✅ {python}: {version}");
        }
        _ => {
            println!("  ❌ {python} not runnable; math and code benchmarks will fail");
            issues += 1;
        }
    }

    // Check the QA docstore
    match (config.tools.docstore.as_str(), config.tools.documents_path.as_deref()) {
        ("memory", Some(path)) if std::path::Path::new(path).is_file() => {
            println!("  ✅ In-memory docstore: {path}");
        }
        ("memory", _) => {
            println!("  ❌ In-memory docstore file missing");
            issues += 1;
        }
        (kind, _) => println!("  ✅ Docstore: {kind} ({})", config.tools.wikipedia_url),
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
