//! `trialmind pricing`: the per-model prices behind cost totals.

use trialmind_config::AppConfig;
use trialmind_telemetry::{ModelPricing, PricingTable};

/// Built-in prices with the `[pricing]` overrides from config applied.
pub fn build_table(config: &AppConfig) -> PricingTable {
    let table = PricingTable::with_defaults();
    for (model, price) in &config.pricing {
        table.set(model.clone(), ModelPricing::new(price.input_per_m, price.output_per_m));
    }
    table
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let table = build_table(&config);
    let models = table.models();

    println!("Model Pricing (USD per 1M tokens)");
    println!("─────────────────────────────────────────────────────");
    println!("{:<40} {:>10} {:>10}", "Model", "Input", "Output");
    println!("{:<40} {:>10} {:>10}", "─────", "─────", "──────");

    for name in &models {
        if let Some(p) = table.lookup(name) {
            let marker = if config.pricing.contains_key(name) { " *" } else { "" };
            println!(
                "{:<40} ${:>8.3} ${:>8.3}{marker}",
                name, p.input_per_m, p.output_per_m
            );
        }
    }

    println!();
    println!("  {} models with pricing data", models.len());
    if !config.pricing.is_empty() {
        println!("  * overridden in config");
    }

    let model = config.model();
    match table.lookup(model) {
        Some(_) => println!("  Default model '{model}' is priced"),
        None => println!("  ⚠️  Default model '{model}' has no pricing; its cost will read as $0"),
    }

    Ok(())
}
