//! One-shot footprint estimate from the command line
//! Usage: cargo run --bin estimate_footprint -- [--json FILE] [category.subcategory=QTY ...]
//!
//! Example: estimate_footprint transportation.car=1000 energy.electricity=300

use carbonsol::config;
use carbonsol::footprint::{estimate, format_carbon_amount, offset_recommendations};
use carbonsol::models::ConsumptionInput;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("carbonsol=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut input = ConsumptionInput::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--json" {
            let path = iter.next().ok_or("--json requires a file path")?;
            let text = std::fs::read_to_string(path)?;
            let from_file: ConsumptionInput = serde_json::from_str(&text)?;
            for (category, subcategories) in from_file.as_map() {
                for (subcategory, qty) in subcategories {
                    input.set(*category, subcategory.clone(), *qty);
                }
            }
            continue;
        }

        let Some((key, value)) = arg.split_once('=') else {
            return Err(format!("Expected category.subcategory=QTY, got '{}'", arg).into());
        };
        if !input.set_dotted(key, &Value::String(value.to_string())) {
            eprintln!("Skipping unknown key: {}", key);
        }
    }

    let (factors, factor_source) = config::load_factor_table()?;
    eprintln!("Emission factors: {}", factor_source);

    let result = estimate(&input, &factors);
    eprintln!("Total: {}", format_carbon_amount(result.total_emissions, 2));

    let output = serde_json::json!({
        "input": input,
        "result": result,
        "offsets": offset_recommendations(result.total_emissions),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
