// src/bin/quote_preview.rs
use dashboard_walkthrough::handlers::quote::QuoteBody;
use dashboard_walkthrough::services::pricing::{calculate_quote, PricingConfig, QuoteLineItem};
use std::{env, fs};

fn print_item(item: &QuoteLineItem, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut line = format!("{}{:<40} ${:>10.2}", indent, item.description, item.amount);
    if let Some(discount) = &item.discount {
        line.push_str(&format!("  ({})", discount));
    }
    println!("{}", line);
    if let Some(alert) = &item.alert {
        println!("{}  ! {}", indent, alert);
    }
    for sub in &item.sub_items {
        print_item(sub, depth + 1);
    }
}

// Prints the quote for a saved walk-through body: `{ "request": {...}, "distance": {...} }`
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: quote_preview <request.json>"))?;
    let body: QuoteBody = serde_json::from_str(&fs::read_to_string(&path)?)?;

    let quote = calculate_quote(&body.request, body.distance.as_ref(), &PricingConfig::default());
    for item in &quote.items {
        print_item(item, 0);
    }
    println!("{:<40} ${:>10.2}", "TOTAL", quote.total);

    if let Some(warning) = quote.budget_warning() {
        println!("\nWARNING: {}", warning);
    }
    Ok(())
}
