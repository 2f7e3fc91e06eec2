use crate::app::AppContext;
use crate::cli::StatusArgs;
use crate::health::{self, ComponentHealth, ComponentStatus};
use anyhow::Result;
use std::time::Duration;

pub async fn execute(ctx: AppContext, args: &StatusArgs) -> Result<()> {
    let report = health::probe(&ctx.coordinator, Duration::from_secs(2)).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("=== todocache status ===\n");
        println!("Key:   {}", ctx.coordinator.collection_key());
        println!("TTL:   {}s", ctx.coordinator.options().ttl.as_secs());
        print_component("Cache", &report.cache);
        print_component("Store", &report.store);
        println!("\nAll components up: {}", report.all_up());
    }

    ctx.shutdown().await?;
    Ok(())
}

fn print_component(label: &str, health: &ComponentHealth) {
    let status = match health.status {
        ComponentStatus::Up => "UP".to_string(),
        ComponentStatus::Down => format!(
            "DOWN ({})",
            health.error.as_deref().unwrap_or("unknown error")
        ),
    };
    println!(
        "{}: {} [{}] {}ms",
        label, status, health.backend, health.latency_ms
    );
}
