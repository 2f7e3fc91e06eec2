use crate::app::AppContext;
use crate::cli::{CreateArgs, ListArgs};
use crate::coordinator::{Invalidation, ListingSource};
use anyhow::{Context, Result};

pub async fn list(ctx: AppContext, args: &ListArgs) -> Result<()> {
    let listing = ctx.coordinator.list_records().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing.records)?);
    } else {
        let source = match listing.source {
            ListingSource::Cache => "cache",
            ListingSource::Store => "store",
            ListingSource::StoreDegraded => "store (cache unavailable)",
        };
        println!("{} record(s) from {}", listing.records.len(), source);
        for record in &listing.records {
            let mark = if record.completed { "x" } else { " " };
            println!("  [{}] {:>4}  {}", mark, record.id, record.task);
        }
    }

    ctx.shutdown().await?;
    Ok(())
}

pub async fn create(ctx: AppContext, args: &CreateArgs) -> Result<()> {
    let created = ctx.coordinator.create_record(&args.task).await?;

    println!("{}", serde_json::to_string_pretty(&created.record)?);
    if let Invalidation::Failed(reason) = &created.invalidation {
        eprintln!("warning: cached listing was not invalidated: {}", reason);
    }

    ctx.shutdown().await?;
    Ok(())
}

pub async fn invalidate(ctx: AppContext) -> Result<()> {
    ctx.coordinator
        .invalidate()
        .await
        .with_context(|| format!("Failed to delete '{}'", ctx.coordinator.collection_key()))?;
    println!("Invalidated {}", ctx.coordinator.collection_key());

    ctx.shutdown().await?;
    Ok(())
}
