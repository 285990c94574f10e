//! Typeshape inspector
//!
//! Describes a set of demonstration models through the metadata cache and
//! prints the resulting descriptors.

mod cli;
mod models;

use std::sync::Arc;

use anyhow::Context;
use typeshape::logging::init_tracing;
use typeshape::{CacheConfig, MemberKind, MetadataCache, TypeSummary};

use crate::cli::CliOptions;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let options = CliOptions::from_args();

    let mut config = CacheConfig::from_env()?;
    if let Some(format) = options.log_format_override {
        config.log_format = format;
    }
    init_tracing(config.log_format);

    tracing::info!("Starting typeshape inspector");

    let cache = Arc::new(MetadataCache::new(config));
    let roots = models::describe_all(&cache).context("Failed to describe demonstration models")?;
    tracing::info!(roots = roots.len(), types = cache.len(), "Descriptors built");

    let mut summaries: Vec<TypeSummary> = cache
        .descriptors()
        .iter()
        .map(|member| member.summary())
        .filter(|summary| match &options.type_filter {
            Some(name) => summary.name == *name,
            None => true,
        })
        .collect();
    summaries.sort_by(|a, b| a.name.cmp(&b.name));

    if let Some(name) = &options.type_filter {
        if summaries.is_empty() {
            anyhow::bail!("No described type named {}", name);
        }
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            print_summary(summary);
        }
    }

    Ok(())
}

fn print_summary(summary: &TypeSummary) {
    println!(
        "{} [{} / {:?}] {}",
        summary.name, summary.system_type, summary.kind, summary.definition
    );
    if let Some(base) = &summary.base {
        println!("  base: {}", base);
    }
    if let Some(enclosed) = &summary.enclosed {
        println!("  enclosed: {}", enclosed);
    }
    for member in &summary.members {
        let kind = match member.kind {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
            MemberKind::Event => "event",
        };
        let mut notes = Vec::new();
        if member.is_static {
            notes.push("static");
        }
        if !member.is_accessible {
            notes.push("not invokable");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        println!("  {:<12} {}: {}{}", kind, member.name, member.shape, notes);
    }
}
