mod cli;

use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rifs::manifest::Manifest;
use rifs_core::{check_tool, Config, Operation, ResolvePolicy};
use rifs_pipeline::{Constructor, DryRunSubmitter, ProcessSubmitter, Resolution};
use serde_json::json;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "rifs=debug,rifs_core=debug,rifs_script=debug,rifs_pipeline=debug".to_string()
        } else {
            "rifs=info,rifs_core=info,rifs_script=info,rifs_pipeline=info".to_string()
        }
    });

    // Logs go to stderr so `plan --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Submit {
            manifest,
            policy,
            dry_run,
        } => submit(&manifest, cli.config.as_deref(), policy, dry_run),
        Commands::Plan {
            manifest,
            policy,
            json,
        } => plan(&manifest, cli.config.as_deref(), policy, json),
        Commands::Inspect { script } => inspect(&script),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

/// Load config and manifest and build a constructor over the batch.
fn constructor(manifest: &Path, config: &Config) -> Result<Constructor> {
    let items = Manifest::load(manifest)?.into_batch(config)?;
    tracing::info!("Loaded {} entries from {}", items.len(), manifest.display());
    Ok(Constructor::new(config).with_items(items))
}

fn submit(
    manifest: &Path,
    config_path: Option<&Path>,
    policy: Option<ResolvePolicy>,
    dry_run: bool,
) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let policy = policy.unwrap_or(config.resolve.policy);
    let constructor = constructor(manifest, &config)?;

    if dry_run {
        let mut submitter = DryRunSubmitter::new();
        let outcomes = constructor.submit(policy, &mut submitter)?;
        println!("[DRY RUN] Would submit {} jobs:", outcomes.len());
        for (i, outcome) in outcomes.iter().enumerate() {
            println!("  {}. {}: {}", i + 1, outcome.name, outcome.output);
        }
        return Ok(());
    }

    let outcomes = constructor.submit(policy, &mut ProcessSubmitter)?;
    let mut failed = 0;
    for outcome in &outcomes {
        if outcome.is_success() {
            println!("✓ {} ({})", outcome.name, outcome.job.short());
        } else {
            failed += 1;
            let reason = outcome.error.as_deref().unwrap_or("").trim();
            println!("✗ {} ({}): {}", outcome.name, outcome.job.short(), reason);
        }
    }

    println!();
    println!("Submitted {} of {} jobs", outcomes.len() - failed, outcomes.len());
    if failed > 0 {
        bail!("{failed} submission(s) failed");
    }
    Ok(())
}

fn plan(
    manifest: &Path,
    config_path: Option<&Path>,
    policy: Option<ResolvePolicy>,
    json: bool,
) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let policy = policy.unwrap_or(config.resolve.policy);
    let Resolution {
        resolver,
        unresolved,
    } = constructor(manifest, &config)?.plan(policy)?;

    if json {
        let jobs: Vec<_> = resolver
            .iter()
            .map(|grouping| {
                let job = grouping.job();
                json!({
                    "name": grouping.name(),
                    "operation": grouping.operation().map(|op| op.type_name()),
                    "job": job,
                })
            })
            .collect();
        let view = json!({
            "policy": policy,
            "jobs": jobs,
            "unresolved": unresolved,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("Policy: {policy}");
    println!("Submission order ({} jobs):", resolver.len());
    for (i, grouping) in resolver.iter().enumerate() {
        let job = grouping.job();
        println!("  {}. {} [{}]", i + 1, grouping.name(), job.id.short());
        println!("     command: {}", job.command.join(" "));
        if !job.depend_on.is_empty() {
            let deps: Vec<String> = job.depend_on.iter().map(ToString::to_string).collect();
            println!("     after:   {}", deps.join(", "));
        }
    }

    if !unresolved.is_empty() {
        let ids: Vec<String> = unresolved.iter().map(|id| id.short()).collect();
        match policy {
            ResolvePolicy::Strict => println!("\nDropped (unresolvable): {}", ids.join(", ")),
            ResolvePolicy::Force => println!("\nForced (unresolved): {}", ids.join(", ")),
        }
    }

    Ok(())
}

fn inspect(script: &Path) -> Result<()> {
    let info = rifs_script::read_script(script)?;

    println!("Script: {}", script.display());
    println!("Module: {}", info.module);
    println!("Class:  {}", info.class_name);
    println!("Keyword arguments: {}", info.kwargs.len());
    for (name, value) in &info.kwargs {
        println!("  {name} = {value}");
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = Config::load_or_default(config_path)?;
    let mut names: Vec<&str> = Vec::new();
    if let Some(interpreter) = config.farm.interpreter.first() {
        names.push(interpreter);
    }
    names.push("nuke-race");

    let mut all_ok = true;
    for name in names {
        let tool = check_tool(name, "--version");
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Jobs that need them will fail to submit.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = Config::load(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Workspace root: {}", config.farm.workspace_root);
    println!("  Interpreter: {}", config.farm.interpreter.join(" "));
    println!("  Show: {}", config.farm.show);
    println!("  Job defaults: {} cpus, {} MB", config.job.cpus, config.job.ram);
    println!("  Resolve policy: {}", config.resolve.policy);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}
