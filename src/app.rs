// Declare modules
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod filter;
pub mod formatter;
pub mod models;
pub mod output;
pub mod scanner;
pub mod tree;

use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeMap;

use self::cli::Cli;
use self::config::{resolve_config, CliOverrides};
use self::filter::PathFilter;
use self::formatter::OutputGenerator;
use self::models::Target;
use self::output::{resolve_output_path, write_atomic};
use self::scanner::Scanner;
use self::tree::TreeRenderer;

/// Initializes components and orchestrates data flow.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();
    setup_logging(args.verbose);

    // 2. Identify the root
    let target = Target::resolve(&args.input_path)?;

    // 3. Resolve Configuration
    let home = dirs::home_dir();
    let resolved = resolve_config(
        &CliOverrides::from(&args),
        target.project_dir(),
        home.as_deref(),
    );
    log::debug!("Config files merged: {:?}", resolved.loaded_files);
    let config = resolved.config;
    let output_path = resolve_output_path(&config.output_filename)?;

    if args.show_config {
        print!("{}", config.describe(&target.input, &target.root, &output_path));
        return Ok(());
    }

    log::info!("Processing project: {}", target.root.display());
    log::info!(
        "Ignoring patterns: {}",
        config.ignore_patterns.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    match &config.include_extensions {
        Some(exts) => log::info!(
            "Including ONLY extensions: {}",
            exts.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
        None => log::info!(
            "Considering code extensions: {}",
            config.code_extensions.iter().cloned().collect::<Vec<_>>().join(", ")
        ),
    }

    // 4. Scan
    let filter = PathFilter::new(&target, &config).excluding_output(&output_path);
    let mut collected = Scanner::new(&target, &filter).scan();
    if collected.included.is_empty() && collected.skipped.is_empty() {
        log::warn!("No files found at all in the input path.");
    }

    // 5. Generate Output
    let tree = OutputGenerator::tree_section(&target, &config, || {
        log::info!("Generating project tree...");
        TreeRenderer::new(&filter).render(&target.root)
    });
    let document = OutputGenerator::build_document(&target, tree, &mut collected);
    let rendered = document.render();

    println!("Writing output to: {}", output_path.display());
    write_atomic(&output_path, &rendered)
        .with_context(|| format!("Fatal: could not write {}", output_path.display()))?;

    // 6. Summary
    print_summary(
        &output_path.display().to_string(),
        collected.included.len(),
        document.content_size(),
        &collected.skipped,
        args.verbose,
    );

    if args.clipboard {
        match clipboard::copy_to_clipboard(&rendered) {
            Ok(()) => println!("Markdown content copied to clipboard!"),
            Err(err) => {
                log::warn!("Error copying to clipboard: {}", err);
                println!("Clipboard functionality may not be available on this system.");
            }
        }
    }

    println!("\nDone.");
    Ok(())
}

/// Verbosity 0 shows progress, `-v` adds skip details, `-vv` traces every decision.
fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn print_summary(
    output: &str,
    included: usize,
    content_size: usize,
    skipped: &BTreeMap<String, String>,
    verbose: u8,
) {
    println!("\n--- Summary ---");
    println!("Markdown output generated at: {}", output);
    println!("Included {} files.", included);
    println!("Total content size: {:.2} KB", content_size as f64 / 1024.0);

    if skipped.is_empty() {
        return;
    }
    println!("Skipped {} files/directories.", skipped.len());
    if verbose > 0 {
        println!("Skipped items:");
        for reason in skipped.values() {
            log::debug!("- {}", reason);
        }
    } else {
        println!("(Use -v to see details of skipped items)");
    }
}
