//! Solana Vanity Keypair Generator CLI
//!
//! Usage:
//!   sol_vanity -s pump            # Find a key ending with "pump"
//!   sol_vanity -s Sun -c          # Case-sensitive match only
//!   sol_vanity -s 7 --no-parallel # Single worker, 300k attempt ceiling

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sol_vanity::{Config, SearchCoordinator, Suffix, VanityKeypair};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let coordinator = SearchCoordinator::new(config.search_config());
    let search_config = coordinator.config();

    println!("Solana Vanity Keypair Generator");
    println!("===============================");
    match Suffix::parse(&config.suffix) {
        Ok(suffix) => {
            println!("Suffix:     {}", suffix);
            println!("Difficulty: {}", suffix.difficulty_description());
        }
        Err(e) => println!("Suffix:     none ({})", e),
    }
    println!("Workers:    {}", search_config.worker_count(search_config.max_workers));
    println!("Budget:     {} attempts", format_number(search_config.total_budget));
    if let Some(timeout) = search_config.timeout {
        println!("Timeout:    {}s", timeout.as_secs());
    }
    println!();

    ctrlc_handler(coordinator.stop_flag_clone());

    println!("Searching... (Press Ctrl+C to stop)\n");
    let result = coordinator.generate(&config.suffix);

    print_result(&result);
}

fn print_result(result: &VanityKeypair) {
    let diagnostics = &result.diagnostics;

    match diagnostics.match_kind {
        Some(kind) => println!("=== Match ({}) ===", kind),
        None => println!("=== Random keypair ==="),
    }
    println!("Public Key:  {}", result.keypair.pubkey());
    println!("Secret Key:  {}", result.keypair.secret_base58());
    if let Some(reason) = diagnostics.fallback {
        println!("Fallback:    {}", reason);
    }
    println!();

    println!("--- Statistics ---");
    println!("Keys generated: {}", format_number(diagnostics.attempts));
    println!("Time elapsed:   {:.2}s", diagnostics.elapsed.as_secs_f64());
    println!(
        "Average speed:  {}/s",
        format_number(diagnostics.keys_per_second() as u64)
    );
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
}
