//! Orbital pursuit-evasion rollout CLI.
//!
//! Run seeded episodes with scripted policies, print a summary, optionally
//! export frame data or stream to a Rerun viewer.

use clap::Parser;
use pe_core::{DisplaySink, EpisodeConfig, NullSink};
use pe_sim::{EpisodeExport, PolicyKind, RerunViewer, RolloutResult, RolloutRunner};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Orbital pursuit-evasion rollout runner
#[derive(Parser, Debug)]
#[command(name = "pe-sim")]
#[command(about = "Run 1v1 orbital pursuit-evasion episodes", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = derive from wall clock)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of episodes to run (seeds increment from the master seed)
    #[arg(short, long, default_value = "1")]
    episodes: usize,

    /// Pursuer policy (fixed, random, pursuit)
    #[arg(long, default_value = "pursuit")]
    pursuer: String,

    /// Evader policy (fixed, random, pursuit)
    #[arg(long, default_value = "fixed")]
    evader: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export episode frames to a JSON file (single episode only)
    #[arg(long)]
    export: Option<String>,

    /// Stream to a Rerun viewer (requires the visualization feature)
    #[arg(long)]
    visualize: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let pursuer: PolicyKind = args.pursuer.parse().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let evader: PolicyKind = args.evader.parse().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    if args.export.is_some() && args.episodes > 1 {
        eprintln!("Error: --export only supports a single episode");
        std::process::exit(1);
    }

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64
    } else {
        args.seed
    };

    if !args.json {
        info!("pe-sim v0.1.0");
        info!(
            "episodes={} base_seed={} pursuer={} evader={}",
            args.episodes,
            base_seed,
            pursuer.name(),
            evader.name()
        );
    }

    let config = EpisodeConfig::default();
    let runner = RolloutRunner::new(config.clone()).with_policies(pursuer, evader);

    let mut sink: Box<dyn DisplaySink> = if args.visualize {
        Box::new(RerunViewer::new("pe_sim"))
    } else {
        Box::new(NullSink)
    };

    let mut results: Vec<RolloutResult> = Vec::new();
    for i in 0..args.episodes {
        let seed = base_seed.wrapping_add(i as u64);

        let mut export = args
            .export
            .as_ref()
            .map(|_| EpisodeExport::new(seed, config.capture_radius));

        let result = match runner.run(seed, sink.as_mut(), export.as_mut()) {
            Ok(result) => result,
            Err(e) => {
                error!("episode seed={} failed: {}", seed, e);
                std::process::exit(1);
            }
        };

        if let (Some(path), Some(export)) = (&args.export, &export) {
            if let Err(e) = export.write_to_file(path) {
                error!("Failed to write export: {:?}", e);
                std::process::exit(1);
            }
            info!("Exported {} frames to {}", export.frames.len(), path);
        }

        results.push(result);
    }

    // Summary
    let captures = results.iter().filter(|r| r.captured).count();
    let truncations = results.iter().filter(|r| r.truncated && !r.captured).count();

    if args.json {
        let summary = serde_json::json!({
            "episodes": results.len(),
            "captures": captures,
            "truncations": truncations,
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "seed": r.seed,
                    "steps": r.steps,
                    "captured": r.captured,
                    "truncated": r.truncated,
                    "final_separation_m": r.final_separation,
                    "final_time_secs": r.final_time_secs,
                    "pursuer_dv_spent": r.pursuer_dv_spent,
                    "evader_dv_spent": r.evader_dv_spent,
                })
            }).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    } else {
        info!("");
        info!(
            "{} episodes: {} captured, {} truncated",
            results.len(),
            captures,
            truncations
        );
        for r in &results {
            info!(
                "  seed={}: {} in {} steps, final separation {:.1} m, pursuer dv {:.2} m/s",
                r.seed,
                if r.captured { "capture" } else { "truncation" },
                r.steps,
                r.final_separation,
                r.pursuer_dv_spent,
            );
        }
    }
}
