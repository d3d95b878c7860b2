// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use clap::Parser;
use storwatch::api::{init_tracing, run_serve_mode};
use storwatch::cli::{CheckArgs, Cli, Commands};
use storwatch::metrics::MetricsRegistry;
use storwatch::poller::Poller;
use storwatch::utils::{bytes_to_gib, format_bytes};
use tokio::signal;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    // Set up signal handler for clean shutdown
    tokio::spawn(async {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, shutting down");
            std::process::exit(0);
        }
    });

    #[cfg(unix)]
    tokio::spawn(async {
        if let Ok(mut sigterm) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            sigterm.recv().await;
            tracing::info!("received SIGTERM, shutting down");
            std::process::exit(0);
        }
    });

    let result = match cli.command {
        Commands::Serve(args) => match args.build_config() {
            Ok(config) => run_serve_mode(&config).await,
            Err(e) => Err(e),
        },
        Commands::Check(args) => run_check_mode(&args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_check_mode(args: &CheckArgs) -> storwatch::Result<()> {
    let config = args.build_config()?;
    let registry = Arc::new(MetricsRegistry::new());
    let poller = Poller::from_config(&config, registry)?;

    let report = poller.run_cycle().await?;

    println!(
        "{:<32} {:>10} {:>10} {:>10} {:>8}",
        "DISK", "TOTAL GiB", "USED GiB", "FREE GiB", "USE%"
    );
    for entity in &report.entities {
        println!(
            "{:<32} {:>10.2} {:>10.2} {:>10.2} {:>7.2}%",
            entity.label(),
            bytes_to_gib(entity.total_bytes),
            bytes_to_gib(entity.used_bytes),
            bytes_to_gib(entity.free_bytes),
            entity.usage_percent
        );
    }

    let total: u64 = report.entities.iter().map(|e| e.total_bytes).sum();
    println!(
        "\n{} fixed disk(s), {} total, {} alert(s) sent, {} logged only, {} failed",
        report.entities.len(),
        format_bytes(total),
        report.alerts_sent,
        report.alerts_logged,
        report.alerts_failed
    );
    Ok(())
}
