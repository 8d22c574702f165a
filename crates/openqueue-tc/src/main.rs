//! `tc`-style front end for OpenQueue ports.
//!
//! Resolves a registered port policy, optionally drives synthetic traffic
//! through an in-process scheduler, and prints the queue counters in the
//! classic `tc` listing format (or JSON).
//!
//! ```text
//! Usage: openqueue-tc policy <name> [--packets N] [--max-len N] [--seed N]
//!                     [--drain] [--scenario FILE] [--json]
//! ```
//!
//! Later flags win; `--scenario` replaces the whole run description with the
//! TOML file's contents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use quanta::Instant;
use rand::rngs::SmallRng;
use rand::{RngExt, SeedableRng};
use serde::Deserialize;
use tracing::info;

use openqueue_core::packet::PacketRef;
use openqueue_core::policies;
use openqueue_core::registry::PolicyRegistry;
use openqueue_core::scheduler::Scheduler;

/// A traffic run, loadable from TOML and overridable from the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Scenario {
    /// Port-policy name resolved against the registry.
    policy: String,
    /// Synthetic packets to offer.
    packets: u64,
    /// Largest synthetic payload in bytes.
    max_len: u32,
    /// Seed for the traffic generator.
    seed: u64,
    /// Drain the port after the arrival burst.
    drain: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            policy: "longest_first".to_string(),
            packets: 0,
            max_len: 1500,
            seed: 0x0CEA,
            drain: false,
        }
    }
}

fn usage() -> &'static str {
    "Usage: openqueue-tc policy <name> [--packets N] [--max-len N] [--seed N] [--drain] [--scenario FILE] [--json]"
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let mut scenario = Scenario::default();
    let mut json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "policy" => {
                scenario.policy = args.next().context("missing policy name")?;
            }
            "--scenario" => {
                let path = args.next().context("missing --scenario value")?;
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading scenario {path}"))?;
                scenario = toml::from_str(&text)
                    .with_context(|| format!("parsing scenario {path}"))?;
            }
            "--packets" => {
                scenario.packets = args.next().context("missing --packets value")?.parse()?;
            }
            "--max-len" => {
                scenario.max_len = args.next().context("missing --max-len value")?.parse()?;
            }
            "--seed" => {
                scenario.seed = args.next().context("missing --seed value")?.parse()?;
            }
            "--drain" => scenario.drain = true,
            "--json" => json = true,
            "help" | "--help" => {
                eprintln!("{}", usage());
                return Ok(());
            }
            other => bail!("unknown parameter {other:?}\n{}", usage()),
        }
    }

    policies::register_builtin(PolicyRegistry::global())?;

    let dropped = Arc::new(AtomicU64::new(0));
    let drop_count = Arc::clone(&dropped);
    let mut sched = Scheduler::with_policy(
        &scenario.policy,
        PolicyRegistry::global(),
        Box::new(move |_pkt| {
            drop_count.fetch_add(1, Ordering::Relaxed);
        }),
    )?;

    info!(
        policy = %scenario.policy,
        port = sched.port().name(),
        queues = sched.port().num_queues(),
        "port initialized"
    );

    if scenario.packets > 0 {
        let mut rng = SmallRng::seed_from_u64(scenario.seed);
        let started = Instant::now();
        let mut delivered = 0u64;

        let len_span = scenario.max_len.saturating_sub(63).max(1);
        for token in 0..scenario.packets {
            let pkt = PacketRef::new(token)
                .with_len(64 + rng.random::<u32>() % len_span)
                .with_tos(rng.random::<u8>());
            sched.enqueue(pkt)?;
        }
        if scenario.drain {
            while sched.dequeue()?.is_some() {
                delivered += 1;
            }
        }

        info!(
            offered = scenario.packets,
            delivered,
            dropped = dropped.load(Ordering::Relaxed),
            elapsed_us = started.elapsed().as_micros() as u64,
            "run complete"
        );
    }

    let dump = sched.dump();
    if json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
    } else {
        print!("{dump}");
    }
    Ok(())
}
