//! Command-line driver for the headless bridge host.

use std::time::Duration;

use anyhow::{Context, Result};
use bridge::{Bridge, BridgeConfig};
use bridge_channel::pair;
use clap::{Parser, Subcommand};
use rndom_host::{builtin_native_modules, demo, Instance, InstanceOptions};

/// Text rendering helpers used by the CLI commands.
mod render {
    use std::fmt::Write;

    use bridge::{BridgeStats, FrameReport};
    use bridge_channel::ModuleConfig;

    fn list(items: impl IntoIterator<Item = impl std::fmt::Display>) -> String {
        items
            .into_iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One line per module descriptor, in module id order.
    pub fn descriptors(bundle: &str, config: &[ModuleConfig]) -> String {
        let mut out = String::new();
        writeln!(out, "bundle: {bundle}").expect("write bundle");
        for (module_id, module) in config.iter().enumerate() {
            let constants = match &module.constants {
                Some(constants) => list(constants.keys()),
                None => "-".into(),
            };
            writeln!(
                out,
                "{module_id:>2} {:<18} methods=[{}] promise=[{}] constants=[{constants}]",
                module.name,
                list(&module.methods),
                list(&module.promise_methods),
            )
            .expect("write module");
        }
        out
    }

    pub fn frame(index: u64, report: &FrameReport) -> String {
        format!(
            "frame {index:>4}: dispatched={} failed={}\n",
            report.dispatched, report.failed
        )
    }

    pub fn stats(stats: &BridgeStats) -> String {
        format!(
            "inbound={} dropped={} queued={} dispatched={} failed={} frames={}\n",
            stats.inbound, stats.dropped, stats.queued, stats.dispatched, stats.failed, stats.frames
        )
    }
}

/// Drive a headless bridge host.
#[derive(Parser, Debug)]
#[command(author, version, about = "Headless bridge host", long_about = None)]
struct Cli {
    /// Register the dev loading view and dev settings modules.
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the loadBridgeConfig payload for the built-in modules.
    Describe {
        /// Bundle location placed in the payload.
        #[arg(long, default_value = demo::DEMO_BUNDLE)]
        bundle: String,
    },
    /// Run the built-in demo bundle and print frame traffic.
    Demo {
        /// Maximum number of frames to run.
        #[arg(long, default_value_t = 240)]
        frames: usize,
        /// Milliseconds to wait for worker traffic per frame.
        #[arg(long, default_value_t = 16)]
        pacing_ms: u64,
        /// Application module to start.
        #[arg(long, default_value = demo::DEMO_APP)]
        module_name: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Describe { bundle } => describe(&bundle, cli.dev),
        Command::Demo {
            frames,
            pacing_ms,
            module_name,
        } => run_demo(&module_name, cli.dev, frames, Duration::from_millis(pacing_ms)),
    }
}

fn describe(bundle: &str, dev: bool) -> Result<()> {
    let (host, _worker) = pair();
    let config = BridgeConfig::new(demo::DEMO_APP, bundle).with_dev_mode(dev);
    let bridge = Bridge::new(config, host, &builtin_native_modules(dev))
        .context("failed to register built-in modules")?;
    let payload = bridge.bridge_config_payload();
    print!("{}", render::descriptors(&payload.bundle, &payload.config));
    Ok(())
}

fn run_demo(module_name: &str, dev: bool, max_frames: usize, pacing: Duration) -> Result<()> {
    let options = InstanceOptions {
        dev_mode: dev,
        enable_hot_reload: dev,
        ..InstanceOptions::default()
    };
    let mut instance = Instance::new(demo::DEMO_BUNDLE, module_name, options, demo::bundles())?;
    instance.start()?;
    instance.wait_for_load(Duration::from_secs(5))?;

    for _ in 0..max_frames {
        instance.bridge_mut().pump_blocking(pacing)?;
        if !instance.bridge().should_continue() {
            break;
        }
        let now_ms = instance.bridge().handle().now_ms();
        let report = instance.run_frame(now_ms)?;
        if report.dispatched > 0 || report.failed > 0 {
            print!("{}", render::frame(instance.frames(), &report));
        }
    }

    print!("{}", render::stats(&instance.bridge().stats()));
    instance.shutdown()
}
