use clap::{Parser, ValueEnum};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::{Env, DEFAULT_FILTER_ENV};
use log::{info, LevelFilter};
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use lansim::config::Config;
use lansim::config_loader;
use lansim::packet::Packet;
use lansim::report::{host_table, SessionReport};
use lansim::scenario::{demo_scenario, ScenarioRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Step through DHCP, ARP and ICMP echo on a simulated LAN
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario configuration YAML file (runs the built-in demo when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print the rendered frame under each packet
    #[arg(long)]
    frames: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pause after each packet, in milliseconds (overrides general.settle_delay)
    #[arg(long)]
    settle_ms: Option<u64>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging before loading the configuration; general.log_level
    // sets the level afterwards unless RUST_LOG was given
    let env_filter = std::env::var_os(DEFAULT_FILTER_ENV).is_some();
    env_logger::Builder::from_env(Env::default().default_filter_or("trace")).init();
    if !env_filter {
        log::set_max_level(LevelFilter::Info);
    }

    info!("Starting LanSim");
    let config = match &args.config {
        Some(path) => {
            info!("Configuration file: {:?}", path);
            config_loader::load_config(path)?
        }
        None => {
            info!("No configuration given, running the demo scenario");
            Config::default()
        }
    };

    if !env_filter {
        if let Some(level) = &config.general.log_level {
            log::set_max_level(level.parse().unwrap_or(LevelFilter::Info));
        }
    }

    let steps = match config.scenario.as_deref() {
        Some(steps) if !steps.is_empty() => steps.to_vec(),
        _ => demo_scenario(),
    };

    let settle = args
        .settle_ms
        .map(Duration::from_millis)
        .unwrap_or(config.general.settle_delay);

    let mut runner = ScenarioRunner::new(&config);

    // Stream packets as they are sent when printing text to the terminal
    let streaming = args.format == OutputFormat::Text && args.output.is_none();
    if streaming {
        let frames = args.frames;
        runner.session_mut().subscribe(Box::new(move |packet: &Packet| {
            println!("#{:<3} {}: {} -> {}", packet.id, packet.kind, packet.from, packet.to);
            if frames {
                println!("{}", packet.frame);
            }
            if !settle.is_zero() {
                thread::sleep(settle);
            }
        }));
    }

    let summary = runner.run(&steps)?;
    let session = runner.session();

    if streaming {
        println!();
        print!("{}", host_table(&session.hosts()));
        return Ok(());
    }

    let report = SessionReport::new(session, Some(summary));
    let rendered = match args.format {
        OutputFormat::Text => report.to_text(args.frames),
        OutputFormat::Json => report.to_json().wrap_err("Failed to serialize report")?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .wrap_err_with(|| format!("Failed to write report to '{}'", path.display()))?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::parse_from(["lansim"]);

        assert_eq!(args.config, None);
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.frames);
        assert_eq!(args.settle_ms, None);
    }

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "lansim",
            "--config", "lab.yaml",
            "--format", "json",
            "--output", "report.json",
            "--frames",
            "--settle-ms", "250",
        ]);

        assert_eq!(args.config, Some(PathBuf::from("lab.yaml")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("report.json")));
        assert!(args.frames);
        assert_eq!(args.settle_ms, Some(250));
    }
}
