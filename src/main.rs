use clap::Parser;
use dnsval::compose::compose_answer;
use dnsval::config::{ValidatorConfig, load_policy};
use dnsval::dns::{Name, RecordClass, RecordType};
use dnsval::dnssec::Policy;
use dnsval::transport::StaticTransport;
use dnsval::validator::{ResolveFlags, Validator};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Resolve a name over recorded zone data and report its DNSSEC status
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Name to resolve
    name: Name,

    /// Record type
    #[arg(default_value = "A")]
    rtype: RecordType,

    /// Record class
    #[arg(default_value = "IN")]
    class: RecordClass,

    /// Trust anchors and zone expectations (TOML); the root KSK when absent
    #[arg(short, long)]
    policy: Option<PathBuf>,

    /// Recorded answers to serve queries from (TOML)
    #[arg(short, long)]
    zone_data: PathBuf,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Validate signatures as of this UNIX time instead of now
    #[arg(long)]
    time: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            error!("{}", err);
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<bool, Box<dyn std::error::Error>> {
    let config = ValidatorConfig::from_env()?;
    config.validate()?;

    let policy = match &args.policy {
        Some(path) => load_policy(path)?,
        None => Policy::with_root_anchor()?,
    };
    let transport = StaticTransport::load(&args.zone_data)?;
    info!("Loaded {} recorded answers", transport.len());

    let mut validator = Validator::new(transport, policy).with_config(config);
    if let Some(time) = args.time {
        validator.set_current_time(time);
    }

    let resolution = validator
        .resolve_and_check(&args.name, args.rtype, args.class, ResolveFlags::default())
        .await?;
    let trusted = resolution.is_trusted();

    if args.json {
        let results: Vec<_> = resolution
            .results
            .iter()
            .map(|result| {
                json!({
                    "name": result.rrset.as_ref().map(|r| r.name.to_string()),
                    "type": result.rrset.as_ref().map(|r| r.rtype.to_string()),
                    "status": result.status,
                    "trusted": result.trusted,
                })
            })
            .collect();
        let composed = compose_answer(&resolution);
        let report = json!({
            "query": {
                "name": args.name.to_string(),
                "type": args.rtype.to_string(),
                "class": args.class.to_string(),
            },
            "rcode": composed.rcode,
            "authenticated": composed.authenticated,
            "rounds": resolution.rounds,
            "results": results,
            "cache": validator.cache().stats(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &resolution.results {
            match &result.rrset {
                Some(rrset) => println!(
                    "{} {} {}: {}",
                    rrset.name, rrset.class, rrset.rtype, result.status
                ),
                None => println!(
                    "{} {} {}: {}",
                    args.name, args.class, args.rtype, result.status
                ),
            }
        }
    }

    Ok(trusted)
}
