//! lambdawrap - invoke a function unit from the command line
//!
//! Sends one JSON event to a remote Lambda function or an HTTP endpoint and
//! prints the decoded result.

mod config;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lambdawrap::{
    CustomContext, Descriptor, InvocationOptions, InvocationType, LogType, SharedClientConfig,
    Wrapped,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lambdawrap")]
#[command(about = "Invoke in-process, remote and HTTP function units", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "LAMBDAWRAP_LOG_LEVEL", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Invoke a function and print its result
    Invoke(InvokeArgs),
}

#[derive(clap::Args, Debug)]
struct InvokeArgs {
    /// Remote function name, or an http(s):// endpoint URL
    target: String,

    /// Event as inline JSON
    #[arg(long, conflicts_with = "payload_file")]
    payload: Option<String>,

    /// Read the event from a JSON file
    #[arg(long)]
    payload_file: Option<PathBuf>,

    /// Region of the remote function
    #[arg(long, env = "LAMBDAWRAP_REGION")]
    region: Option<String>,

    /// Lambda endpoint URL, e.g. a local emulator
    #[arg(long, env = "LAMBDAWRAP_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// RequestResponse, Event or DryRun
    #[arg(long, env = "LAMBDAWRAP_INVOCATION_TYPE")]
    invocation_type: Option<String>,

    /// None or Tail
    #[arg(long, env = "LAMBDAWRAP_LOG_TYPE")]
    log_type: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("lambdawrap={},lambdawrap_cli={}", args.log_level, args.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config::Config::load().context("Failed to load configuration")?;

    match args.command {
        Command::Invoke(invoke) => run_invoke(invoke, config).await,
    }
}

async fn run_invoke(args: InvokeArgs, config: config::Config) -> anyhow::Result<()> {
    let options = invocation_options(&args, config.invocation.into_options()?)?;
    let event = read_event(&args)?;

    let mut client = config.client;
    if args.region.is_some() {
        client.region = args.region.clone();
    }
    if args.endpoint_url.is_some() {
        client.endpoint_url = args.endpoint_url.clone();
    }

    let descriptor = descriptor(&args.target);
    info!(
        target = %args.target,
        invocation_type = options.invocation_type.as_str(),
        "Invoking"
    );

    let wrapped = Wrapped::builder(descriptor)
        .options(options)
        .client_config(SharedClientConfig::new(client.into_client_config()))
        .build();

    match wrapped.invoke(event, CustomContext::new()).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            error!(kind = e.kind().as_str(), error = %e, "Invocation failed");
            if let Some(function_error) = e.as_function_error() {
                eprintln!("{}", serde_json::to_string_pretty(&function_error.to_json())?);
            }
            Err(e.into())
        }
    }
}

/// URLs are HTTP endpoints; anything else names a remote function
fn descriptor(target: &str) -> Descriptor {
    if target.starts_with("http://") || target.starts_with("https://") {
        Descriptor::endpoint(target)
    } else {
        Descriptor::remote(target)
    }
}

fn invocation_options(
    args: &InvokeArgs,
    mut options: InvocationOptions,
) -> anyhow::Result<InvocationOptions> {
    if let Some(s) = &args.invocation_type {
        options.invocation_type = InvocationType::from_str(s)
            .ok_or_else(|| anyhow::anyhow!("Unknown invocation type '{}'", s))?;
    }
    if let Some(s) = &args.log_type {
        options.log_type =
            LogType::from_str(s).ok_or_else(|| anyhow::anyhow!("Unknown log type '{}'", s))?;
    }
    Ok(options)
}

/// The event defaults to `{}` when no payload is given
fn read_event(args: &InvokeArgs) -> anyhow::Result<Value> {
    let raw = match (&args.payload, &args.payload_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => return Ok(Value::Object(Default::default())),
    };

    serde_json::from_str(&raw).context("Payload is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(argv: &[&str]) -> InvokeArgs {
        let args = Args::try_parse_from(argv).unwrap();
        match args.command {
            Command::Invoke(invoke) => invoke,
        }
    }

    #[test]
    fn test_descriptor_from_target() {
        assert!(matches!(descriptor("https://fn.example.com"), Descriptor::Endpoint(_)));
        assert!(matches!(descriptor("http://localhost:9000/run"), Descriptor::Endpoint(_)));
        assert!(matches!(descriptor("orders"), Descriptor::Module(_)));
    }

    #[test]
    fn test_invoke_args() {
        let args = parse(&[
            "lambdawrap",
            "invoke",
            "orders",
            "--payload",
            r#"{"n":1}"#,
            "--invocation-type",
            "Event",
            "--log-type",
            "Tail",
        ]);

        assert_eq!(read_event(&args).unwrap(), json!({ "n": 1 }));
        let options = invocation_options(&args, InvocationOptions::default()).unwrap();
        assert_eq!(options.invocation_type, InvocationType::Event);
        assert_eq!(options.log_type, LogType::Tail);
    }

    #[test]
    fn test_defaults_and_rejections() {
        let args = parse(&["lambdawrap", "invoke", "orders"]);
        assert_eq!(read_event(&args).unwrap(), json!({}));

        let args = parse(&["lambdawrap", "invoke", "orders", "--invocation-type", "Later"]);
        assert!(invocation_options(&args, InvocationOptions::default()).is_err());

        let args = parse(&["lambdawrap", "invoke", "orders", "--payload", "{not json"]);
        assert!(read_event(&args).is_err());
    }

    #[test]
    fn test_payload_sources_conflict() {
        let result = Args::try_parse_from([
            "lambdawrap",
            "invoke",
            "orders",
            "--payload",
            "{}",
            "--payload-file",
            "event.json",
        ]);
        assert!(result.is_err());
    }
}
