/// Version injected at compile time via ARMNET_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ARMNET_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{anyhow, bail, Context, Result};
use armnet::arm::auth::Credentials;
use armnet::arm::http::HttpTransport;
use armnet::arm::ArmClient;
use armnet::config::Config;
use armnet::error::format_arm_error;
use armnet::fluent::{Collection, ResourceKind};
use armnet::model::Region;
use armnet::{BatchItem, NetworkManager};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Manage cloud network resources
#[derive(Parser, Debug)]
#[command(name = "armnet", version = VERSION, about, long_about = None)]
struct Args {
    /// Subscription to use
    #[arg(short, long)]
    subscription: Option<String>,

    /// Resource group to scope commands to
    #[arg(short = 'g', long)]
    resource_group: Option<String>,

    /// Management endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Output format for resources
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List resources of one type
    List {
        kind: KindArg,
        /// Only show resources in this region
        #[arg(long)]
        region: Option<String>,
    },
    /// Show one resource, by name within the resource group or by id
    Get {
        kind: KindArg,
        #[arg(required_unless_present = "id")]
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        id: Option<String>,
    },
    /// Delete resources by id
    Delete {
        kind: KindArg,
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Start application gateways by id
    Start {
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Stop application gateways by id
    Stop {
        #[arg(long = "id", required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the saved configuration
    Show,
    /// Save one setting
    Set { key: ConfigKey, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigKey {
    Subscription,
    ResourceGroup,
    Region,
    Endpoint,
    BatchConcurrency,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    RouteTables,
    VirtualNetworks,
    PublicIpAddresses,
    NetworkWatchers,
    ApplicationGateways,
    VirtualNetworkGateways,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("armnet {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("armnet").join("armnet.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".armnet").join("armnet.log");
    }
    PathBuf::from("armnet.log")
}

/// Run `$body` with `$collection` bound to the collection `$kind` names
macro_rules! with_collection {
    ($network:expr, $kind:expr, |$collection:ident| $body:expr) => {
        match $kind {
            KindArg::RouteTables => {
                let $collection = $network.route_tables();
                $body
            }
            KindArg::VirtualNetworks => {
                let $collection = $network.virtual_networks();
                $body
            }
            KindArg::PublicIpAddresses => {
                let $collection = $network.public_ip_addresses();
                $body
            }
            KindArg::NetworkWatchers => {
                let $collection = $network.network_watchers();
                $body
            }
            KindArg::ApplicationGateways => {
                let $collection = $network.application_gateways();
                $body
            }
            KindArg::VirtualNetworkGateways => {
                let $collection = $network.virtual_network_gateways();
                $body
            }
        }
    };
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;
    let mut config = Config::load();

    if let Command::Config { action } = &args.command {
        return run_config(&mut config, action, args.output);
    }

    let subscription = config
        .effective_subscription(args.subscription.as_deref())
        .ok_or_else(|| {
            anyhow!("No subscription configured. Set AZURE_SUBSCRIPTION_ID or use --subscription")
        })?;
    let endpoint = config.effective_endpoint(args.endpoint.as_deref());
    let resource_group = config.effective_resource_group(args.resource_group.as_deref());
    tracing::info!("Using subscription: {}, endpoint: {}", subscription, endpoint);

    let transport = HttpTransport::new(&endpoint, Credentials::from_environment())
        .map_err(|e| anyhow!(format_arm_error(&e)))?;
    let client = ArmClient::new(Arc::new(transport), &subscription)
        .with_batch_concurrency(config.effective_batch_concurrency());
    let network = NetworkManager::new(client);

    let failures = match args.command {
        Command::List { kind, region } => {
            let region = config.effective_region(region.as_deref());
            with_collection!(network, kind, |collection| {
                list(collection, resource_group.as_deref(), region.as_ref(), args.output).await?
            });
            0
        }
        Command::Get { kind, name, id } => {
            with_collection!(network, kind, |collection| {
                get(collection, resource_group.as_deref(), name, id, args.output).await?
            });
            0
        }
        Command::Delete { kind, ids } => {
            with_collection!(network, kind, |collection| {
                report(collection.delete_by_ids(ids)).await
            })
        }
        Command::Start { ids } => report(network.application_gateways().start_by_ids(ids)).await,
        Command::Stop { ids } => report(network.application_gateways().stop_by_ids(ids)).await,
        Command::Config { .. } => 0,
    };

    if failures > 0 {
        eprintln!("{failures} operation(s) failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_config(config: &mut Config, action: &ConfigAction, output: OutputFormat) -> Result<ExitCode> {
    match action {
        ConfigAction::Show => print(&*config, output)?,
        ConfigAction::Set { key, value } => {
            match key {
                ConfigKey::Subscription => config.subscription_id = Some(value.clone()),
                ConfigKey::ResourceGroup => config.resource_group = Some(value.clone()),
                ConfigKey::Region => config.region = Some(Region::from_name(value)),
                ConfigKey::Endpoint => config.endpoint = Some(value.clone()),
                ConfigKey::BatchConcurrency => {
                    let limit = value
                        .parse()
                        .with_context(|| format!("Invalid batch concurrency: {value}"))?;
                    config.batch_concurrency = Some(limit);
                }
            }
            config.save()?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn list<K: ResourceKind>(
    collection: Collection<K>,
    resource_group: Option<&str>,
    region: Option<&Region>,
    output: OutputFormat,
) -> Result<()> {
    let stream = match resource_group {
        Some(rg) => collection.list_by_resource_group(rg),
        None => collection.list(),
    };
    let handles: Vec<_> = stream
        .try_filter(|h| futures::future::ready(region.map_or(true, |r| h.region() == Some(r))))
        .try_collect()
        .await
        .map_err(|e| anyhow!(format_arm_error(&e)))?;

    tracing::info!("Listed {} {} resource(s)", handles.len(), K::DISPLAY_NAME);
    let items: Vec<_> = handles.iter().map(|h| h.inner()).collect();
    print(&items, output)
}

async fn get<K: ResourceKind>(
    collection: Collection<K>,
    resource_group: Option<&str>,
    name: Option<String>,
    id: Option<String>,
    output: OutputFormat,
) -> Result<()> {
    let found = match (id, name) {
        (Some(id), _) => collection.get_by_id(&id).await,
        (None, Some(name)) => {
            let Some(rg) = resource_group else {
                bail!("--resource-group is required to look up a {} by name", K::DISPLAY_NAME);
            };
            collection.get_by_resource_group(rg, &name).await
        }
        (None, None) => bail!("Either a name or --id is required"),
    };
    let handle = found.map_err(|e| anyhow!(format_arm_error(&e)))?;
    print(handle.inner(), output)
}

/// Print one line per batch item and return how many failed
async fn report(items: BoxStream<'static, BatchItem<()>>) -> usize {
    items
        .fold(0, |failures, item| async move {
            match item.result {
                Ok(()) => {
                    println!("ok      {}", item.key);
                    failures
                }
                Err(e) => {
                    println!("failed  {}: {}", item.key, format_arm_error(&e));
                    failures + 1
                }
            }
        })
        .await
}

fn print<T: Serialize + ?Sized>(value: &T, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
