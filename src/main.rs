use herd::{
    ApiKey, GooglePlacesClient, HerdOptions, HerdServerConfig, MeshTopology, PlacesProvider, UnconfiguredPlaces,
};
use std::error::Error;
use std::sync::Arc;
use tokio::time::Duration;

const DEFAULT_TOPOLOGY_PATH: &str = "topology.json";
const PLACES_KEY_ENV: &str = "GPLACE_KEY";
const PLACES_TIMEOUT: Duration = Duration::from_secs(5);

struct Args {
    server_name: String,
    topology_path: String,
    log_file: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = match parse_args(std::env::args().collect()) {
        Some(args) => args,
        None => {
            eprintln!("Usage: herd <ServerName> [--topology <path>] [--log-file <path>]");
            eprintln!("Example: herd Bailey --topology demos/topology.json");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args).await {
        eprintln!("herd: {}", e);
        std::process::exit(1);
    }
}

fn parse_args(args: Vec<String>) -> Option<Args> {
    let mut server_name = None;
    let mut topology_path = DEFAULT_TOPOLOGY_PATH.to_string();
    let mut log_file = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--topology" => {
                topology_path = args.get(i + 1)?.clone();
                i += 2;
            }
            "--log-file" => {
                log_file = Some(args.get(i + 1)?.clone());
                i += 2;
            }
            flag if flag.starts_with("--") => return None,
            name => {
                if server_name.is_some() {
                    return None;
                }
                server_name = Some(name.to_string());
                i += 1;
            }
        }
    }

    Some(Args {
        server_name: server_name?,
        topology_path,
        log_file,
    })
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let logger = match &args.log_file {
        Some(path) => herd::create_root_logger_for_file(path, &args.server_name)?,
        None => herd::create_root_logger_for_stdout(&args.server_name),
    };

    let topology = MeshTopology::from_json_file(&args.topology_path)?;

    let places: Arc<dyn PlacesProvider> = match ApiKey::from_env(PLACES_KEY_ENV) {
        Some(api_key) => Arc::new(GooglePlacesClient::new(logger.clone(), api_key, PLACES_TIMEOUT)),
        None => {
            slog::warn!(logger, "{} is not set; WHATSAT queries will be rejected", PLACES_KEY_ENV);
            Arc::new(UnconfiguredPlaces)
        }
    };

    let server = herd::try_create_herd_server(HerdServerConfig {
        my_server_id: args.server_name,
        topology,
        places,
        info_logger: logger.clone(),
        options: HerdOptions::default(),
    })
    .await?;
    slog::info!(logger, "Server online"; "addr" => %server.local_addr());

    tokio::signal::ctrl_c().await?;
    slog::info!(logger, "Interrupted, shutting down");
    server.shutdown();

    Ok(())
}
