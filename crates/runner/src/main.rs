use log::{error, info, warn};
use okws_core::payloads::{Account, FundingRate, LiquidationOrder, MarkPrice};
use okws_core::{
    CurrencyFilter, InstrumentId, InstrumentType, InstrumentTypeFilter, Push, SubscribeEvent,
};
use okws_gateway::{ClientConfig, Credentials, WsClient, load_config};
use tokio::sync::mpsc;

const DEFAULT_INSTRUMENT: &str = "BTC-USDT-SWAP";

fn print_help() {
    eprintln!(
        r#"okws - push-stream feed

USAGE:
    okws [OPTIONS]

OPTIONS:
    --config <PATH>       Load client configuration from a JSON file
    --inst <ID>           Instrument to follow (repeatable, default: {DEFAULT_INSTRUMENT})
    --account             Also follow the account channel (needs credentials)
    --help                Print this help message

ENVIRONMENT VARIABLES:
    OKWS_CONFIG           Config path when --config is not given
    OKWS_API_KEY          API key for the login-only channels
    OKWS_SECRET_KEY       Secret key
    OKWS_PASSPHRASE       Passphrase
    RUST_LOG              Log level filter
"#
    );
}

struct Options {
    config_path: Option<String>,
    instruments: Vec<InstrumentId>,
    account: bool,
}

fn parse_args() -> Result<Option<Options>, String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut options = Options {
        config_path: std::env::var("OKWS_CONFIG").ok(),
        instruments: Vec::new(),
        account: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--config" | "-c" => {
                options.config_path = Some(iter.next().ok_or("--config requires a path argument")?);
            }
            "--inst" | "-i" => {
                let id = iter.next().ok_or("--inst requires an instrument id")?;
                options.instruments.push(InstrumentId::new(id));
            }
            "--account" => options.account = true,
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    if options.instruments.is_empty() {
        options.instruments.push(InstrumentId::new(DEFAULT_INSTRUMENT));
    }
    Ok(Some(options))
}

/// Log every batch arriving on `rx` until the client stops
fn spawn_logger<T, F>(name: &'static str, mut rx: mpsc::Receiver<T>, describe: F)
where
    T: Send + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = rx.recv().await {
            info!("[{name}] {}", describe(&item));
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_args() {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            print_help();
            std::process::exit(1);
        }
    };

    let mut config = match &options.config_path {
        Some(path) => {
            info!("Loading configuration from: {path}");
            load_config(path)?
        }
        None => {
            info!("Using default configuration");
            ClientConfig::default()
        }
    };
    if config.credentials.is_none() {
        match Credentials::from_env() {
            Ok(credentials) => config.credentials = Some(credentials),
            Err(e) if options.account => return Err(e.into()),
            Err(_) => {}
        }
    }
    info!(
        "Endpoints: private={} public={}",
        config.url(true),
        config.url(false)
    );

    let client = WsClient::new(config)?;

    let (err_tx, mut err_rx) = mpsc::channel(16);
    client.set_error_sink(err_tx);
    tokio::spawn(async move {
        while let Some(event) = err_rx.recv().await {
            warn!("Exchange error {}: {}", event.code, event.msg);
        }
    });

    let (sub_tx, sub_rx) = mpsc::channel(16);
    client.set_subscribe_sink(sub_tx);
    spawn_logger("subscribe", sub_rx, |event: &SubscribeEvent| {
        format!("confirmed {:?}", event.arg.channel_name())
    });

    let (mark_tx, mark_rx) = mpsc::channel::<Push<MarkPrice>>(64);
    spawn_logger("mark-price", mark_rx, |push: &Push<MarkPrice>| {
        push.data
            .iter()
            .map(|m| format!("{} {}", m.inst_id, m.mark_px.unwrap_or_default()))
            .collect::<Vec<_>>()
            .join(", ")
    });
    client
        .public()
        .mark_price(&options.instruments, Some(mark_tx))
        .await?;

    let (funding_tx, funding_rx) = mpsc::channel::<Push<FundingRate>>(64);
    spawn_logger("funding-rate", funding_rx, |push: &Push<FundingRate>| {
        push.data
            .iter()
            .map(|f| {
                format!(
                    "{} rate={} next={}",
                    f.inst_id,
                    f.funding_rate.unwrap_or_default(),
                    f.next_funding_rate.unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    });
    client
        .public()
        .funding_rate(&options.instruments, Some(funding_tx))
        .await?;

    let (liq_tx, liq_rx) = mpsc::channel::<Push<LiquidationOrder>>(64);
    spawn_logger("liquidations", liq_rx, |push: &Push<LiquidationOrder>| {
        push.data
            .iter()
            .flat_map(|l| {
                l.details.iter().map(move |d| {
                    format!(
                        "{} {} notional={}",
                        l.inst_id,
                        d.side,
                        d.notional().unwrap_or_default()
                    )
                })
            })
            .collect::<Vec<_>>()
            .join(", ")
    });
    client
        .public()
        .liquidation_orders(
            &[InstrumentTypeFilter::new(InstrumentType::Swap)],
            Some(liq_tx),
        )
        .await?;

    if options.account {
        let (account_tx, account_rx) = mpsc::channel::<Push<Account>>(16);
        spawn_logger("account", account_rx, |push: &Push<Account>| {
            push.data
                .iter()
                .map(|a| format!("equity={}", a.total_eq.unwrap_or_default()))
                .collect::<Vec<_>>()
                .join(", ")
        });
        if let Err(e) = client
            .private()
            .account(CurrencyFilter::all(), Some(account_tx))
            .await
        {
            error!("Account subscription failed: {e}");
        }
    }

    info!("Streaming; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    client.shutdown();
    info!(
        "Deliveries: {} delivered, {} dropped, {} undecodable",
        client.stats().delivered(),
        client.stats().dropped(),
        client.stats().undecodable()
    );
    Ok(())
}
