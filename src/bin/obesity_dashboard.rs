use obesity_dashboard::config::{Config, FileConfig};
use obesity_dashboard::fallback::FallbackData;
use obesity_dashboard::services::curator::CurationRules;
use obesity_dashboard::services::dashboard_service::DashboardService;
use obesity_dashboard::services::report;
use obesity_dashboard::sources::base::{NewsSource, QuoteSource};
use obesity_dashboard::sources::fixed::{FixedNewsSource, FixedQuoteSource};
use obesity_dashboard::sources::rss::RssNewsSource;
use obesity_dashboard::sources::yahoo::YahooQuoteSource;

use clap::{App, Arg, SubCommand};
use env_logger::Env;
use log::{error, info};
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let app = App::new("Obesity Dashboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Refreshes market data and news for the obesity drug dashboard")
        .subcommand(
            SubCommand::with_name("update")
                .about("Fetch quotes and news, then rewrite the dashboard JSON")
                .arg(
                    Arg::with_name("output")
                        .short('o')
                        .long("output")
                        .value_name("PATH")
                        .help("Where to write the dashboard document")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("config")
                        .short('c')
                        .long("config")
                        .value_name("PATH")
                        .help("JSON file overriding tickers, feeds, output and timezone")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("feed")
                        .short('f')
                        .long("feed")
                        .value_name("URL")
                        .help("RSS/Atom feed to poll (repeatable, replaces the default list)")
                        .takes_value(true)
                        .multiple_occurrences(true),
                )
                .arg(
                    Arg::with_name("offline")
                        .long("offline")
                        .help("Skip network sources and publish fallback data")
                        .takes_value(false),
                ),
        )
        .subcommand(
            SubCommand::with_name("summary")
                .about("Print a summary of an existing dashboard document")
                .arg(
                    Arg::with_name("input")
                        .short('i')
                        .long("input")
                        .value_name("PATH")
                        .help("Dashboard document to read")
                        .takes_value(true)
                        .default_value(obesity_dashboard::config::DEFAULT_OUTPUT_PATH),
                )
                .arg(
                    Arg::with_name("top")
                        .short('t')
                        .long("top")
                        .value_name("N")
                        .help("Number of movers and news items to show")
                        .takes_value(true)
                        .default_value("5"),
                ),
        );

    let matches = app.get_matches();

    if let Some(matches) = matches.subcommand_matches("update") {
        let mut config = Config::new();

        if let Some(path) = matches.value_of("config") {
            info!("Loading config from {}", path);
            config = config.apply_file(FileConfig::from_file(path)?)?;
        }
        if let Some(output) = matches.value_of("output") {
            config = config.with_output_path(output);
        }
        if let Some(feeds) = matches.values_of("feed") {
            config = config.with_feeds(feeds.map(|f| f.to_string()).collect());
        }
        config = config.with_offline(matches.is_present("offline"));

        let quote_source: Arc<dyn QuoteSource + Send + Sync>;
        let news_source: Arc<dyn NewsSource + Send + Sync>;
        if config.offline {
            info!("Offline mode: publishing fallback data");
            quote_source = Arc::new(FixedQuoteSource::new());
            news_source = Arc::new(FixedNewsSource::new());
        } else {
            quote_source = Arc::new(YahooQuoteSource::new(config.request_timeout_secs)?);
            news_source = Arc::new(RssNewsSource::new(config.request_timeout_secs)?);
        }

        info!("Tracking {} tickers, {} feeds", config.watchlist.len(), config.feeds.len());
        info!("Output: {}", config.output_path.display());

        let service = DashboardService::new(
            config,
            quote_source,
            news_source,
            Arc::new(FallbackData::builtin()),
            CurationRules::obesity_default(),
        );

        if let Err(e) = service.run().await {
            error!("Dashboard update failed: {}", e);
            return Err(e.into());
        }
    } else if let Some(matches) = matches.subcommand_matches("summary") {
        let input = matches.value_of("input").unwrap_or(obesity_dashboard::config::DEFAULT_OUTPUT_PATH);
        let top = matches.value_of("top")
            .unwrap_or("5")
            .parse::<usize>()
            .unwrap_or(5);

        let document = report::load_document(input)?;
        println!("{}", report::render_report(&document, top));
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
