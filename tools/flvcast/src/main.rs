use clap::{App, Arg, ArgMatches};
use flvcast_rtmp::{LogCrateLogger, Publisher, PublisherConfig};
use log::{error, info};
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("flvcast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Publishes an FLV file to an RTMP server in real time")
        .arg(
            Arg::with_name("host")
                .long("host")
                .takes_value(true)
                .default_value("127.0.0.1")
                .help("RTMP server to publish to"),
        )
        .arg(
            Arg::with_name("port")
                .long("port")
                .takes_value(true)
                .default_value("1935"),
        )
        .arg(
            Arg::with_name("app")
                .long("app")
                .takes_value(true)
                .default_value("live")
                .help("Application name on the server"),
        )
        .arg(
            Arg::with_name("stream")
                .long("stream")
                .takes_value(true)
                .required(true)
                .help("Stream name (key) to publish as"),
        )
        .arg(
            Arg::with_name("chunk-size")
                .long("chunk-size")
                .takes_value(true)
                .help("Outbound chunk size, announced to the server when not 128"),
        )
        .arg(
            Arg::with_name("file")
                .required(true)
                .index(1)
                .help("FLV file to publish"),
        )
        .get_matches();

    let config = match build_config(&matches) {
        Ok(config) => config,
        Err(message) => {
            error!("{}", message);
            process::exit(1);
        }
    };

    let file = matches.value_of("file").unwrap_or_default();
    info!(
        "Publishing {} to rtmp://{}:{}/{}/{}",
        file, config.host, config.port, config.app_name, config.stream_name
    );

    let mut publisher = Publisher::tcp(config, Arc::new(LogCrateLogger));
    match publisher.publish_file(file) {
        Ok(summary) => info!(
            "Finished: {} units, {} bytes, {} reconnects",
            summary.units_sent, summary.bytes_sent, summary.reconnects
        ),

        Err(error) => {
            error!("{}", error);
            process::exit(1);
        }
    }
}

fn build_config(matches: &ArgMatches) -> Result<PublisherConfig, String> {
    let port = matches
        .value_of("port")
        .unwrap_or("1935")
        .parse::<u16>()
        .map_err(|error| format!("Invalid port: {}", error))?;

    let mut config = PublisherConfig::new(
        matches.value_of("host").unwrap_or("127.0.0.1"),
        port,
        matches.value_of("app").unwrap_or("live"),
        matches.value_of("stream").unwrap_or_default(),
    );

    if let Some(chunk_size) = matches.value_of("chunk-size") {
        config.chunk_size = match chunk_size.parse::<u32>() {
            Ok(size) if size > 0 && size <= 0x7FFF_FFFF => size,
            _ => return Err(format!("Invalid chunk size: {}", chunk_size)),
        };
    }

    Ok(config)
}
