use clap::{App, Arg};
use lodestone::logging;

mod config;
mod net;
mod robot;
#[cfg(test)]
mod test_utils;

use crate::config::ServerConfig;
use crate::net::endpoint::Endpoint;

fn main() {
    let matches = App::new("Beacon Server")
        .version("1.0")
        .about("Pilots robot clients to the beacon coordinate and collects their secrets.")
        .arg(
            Arg::with_name("CONFIG_FILE")
                .help("Path to the config file")
                .required(false),
        )
        .get_matches();

    let config = match matches.value_of("CONFIG_FILE") {
        Some(path) => ServerConfig::load(path),
        None => ServerConfig::default(),
    };

    let log = logging::init();

    logging::info!(log, "starting server";
                   "host" => %config.server.host,
                   "base_port" => config.server.base_port);

    let endpoint =
        Endpoint::bind(&config.server.host, config.server.base_port, &log).expect("Error binding listener");

    logging::info!(log, "listener ready"; "port" => endpoint.port());

    endpoint.run();
}
