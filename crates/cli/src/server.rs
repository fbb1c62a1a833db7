//! Server administration.

use actix::System;
use actix_web::{App, HttpServer, middleware::{Compress, Logger}};
use failure::Error;
use lectern_models::Services;
use log::info;
use structopt::StructOpt;

use crate::{Config, VERSION};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Start the server
    #[structopt(name = "start")]
    Start,
}

pub fn main(cfg: Config, opts: Opts) -> Result<(), Error> {
    match opts.command {
        Command::Start => start(cfg),
    }
}

pub fn start(config: Config) -> Result<(), Error> {
    let system = System::new("lectern");

    let services = Services::configure(&config.model)?;

    let address = config.server.address;
    let domain = config.server.domain.clone();

    let server = HttpServer::new(move ||
        App::new()
            .hostname(&config.server.domain)
            .data(services.clone())
            .wrap(Logger::default())
            .wrap(Compress::default())
            .configure(lectern_rest_api::configure)
    );

    let server = if let Some(fd) = listenfd::ListenFd::from_env().take_tcp_listener(0)? {
        server.listen(fd)?
    } else {
        server.bind(address)?
    };

    info!("Starting lectern {} on {}", VERSION, address);

    server
        .server_hostname(domain)
        .start();

    system.run()?;

    Ok(())
}
