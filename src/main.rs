// src/main.rs
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use etude::{logging, Config, Server};

#[derive(Parser, Debug)]
#[command(name = "etude")]
#[command(about = "Static-content HTTP/1.1 server")]
#[command(version)]
// -h is the bind-address flag, so the short help flag is disabled
#[command(disable_help_flag = true)]
struct Cli {
    /// IPv4 address to bind
    #[arg(short = 'h', long = "host", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long = "port", default_value_t = 8080)]
    port: u16,

    /// Document root directory
    #[arg(short = 'd', long = "dir", default_value = ".")]
    dir: PathBuf,

    /// Append log output to this file instead of stdout
    #[arg(short = 'l', long = "log")]
    log: Option<PathBuf>,

    /// Worker thread count (default: cores x 11)
    #[arg(short = 'w', long = "workers")]
    workers: Option<usize>,

    /// Print help
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: Option<bool>,
}

fn main() {
    let cli = Cli::parse();

    // A dropped controlling terminal must not kill the server
    unsafe {
        libc::signal(libc::SIGHUP, libc::SIG_IGN);
    }

    if let Err(e) = logging::init(cli.log.as_deref()) {
        eprintln!("etude: cannot open log: {}", e);
        process::exit(1);
    }

    let config = Config {
        host: cli.host,
        port: cli.port,
        root: cli.dir,
        log: cli.log,
        workers: cli.workers,
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || shutdown.store(true, Ordering::Release)) {
            eprintln!("etude: cannot install signal handler: {}", e);
            process::exit(1);
        }
    }

    let mut server = match Server::new(&config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("etude: failed to start on {}: {}", config.listen_addr(), e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown) {
        error!("server exited with error: {}", e);
        process::exit(1);
    }
}
