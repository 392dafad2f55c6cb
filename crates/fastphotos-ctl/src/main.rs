//! fastphotos-ctl — command-line interface for the FastPhotos receiver.

mod cmd;

use anyhow::{Context, Result};

use fastphotos_core::config::FastPhotosConfig;

fn print_usage(port: u16, addr: &str) {
    println!("Usage: fastphotos-ctl [--port <port>] [--addr <host:port>] <command>");
    println!();
    println!("Receiver commands:");
    println!("  status                      Show scheduler, preload, and stream state");
    println!("  senders                     List connected senders");
    println!("  shutdown                    Ask the receiver to exit");
    println!();
    println!("Sender commands:");
    println!("  show <url> [<precache>...]  Display an image and wait for the result");
    println!("  precache <url>              Queue an image for preloading, stay attached");
    println!("  video <stream>...           Play a video from ranked streams, stay attached");
    println!();
    println!("Options:");
    println!("  --port <port>       Status API port (default: {})", port);
    println!("  --addr <host:port>  Receiver transport address (default: {})", addr);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let network = FastPhotosConfig::load().unwrap_or_default().network;
    let mut port = network.api_port;
    let mut addr = network.listen_addr;

    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--addr" => {
                i += 1;
                addr = args.get(i).context("--addr requires a value")?.clone();
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    let owned = |rest: &[&str]| -> Vec<String> { rest.iter().map(|s| s.to_string()).collect() };

    match remaining.as_slice() {
        ["status"] | [] => cmd::status::cmd_status(port).await,
        ["senders"] => cmd::status::cmd_senders(port).await,
        ["shutdown"] => cmd::status::cmd_shutdown(port).await,
        ["show", url, rest @ ..] => cmd::cast::cmd_show(&addr, url, &owned(rest)).await,
        ["precache", rest @ ..] => cmd::cast::cmd_precache(&addr, &owned(rest)).await,
        ["video", rest @ ..] => cmd::cast::cmd_video(&addr, &owned(rest)).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage(port, &addr);
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage(port, &addr);
            std::process::exit(1);
        }
    }
}
