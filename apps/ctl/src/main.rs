//! Lumabeat Ctl - control client for the Lumabeat daemon.
//!
//! Sends one command over the daemon's control socket and prints the
//! response line. Exits nonzero when the daemon reports an error.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lumabeat_core::default_socket_path;
use lumabeat_core::protocol_constants::DEFAULT_MESSAGE_SHOW_TIME_MS;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Lumabeat Ctl - send a command to the Lumabeat daemon.
#[derive(Parser, Debug)]
#[command(name = "lumabeat-ctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the daemon's control socket.
    #[arg(short, long, env = "LUMABEAT_SOCKET")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: CtlCommand,
}

#[derive(Subcommand, Debug)]
enum CtlCommand {
    /// Allow the visualizer to run.
    Enable,
    /// Force the visualizer off.
    Disable,
    /// Show a transient text message on the display.
    Message {
        /// How long to show the message, in milliseconds.
        #[arg(short = 't', long, default_value_t = DEFAULT_MESSAGE_SHOW_TIME_MS)]
        show_time_ms: u64,
        /// The message text.
        #[arg(required = true)]
        text: Vec<String>,
    },
}

/// Formats the wire line for a subcommand.
fn command_line(command: &CtlCommand) -> String {
    match command {
        CtlCommand::Enable => "enable".to_string(),
        CtlCommand::Disable => "disable".to_string(),
        CtlCommand::Message { show_time_ms, text } => {
            format!("message {} {}", show_time_ms, text.join(" "))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let socket = args.socket.unwrap_or_else(default_socket_path);
    let line = command_line(&args.command);

    let stream = UnixStream::connect(&socket)
        .await
        .with_context(|| format!("Failed to connect to {}", socket.display()))?;
    let mut reader = BufReader::new(stream);

    reader
        .get_mut()
        .write_all(format!("{line}\n").as_bytes())
        .await
        .context("Failed to send command")?;

    let mut response = String::new();
    reader
        .read_line(&mut response)
        .await
        .context("Failed to read response")?;
    let response = response.trim_end();
    println!("{response}");

    if response != "ok" {
        std::process::exit(1);
    }
    Ok(())
}
