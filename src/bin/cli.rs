//! scull CLI Client
//!
//! Command-line interface for interacting with a scull server.

use clap::{Parser, Subcommand, ValueEnum};
use scull::network::Client;
use scull::{ControlCommand, Result, SeekMode};
use tracing_subscriber::{fmt, EnvFilter};

/// scull CLI
#[derive(Parser, Debug)]
#[command(name = "scull-cli")]
#[command(about = "CLI for the scull device server")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read bytes starting at an offset
    Read {
        /// Offset to seek to first
        start: i64,

        /// Number of bytes to read
        num: u32,
    },

    /// Write text starting at an offset
    Write {
        /// Offset to seek to first
        start: i64,

        /// Text to write
        text: String,
    },

    /// Issue a control command
    Ioctl {
        #[arg(value_enum)]
        action: IoctlAction,
    },

    /// Clear, write "abc" twice, read it back, dumping before and after
    Demo,

    /// Ping the server
    Ping,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum IoctlAction {
    /// Dump memory to the server log
    Show,

    /// Zero the device memory
    Clear,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Read { start, num } => {
            client.seek(start, SeekMode::Absolute)?;
            let bytes = client.read(num)?;
            println!("Read: {}", String::from_utf8_lossy(&bytes));
        }
        Commands::Write { start, text } => {
            client.seek(start, SeekMode::Absolute)?;
            let written = client.write(text.as_bytes())?;
            println!("Write succeed! ({} bytes)", written);
        }
        Commands::Ioctl { action } => match action {
            IoctlAction::Show => {
                client.control(ControlCommand::Dump.code(), 0)?;
                println!("Check the server log for the memory dump.");
            }
            IoctlAction::Clear => {
                client.control(ControlCommand::Clear.code(), 0)?;
                println!("Clear successfully.");
            }
        },
        Commands::Demo => {
            client.control(ControlCommand::Clear.code(), 0)?;
            client.control(ControlCommand::Dump.code(), 0)?;
            client.write(b"abc")?;
            client.write(b"abc")?;
            client.seek(0, SeekMode::Absolute)?;
            let bytes = client.read(6)?;
            println!("{}", String::from_utf8_lossy(&bytes));
            client.control(ControlCommand::Dump.code(), 0)?;
        }
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}
