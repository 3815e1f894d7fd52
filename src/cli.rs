//! Command-line interface definition using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Configuration upload tool for HinksPix and EasyLights pixel controllers
#[derive(Parser, Debug)]
#[command(name = "hinks-upload")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output (port, remote and unpack dumps)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: hinks-upload.toml next to the executable)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Controller address (overrides config)
    #[arg(long, value_name = "HOST", global = true)]
    pub host: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a layout to the controller and reboot it
    Upload {
        /// Layout description (JSON)
        #[arg(long, value_name = "FILE")]
        layout: PathBuf,
    },

    /// Print the controller model, firmware versions and board types
    Info,

    /// Copy a local file to the controller's SD card
    SendFile {
        /// File to send
        local: PathBuf,

        /// Name on the controller (default: the local file name)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// Set the controller clock to the local time
    SetTime,

    /// Send a one-byte mode command
    SetMode {
        /// Mode byte, as a number or a single character
        #[arg(value_parser = parse_byte)]
        mode: u8,
    },

    /// List the files on the controller's SD card
    ListFiles {
        /// Listing command byte
        #[arg(long, value_name = "BYTE", default_value = "L", value_parser = parse_byte)]
        cmd: u8,
    },
}

/// Accept `77`, `0x4d` or `M`
fn parse_byte(value: &str) -> Result<u8, String> {
    if let Some(hex) = value.strip_prefix("0x") {
        return u8::from_str_radix(hex, 16).map_err(|e| e.to_string());
    }
    if let Ok(number) = value.parse::<u8>() {
        return Ok(number);
    }
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(format!("'{}' is not a byte or a single character", value)),
    }
}

// =============================================================================
// Tests
// =============================================================================
