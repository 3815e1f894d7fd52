//! hinks-upload - configuration upload for HinksPix / EasyLights controllers
//!
//! Usage:
//!   hinks-upload upload --layout show.json   Upload a layout and reboot
//!   hinks-upload info                        Probe the controller
//!   hinks-upload send-file SHOW.HSEQ         Copy a file to the SD card
//!   hinks-upload set-time                    Set the controller clock
//!   hinks-upload list-files                  List the SD card

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use hinks_upload::cli::{Cli, Command};
use hinks_upload::codec::packet::fat_timestamp_of;
use hinks_upload::config::{self, Config};
use hinks_upload::logging::init_tracing;
use hinks_upload::transport::http::HttpControlClient;
use hinks_upload::transport::socket::BinarySession;
use hinks_upload::{upload, HinksPix, Layout};
use std::io::Write;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.controller.host = host;
    }
    config::validate(&config)?;

    match cli.command {
        Command::Upload { layout } => run_upload(&config, &layout),
        Command::Info => run_info(&config),
        Command::SendFile { local, name } => run_send_file(&config, &local, name),
        Command::SetTime => {
            let now = Local::now().naive_local();
            BinarySession::from_config(&config).set_time(&now)?;
            println!("Controller time set to {}", now.format("%Y-%m-%d %H:%M:%S"));
            Ok(())
        }
        Command::SetMode { mode } => {
            BinarySession::from_config(&config).set_mode(mode)?;
            println!("Mode {} acknowledged", mode);
            Ok(())
        }
        Command::ListFiles { cmd } => {
            for file in BinarySession::from_config(&config).list_files(cmd)? {
                println!("{:<32} {:>6} {:>6}", file.name, file.date, file.time);
            }
            Ok(())
        }
    }
}

fn open_controller(config: &Config) -> Result<HinksPix<HttpControlClient>> {
    let client = HttpControlClient::from_config(config);
    HinksPix::connect(client, config.upload.info_attempts)
        .with_context(|| format!("Unable to reach controller at {}", config.controller.host))
}

fn run_upload(config: &Config, layout_path: &Path) -> Result<()> {
    let layout = Layout::load(layout_path)?;
    let mut controller = open_controller(config)?;
    let mut console = |percent: u32, message: &str| println!("[{:>3}%] {}", percent, message);
    let outcome = upload(
        &mut controller,
        &layout,
        config.timeouts.reboot_gap(),
        &mut console,
    )?;
    if let Some(diagnostic) = outcome.diagnostic() {
        bail!(diagnostic);
    }
    Ok(())
}

fn run_info(config: &Config) -> Result<()> {
    let controller = open_controller(config)?;
    let info = controller.info();
    println!("Model:      {}", info.model_name());
    println!("Firmware:   {}", info.version_string());
    println!("Universes:  {}", info.max_universes);
    for (slot, board) in info.expansions.iter().enumerate() {
        println!("Expansion {}: {:?}", slot + 1, board);
    }
    println!(
        "File upload: {}",
        if controller.firmware_supports_upload() { "supported" } else { "not supported" }
    );
    Ok(())
}

fn run_send_file(config: &Config, local: &Path, name: Option<String>) -> Result<()> {
    let controller = open_controller(config)?;
    if !controller.firmware_supports_upload() {
        bail!(
            "{} firmware {} does not support file upload",
            controller.info().model_name(),
            controller.info().main_version
        );
    }

    let remote_name = match name {
        Some(name) => name,
        None => local
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("No file name in {}", local.display()))?,
    };
    let modified = std::fs::metadata(local)
        .and_then(|m| m.modified())
        .with_context(|| format!("Unable to read {}", local.display()))?;
    let timestamp = fat_timestamp_of(&DateTime::<Local>::from(modified).naive_local());

    BinarySession::from_config(config).upload_file(local, &remote_name, timestamp, |_, _, message| {
        print!("\r{:<72}", message);
        let _ = std::io::stdout().flush();
        true
    })?;
    println!();
    println!("Uploaded {} as {}", local.display(), remote_name);
    Ok(())
}
