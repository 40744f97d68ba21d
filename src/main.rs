#![cfg(feature = "cli")]
use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine;
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info, warn, Level};

use rslatens::codec;
use rslatens::{
    AcquisitionOutcome, AdapterConfig, DrmConfig, LicensePipeline, LicenseRequest,
    LicenseResponse, PlayerConfiguration, RequestFilter, RequestType, Vendor,
};

#[derive(Parser)]
#[command(name = "rslatens", version, disable_version_flag = true, about = "rslatens CLI")]
struct Cli {
    #[arg(short = 'v', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    #[arg(short = 'd', long = "debug", action = ArgAction::SetTrue)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Wrap a raw CDM challenge in the vendor envelope and print it.
    Wrap {
        vendor: String,
        challenge: PathBuf,
        #[arg(short = 'c', long = "customer_id", default_value = "")]
        customer_id: String,
        #[arg(short = 'i', long = "device_id", default_value = "")]
        device_id: String,
    },
    /// Unwrap a license server response and print the outcome.
    Unwrap {
        vendor: String,
        response: PathBuf,
    },
    /// Print the host player configuration for a config file.
    PlayerConfig {
        config_path: PathBuf,
    },
    /// Acquire a license for a challenge from the configured license server.
    ///
    /// The challenge is wrapped, POSTed to `license_server_url`, and the
    /// response is unwrapped exactly as the player pipeline would.
    License {
        config_path: PathBuf,
        challenge: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .init();

    info!("rslatens version {}", env!("CARGO_PKG_VERSION"));

    if cli.version {
        return Ok(());
    }

    match cli.command {
        Some(Commands::Wrap {
            vendor,
            challenge,
            customer_id,
            device_id,
        }) => run_wrap(&vendor, &challenge, customer_id, device_id),
        Some(Commands::Unwrap { vendor, response }) => run_unwrap(&vendor, &response),
        Some(Commands::PlayerConfig { config_path }) => run_player_config(&config_path),
        Some(Commands::License {
            config_path,
            challenge,
            output,
        }) => run_license(&config_path, &challenge, output.as_deref()),
        None => Ok(()),
    }
}

fn run_wrap(
    vendor: &str,
    challenge_path: &Path,
    customer_id: String,
    device_id: String,
) -> anyhow::Result<()> {
    let vendor: Vendor = vendor.parse()?;
    let challenge = std::fs::read(challenge_path).context("Failed to read challenge")?;
    let config = DrmConfig::new(vendor, customer_id, device_id, "");

    let request = codec::for_vendor(vendor).build_request(&config, LicenseRequest::new(challenge));
    if request.body.is_empty() {
        anyhow::bail!("Failed to wrap challenge");
    }

    for (name, value) in &request.headers {
        info!("{}: {}", name, value);
    }
    println!("{}", String::from_utf8_lossy(&request.body));
    Ok(())
}

fn run_unwrap(vendor: &str, response_path: &Path) -> anyhow::Result<()> {
    let vendor: Vendor = vendor.parse()?;
    let body = std::fs::read(response_path).context("Failed to read response")?;
    let config = DrmConfig::new(vendor, "", "", "");

    match codec::for_vendor(vendor).parse_response(&config, LicenseResponse::new(body)) {
        AcquisitionOutcome::Success(license) => {
            info!("[+] License unwrapped ({} bytes)", license.len());
            println!("{}", base64::engine::general_purpose::STANDARD.encode(license));
        }
        AcquisitionOutcome::PassThrough(response) => {
            warn!("[-] Not a license payload ({} bytes), left as-is", response.body.len());
        }
        AcquisitionOutcome::Failure(e) => anyhow::bail!("{}", e),
    }
    Ok(())
}

fn run_player_config(config_path: &Path) -> anyhow::Result<()> {
    let config = AdapterConfig::from_path(config_path).context("Failed to load config")?;
    let document = PlayerConfiguration::for_drm(&config.drm);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn run_license(config_path: &Path, challenge_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let config = AdapterConfig::from_path(config_path).context("Failed to load config")?;
    let challenge = std::fs::read(challenge_path).context("Failed to read challenge")?;
    info!(
        "[+] Loaded {} config for {}",
        config.drm.vendor, config.drm.license_server_url
    );

    let pipeline = LicensePipeline::with_config(config.drm.clone());
    let request = pipeline.filter_request(RequestType::License, LicenseRequest::new(challenge));
    info!("[+] Created License Request Message ({} bytes)", request.body.len());

    let client = reqwest::blocking::Client::new();
    let mut builder = client.post(&config.drm.license_server_url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let response = builder
        .body(request.body)
        .send()
        .context("Failed to send challenge")?;
    let status = response.status();
    if !status.is_success() {
        error!(
            "[-] Failed to send challenge: [{}] {}",
            status,
            response.text().unwrap_or_default()
        );
        return Ok(());
    }
    let body = response.bytes().context("Failed to read license")?;
    info!("[+] Got License Message");

    let license = match pipeline.parse_response(LicenseResponse::new(body.to_vec())) {
        AcquisitionOutcome::Success(license) => license,
        AcquisitionOutcome::PassThrough(response) => {
            warn!("[-] Response is not a license payload, writing it unchanged");
            response.body
        }
        AcquisitionOutcome::Failure(e) => anyhow::bail!("{}", e),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &license)?;
            info!("[+] Saved license to {}", path.display());
        }
        None => println!("{}", base64::engine::general_purpose::STANDARD.encode(&license)),
    }
    Ok(())
}
