// Copyright 2026 Prospect Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};
use prospect::auth::ChallengeGate;
use prospect::config::{AccountCredentials, RuntimeConfig};
use prospect::pipeline::ProfilePipeline;
use prospect::renderer::chromium::{find_chromium, ChromiumRenderer};
use prospect::session::SessionStore;
use prospect::site::SiteProfile;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "prospect",
    about = "Prospect — authenticated profile extraction over a real browser",
    version
)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a profile record from a URL and print it as JSON
    Extract {
        /// Profile URL to extract
        url: String,
        /// Launch the browser with a visible window (lets you solve
        /// verification challenges by hand)
        #[arg(long)]
        visible: bool,
        /// Seconds to wait for a manual challenge solve before giving up
        #[arg(long, default_value = "120")]
        challenge_grace: u64,
    },
    /// Check environment readiness
    Doctor,
    /// Manage stored session credentials
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Remove the stored session so the next run performs a fresh login
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Extract {
            url,
            visible,
            challenge_grace,
        } => extract(&url, visible, challenge_grace).await,
        Commands::Doctor => doctor(),
        Commands::Session {
            action: SessionAction::Clear,
        } => session_clear(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "prospect=debug" } else { "prospect=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default.parse().unwrap()),
        )
        .init();
}

async fn extract(url: &str, visible: bool, challenge_grace: u64) -> Result<()> {
    let config = RuntimeConfig::default_layout().with_visible(visible);
    let site = SiteProfile::linkedin();
    let credentials = AccountCredentials::from_env(&site)?;

    // The CLI has no external resume channel, so challenges get a grace
    // window instead: with --visible an operator can solve one in the
    // browser window before the window closes.
    let gate = ChallengeGate::disabled(Duration::from_secs(challenge_grace));

    let renderer = ChromiumRenderer::launch(&config).await?;
    let pipeline = ProfilePipeline::new(Box::new(renderer), site, &config, credentials, gate);

    match pipeline.extract_profile(url).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            eprintln!("profile not found: {url}");
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

fn doctor() -> Result<()> {
    println!("Prospect Doctor");
    println!("===============");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    let chromium = find_chromium();
    match &chromium {
        Some(path) => println!("[OK] Chromium found: {}", path.display()),
        None => println!(
            "[!!] Chromium NOT found. Set PROSPECT_CHROMIUM_PATH or install Chrome."
        ),
    }

    let site = SiteProfile::linkedin();
    let creds_ok = AccountCredentials::from_env(&site).is_ok();
    if creds_ok {
        println!("[OK] Credentials present ({} / {})", site.identifier_env, site.secret_env);
    } else {
        println!(
            "[!!] Credentials missing: set {} and {}",
            site.identifier_env, site.secret_env
        );
    }

    let config = RuntimeConfig::default_layout();
    let store = SessionStore::new(&config.session_dir);
    if store.load(site.id, site.session_cookie).is_some() {
        println!("[OK] Stored session is usable: {}", store.path_for(site.id).display());
    } else {
        println!("[--] No usable stored session (a fresh login will run)");
    }

    println!();
    if chromium.is_some() && creds_ok {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
    }
    Ok(())
}

fn session_clear() -> Result<()> {
    let config = RuntimeConfig::default_layout();
    let site = SiteProfile::linkedin();
    let store = SessionStore::new(&config.session_dir);
    if store.clear(site.id) {
        println!("Stored session removed: {}", store.path_for(site.id).display());
    } else {
        println!("No stored session to remove.");
    }
    Ok(())
}
