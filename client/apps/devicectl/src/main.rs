//! Device Trust CLI Entry Point
//!
//! Fingerprints a recorded browser environment and runs the gating
//! operations against the lockout backend (or an in-process one).
//! Uses `anyhow` for startup errors; gating results are printed as JSON.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use device_trust::infra::snapshot::HostSnapshot;
use device_trust::{
    DeviceTrust, FailurePolicy, InMemoryLockoutPolicy, LockoutPolicy, LoginAttemptInput,
    SecurityCheck, SnapshotHost, SupabaseLockoutPolicy, TrustConfig,
};
use kernel::error::app_error::{AppError, AppResult};
use kernel::id::UserId;
use platform::config::BackendConfig;
use platform::rpc::RpcClient;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Device trust and lockout CLI", long_about = None)]
struct Cli {
    /// Recorded browser environment (JSON); an empty host when omitted
    #[arg(short, long, global = true)]
    snapshot: Option<PathBuf>,

    /// Use an in-process lockout backend instead of the RPC backend
    #[arg(long, global = true)]
    offline: bool,

    /// Refuse instead of allowing when the backend cannot be reached
    #[arg(long, global = true)]
    fail_closed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the device fingerprint
    Fingerprint,
    /// Print the security state after initialization
    Status,
    /// Check whether a new account may be registered
    CheckRegistration,
    /// Record a login attempt
    LoginAttempt {
        #[arg(short, long)]
        email: String,
        /// Record a successful login
        #[arg(long, conflicts_with = "failure_reason")]
        success: bool,
        #[arg(long, default_value = "invalid_credentials")]
        failure_reason: String,
        /// Record the same attempt several times
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Register the device after a successful sign-up
    RegisterDevice,
    /// Link an authenticated user to the device
    LinkUser {
        #[arg(long)]
        user_id: UserId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devicectl=info,device_trust=info,platform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let host = match &cli.snapshot {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            SnapshotHost::from_json(&json).context("Invalid host snapshot")?
        }
        None => SnapshotHost::new(HostSnapshot::default()),
    };

    let failure_policy = if cli.fail_closed {
        FailurePolicy::FailClosed
    } else {
        FailurePolicy::FailOpen
    };
    let config = TrustConfig::default().with_failure_policy(failure_policy);

    if cli.offline {
        tracing::info!("Using in-process lockout backend");
        run(InMemoryLockoutPolicy::default(), host, config, cli.command).await
    } else {
        let backend = backend_config()?;
        tracing::info!(base_url = %backend.base_url, "Using RPC lockout backend");
        let rpc = RpcClient::new(backend).map_err(|e| {
            AppError::internal("Failed to build RPC client")
                .in_operation("connect_backend")
                .with_source(e)
        })?;
        run(SupabaseLockoutPolicy::new(rpc), host, config, cli.command).await
    }
}

fn backend_config() -> AppResult<BackendConfig> {
    let base_url = require_env("SUPABASE_URL")?;
    let api_key = require_env("SUPABASE_ANON_KEY")?;

    let mut config = BackendConfig::new(base_url, api_key);
    if let Ok(timeout) = env::var("TRUST_BACKEND_TIMEOUT_MS") {
        let millis: u64 = timeout.parse().map_err(|e| {
            AppError::invalid_input("TRUST_BACKEND_TIMEOUT_MS must be an integer")
                .in_operation("load_backend_config")
                .with_source(e)
        })?;
        config = config.with_timeout(Duration::from_millis(millis));
    }
    Ok(config)
}

fn require_env(name: &'static str) -> AppResult<String> {
    env::var(name).map_err(|e| {
        AppError::invalid_input(format!("{name} must be set in environment"))
            .in_operation("load_backend_config")
            .with_source(e)
    })
}

async fn run<P>(
    policy: P,
    host: SnapshotHost,
    config: TrustConfig,
    command: Commands,
) -> anyhow::Result<()>
where
    P: LockoutPolicy + Sync,
{
    let trust = DeviceTrust::new(Arc::new(policy), Arc::new(host), Arc::new(config));
    trust.initialize().await;

    let output = match command {
        Commands::Fingerprint => {
            let fingerprint = trust
                .fingerprint()
                .context("Fingerprint could not be computed")?;
            serde_json::to_value(fingerprint)?
        }
        Commands::Status => {
            let state = trust.state();
            json!({
                "fingerprintHash": state.fingerprint_hash.as_ref().map(|h| h.as_str()),
                "phase": format!("{:?}", state.phase()),
                "blockReason": state.block_reason(),
                "blockExpiresAt": state.block_expires_at(),
                "attemptsRemaining": state.attempts_remaining,
                "automationDetected": state.is_automation_detected,
            })
        }
        Commands::CheckRegistration => check_json(&trust.check_registration_allowed().await),
        Commands::LoginAttempt {
            email,
            success,
            failure_reason,
            repeat,
        } => {
            let input = if success {
                LoginAttemptInput::succeeded(email)
            } else {
                LoginAttemptInput::failed(email, failure_reason)
            };
            let mut check = SecurityCheck::allow();
            for attempt in 1..=repeat.max(1) {
                check = trust.record_login_attempt(input.clone()).await;
                tracing::debug!(attempt, can_proceed = check.can_proceed, "Attempt recorded");
            }
            check_json(&check)
        }
        Commands::RegisterDevice => json!({ "registered": trust.register_device_account().await }),
        Commands::LinkUser { user_id } => {
            trust.link_user_to_device(user_id).await;
            json!({ "userId": user_id })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn check_json(check: &SecurityCheck) -> serde_json::Value {
    json!({
        "canProceed": check.can_proceed,
        "error": check.error,
        "attemptsRemaining": check.attempts_remaining,
    })
}
