//! Soong CLI entrypoint.
//!
//! This is the main entrypoint for the soong command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use soong::cli::{Cli, Commands, LaunchArgs, MessageLevel, OutputFormat, OutputFormatter, TargetArgs};
use soong::config::{API_KEY_VAR, Settings, load_dotenv};
use soong::error::{Result, SoongError};
use soong::lambda::{LambdaApi, LambdaClient, LaunchRequest};
use soong::lifecycle::InstancePoller;
use soong::models::BuiltinModelRegistry;
use soong::validation::{LaunchValidator, ValidationResult, ValidationWarning, check_vram_fit};

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    // Loaded before parsing so clap sees variables from `.env`.
    if let Err(e) = load_dotenv(Path::new(".")) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.output);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool, output: OutputFormat) {
    let default_filter = if verbose { "soong=debug" } else { "soong=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match output {
        OutputFormat::Json => builder.json().init(),
        OutputFormat::Text => builder.init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    // The model table is local; no API key needed.
    if matches!(cli.command, Commands::Models) {
        return emit(&formatter.format_models(&BuiltinModelRegistry::new()));
    }

    let settings = load_settings(cli.api_key.as_deref())?;
    debug!("Loaded settings: {settings:?}");

    let client = LambdaClient::new(settings.api_key())?;

    match cli.command {
        Commands::Types { available, region } => {
            cmd_types(&client, available, region.as_deref(), &formatter).await
        }
        // Handled before settings are loaded.
        Commands::Models => Ok(()),
        Commands::Validate(target) => cmd_validate(client, &target, &formatter).await,
        Commands::Launch(args) => cmd_launch(client, &args, &settings, &formatter).await,
        Commands::Wait {
            instance_id,
            timeout,
        } => {
            let timeout = timeout.map_or(settings.ready_timeout, Duration::from_secs);
            wait_until_ready(client, &instance_id, timeout, &settings, &formatter).await
        }
        Commands::Status { instance_id } => {
            cmd_status(client, instance_id.as_deref(), &formatter).await
        }
        Commands::Terminate {
            instance_id,
            wait,
            timeout,
            yes,
        } => cmd_terminate(client, &instance_id, wait, timeout, yes, &formatter).await,
    }
}

/// Resolves settings, preferring the `--api-key` flag over the environment.
fn load_settings(api_key: Option<&str>) -> Result<Settings> {
    Settings::from_lookup(|name| {
        if name == API_KEY_VAR {
            if let Some(key) = api_key {
                return Some(key.to_string());
            }
        }
        std::env::var(name).ok()
    })
}

/// List instance types.
async fn cmd_types(
    client: &LambdaClient,
    available: bool,
    region: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut types = client.list_instance_types().await?;

    types.retain(|t| !available || t.has_capacity());
    if let Some(region) = region {
        types.retain(|t| t.is_available_in(region));
    }
    types.sort_by_key(|t| t.price_cents_per_hour);

    emit(&formatter.format_instance_types(&types))
}

/// Validate launch parameters.
async fn cmd_validate(
    client: LambdaClient,
    target: &TargetArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let result = validate_target(client, target).await;
    emit(&formatter.format_validation(&result))?;

    if result.can_launch() {
        Ok(())
    } else {
        Err(SoongError::internal(format!(
            "validation found {} error(s)",
            result.error_count()
        )))
    }
}

/// Validate, launch and wait.
async fn cmd_launch(
    client: LambdaClient,
    args: &LaunchArgs,
    settings: &Settings,
    formatter: &OutputFormatter,
) -> Result<()> {
    let result = validate_target(client.clone(), &args.target).await;
    eprintln!("{}", formatter.format_validation(&result));

    if !result.can_launch() {
        return Err(SoongError::internal(format!(
            "launch blocked by {} validation error(s)",
            result.error_count()
        )));
    }

    let mut request = LaunchRequest::new(
        &args.target.region,
        &args.target.gpu,
        args.target.to_request().unique_ssh_keys(),
    );
    if let Some(filesystem) = &args.target.filesystem {
        request = request.with_file_system(filesystem.trim());
    }
    if let Some(name) = &args.name {
        request = request.with_name(name);
    }

    let instance_id = client.launch_instance(&request).await?;
    info!("Launched instance {instance_id}");
    eprintln!(
        "{}",
        formatter.format_message(MessageLevel::Success, &format!("Launched instance {instance_id}"))
    );

    if args.no_wait {
        return emit(&instance_id);
    }

    let timeout = args.timeout.map_or(settings.ready_timeout, Duration::from_secs);
    wait_until_ready(client, &instance_id, timeout, settings, formatter).await
}

/// Runs the validator and layers the model-fit check on top.
async fn validate_target(client: LambdaClient, target: &TargetArgs) -> ValidationResult {
    let request = target.to_request();
    let mut validator = LaunchValidator::new(client);
    let mut result = validator.validate(&request).await;

    if let Some(model) = request.model_id.as_deref() {
        let min_vram_gb = validator.min_vram_gb(Some(model));
        if min_vram_gb <= 0.0 {
            result.warnings.push(ValidationWarning::new(
                format!("Unknown model '{model}'"),
                "VRAM requirements were not checked",
            ));
        } else if let Some(warning) = check_vram_fit(&request.gpu_type, min_vram_gb) {
            result.warnings.push(warning);
        }
    }

    result
}

/// Wait for an instance to become ready.
async fn wait_until_ready(
    client: LambdaClient,
    instance_id: &str,
    timeout: Duration,
    settings: &Settings,
    formatter: &OutputFormatter,
) -> Result<()> {
    eprintln!("Waiting up to {}s for {instance_id}...", timeout.as_secs());

    let poller = InstancePoller::new(client).with_poll_interval(settings.poll_interval);
    match poller.wait_for_ready(instance_id, timeout).await {
        Some(instance) => emit(&formatter.format_instance(&instance, Utc::now())),
        None => Err(SoongError::internal(format!(
            "instance {instance_id} did not become ready"
        ))),
    }
}

/// Show instance status.
async fn cmd_status(
    client: LambdaClient,
    instance_id: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let poller = InstancePoller::new(client);
    let instance = match instance_id {
        Some(id) => poller.poll_status(id).await,
        None => poller.get_active_instance().await,
    };

    match instance {
        Some(instance) => emit(&formatter.format_instance(&instance, Utc::now())),
        None => {
            eprintln!(
                "{}",
                formatter.format_message(MessageLevel::Warning, "No matching instance found")
            );
            Ok(())
        }
    }
}

/// Terminate an instance.
async fn cmd_terminate(
    client: LambdaClient,
    instance_id: &str,
    wait: bool,
    timeout_secs: u64,
    auto_approve: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !auto_approve {
        eprint!("Terminate instance {instance_id}? [y/N]: ");
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Terminate cancelled.");
            return Ok(());
        }
    }

    client.terminate_instance(instance_id).await?;
    info!("Termination requested for {instance_id}");

    if wait {
        let poller = InstancePoller::new(client);
        if !poller
            .wait_for_terminated(instance_id, Duration::from_secs(timeout_secs))
            .await
        {
            return Err(SoongError::internal(format!(
                "instance {instance_id} still running after {timeout_secs}s"
            )));
        }
    }

    emit(&formatter.format_message(
        MessageLevel::Success,
        &format!("Instance {instance_id} terminated"),
    ))
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}
