//! One-off dialog turn, read from a file and answered on stdout.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flightbook_core::config::{AppConfig, LoadOptions};
use flightbook_core::domain::intent::IntentRequest;
use flightbook_core::errors::ApplicationError;
use flightbook_core::gateway::{InMemoryGateway, InMemoryNotificationChannel};
use flightbook_core::intents::{IntentDispatcher, TurnContext};
use flightbook_db::{
    connect_with_settings, migrations, FsBlobStore, SqlBookingRepository, StoreBackedGateway,
};

use crate::commands::CommandResult;

const COMMAND: &str = "invoke";

pub fn run(path: &Path, dry_run: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let request = match read_request(path) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(COMMAND, "invalid_input", format!("{error:#}"), 6);
        }
    };

    config.runtime.apply_process_timezone();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let ctx = TurnContext::new(format!("cli-{}", std::process::id()));
    let outcome = runtime.block_on(async {
        let dispatcher = if dry_run {
            IntentDispatcher::book_flight(
                InMemoryGateway::default(),
                InMemoryNotificationChannel::default(),
            )
        } else {
            store_backed_dispatcher(&config).await?
        };

        dispatcher.dispatch(&request, &ctx).await.map_err(dispatch_failure)
    });

    match outcome {
        Ok(response) => match serde_json::to_value(&response) {
            Ok(data) => {
                let kind = response.dialog_action.kind();
                let message = format!("{} answered with {kind}", request.intent_name());
                CommandResult::success_with_data(COMMAND, message, data)
            }
            Err(error) => CommandResult::failure(COMMAND, "serialization", error.to_string(), 9),
        },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}

type Failure = (&'static str, String, u8);

async fn store_backed_dispatcher(config: &AppConfig) -> Result<IntentDispatcher, Failure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    let blobs = FsBlobStore::new(&config.blob_store.root_dir)
        .await
        .map_err(|error| ("blob_store", error.to_string(), 4u8))?;

    let gateway = StoreBackedGateway::new(SqlBookingRepository::new(pool), blobs)
        .with_key_prefix(config.blob_store.key_prefix.clone());
    Ok(IntentDispatcher::book_flight(gateway, InMemoryNotificationChannel::default()))
}

fn dispatch_failure(error: ApplicationError) -> Failure {
    let error_class = match &error {
        ApplicationError::Domain(_) => "domain",
        ApplicationError::Persistence(_) => "persistence",
        ApplicationError::Integration(_) => "integration",
        ApplicationError::Configuration(_) => "configuration",
    };
    let exit_code = if error.is_infrastructure() { 8 } else { 7 };
    (error_class, error.to_string(), exit_code)
}

fn read_request(path: &Path) -> Result<IntentRequest> {
    let raw = if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).context("failed to read event from stdin")?;
        raw
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read event file `{}`", path.display()))?
    };

    serde_json::from_str(&raw).context("event is not a valid dialog turn")
}
