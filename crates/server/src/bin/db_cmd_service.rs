//! DB command service (socket A): owns `full_backup`, `incremental_backup`,
//! and `restore_backup`. Runs as the database OS user since its commands
//! invoke `mariabackup`/`xtrabackup` against the live data directory.

use std::sync::Arc;

use async_trait::async_trait;
use dbcalm_cmdbus::{bind, serve, CommandHandler, CommandRequest, CommandResponse};
use dbcalm_core::{build_full_backup_cmd, build_incremental_backup_cmd, build_restore_cmds, CommandSpec};
use dbcalm_models::{ProcessArgs, ProcessType, RestoreTarget};
use dbcalm_server::config::ConfigLoader;
use dbcalm_server::db::init_pool_with_config;
use dbcalm_server::services::error::ValidatorError;
use dbcalm_server::services::{EngineProbe, PreconditionValidator, ProcessRunner, QueueHandler};
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

struct DbCommandHandler {
    runner: ProcessRunner,
    validator: PreconditionValidator,
    queue: Arc<QueueHandler>,
    engine_probe: EngineProbe,
    settings: dbcalm_core::BackupSettings,
    credentials_file: String,
    project: String,
}

#[async_trait]
impl CommandHandler for DbCommandHandler {
    async fn handle(&self, request: CommandRequest) -> CommandResponse {
        match request.cmd.as_str() {
            "full_backup" => self.handle_full_backup(request).await,
            "incremental_backup" => self.handle_incremental_backup(request).await,
            "restore_backup" => self.handle_restore(request).await,
            other => CommandResponse::rejected(400, format!("unknown command: {other}")),
        }
    }
}

impl DbCommandHandler {
    async fn handle_full_backup(&self, request: CommandRequest) -> CommandResponse {
        let Some(id) = request.args.get("id").and_then(|v| v.as_str()).map(str::to_string) else {
            return CommandResponse::rejected(400, "missing id");
        };

        if let Err(err) = self.validator.require_valid_credentials_file(&self.project) {
            return CommandResponse::rejected(err.status_code(), err.to_string());
        }
        if !self.engine_probe.server_is_alive().await {
            let err = ValidatorError::ServerNotAlive;
            return CommandResponse::rejected(err.status_code(), err.to_string());
        }

        let spec = build_full_backup_cmd(&self.settings, &id);
        self.dispatch(spec, id, request.args).await
    }

    async fn handle_incremental_backup(&self, request: CommandRequest) -> CommandResponse {
        let Some(id) = request.args.get("id").and_then(|v| v.as_str()).map(str::to_string) else {
            return CommandResponse::rejected(400, "missing id");
        };
        let Some(from_backup_id) = request.args.get("from_backup_id").and_then(|v| v.as_str()) else {
            return CommandResponse::rejected(400, "missing from_backup_id");
        };

        if !self.engine_probe.server_is_alive().await {
            let err = ValidatorError::ServerNotAlive;
            return CommandResponse::rejected(err.status_code(), err.to_string());
        }

        let spec = build_incremental_backup_cmd(&self.settings, &id, from_backup_id);
        self.dispatch(spec, id, request.args).await
    }

    async fn handle_restore(&self, request: CommandRequest) -> CommandResponse {
        let Some(id_list) = request.args.get("id_list").and_then(|v| v.as_array()) else {
            return CommandResponse::rejected(400, "missing id_list");
        };
        let id_list: Vec<String> = id_list.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
        let Some(target) = request.args.get("target").and_then(|v| v.as_str()).and_then(RestoreTarget::from_str)
        else {
            return CommandResponse::rejected(400, "missing or invalid target");
        };

        if target == RestoreTarget::Database {
            if let Err(err) = self.validator.require_data_dir_empty() {
                return CommandResponse::rejected(err.status_code(), err.to_string());
            }
            if let Err(err) = self.validator.require_server_dead(self.engine_probe.server_is_alive().await) {
                return CommandResponse::rejected(err.status_code(), err.to_string());
            }
        }

        let version = match self.engine_probe.version().await {
            Ok(v) => v,
            Err(err) => return CommandResponse::rejected(503, err.to_string()),
        };

        let scratch_dir = format!("{}/tmp/{}", self.settings.backup_dir, Uuid::new_v4());
        if tokio::fs::create_dir_all(&scratch_dir).await.is_err() {
            return CommandResponse::rejected(503, "could not create restore scratch directory");
        }

        let specs = match build_restore_cmds(&self.settings, &scratch_dir, &id_list, target, version) {
            Ok(specs) => specs,
            Err(err) => return CommandResponse::rejected(400, err.to_string()),
        };

        let mut args: ProcessArgs = request.args.as_object().cloned().unwrap_or_default().into_iter().collect();
        args.insert("backup_id".to_string(), serde_json::json!(id_list.last().cloned().unwrap_or_default()));
        args.insert("target".to_string(), serde_json::json!(target.as_str()));
        args.insert("target_path".to_string(), serde_json::json!(scratch_dir.clone()));
        args.insert("scratch_dir".to_string(), serde_json::json!(scratch_dir));

        match self.runner.execute_consecutive(specs, ProcessType::Restore, args).await {
            Ok((process, rx)) => {
                self.queue.clone().spawn_watcher(rx);
                CommandResponse::accepted(process.command_id)
            }
            Err(err) => CommandResponse::rejected(503, err.to_string()),
        }
    }

    async fn dispatch(&self, spec: CommandSpec, id: String, raw_args: serde_json::Value) -> CommandResponse {
        let mut args: ProcessArgs = raw_args.as_object().cloned().unwrap_or_default().into_iter().collect();
        args.insert("id".to_string(), serde_json::json!(id));

        match self.runner.execute(spec, ProcessType::Backup, Some(id), args).await {
            Ok((process, rx)) => {
                self.queue.clone().spawn_watcher(rx);
                CommandResponse::accepted(process.command_id)
            }
            Err(err) => CommandResponse::rejected(503, err.to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConfigLoader::load().unwrap_or_default();
    let pool = init_pool_with_config(
        &format!("sqlite://{}/db.sqlite3", config.state_dir),
        5,
        std::time::Duration::from_secs(5),
    )
    .await
    .map_err(std::io::Error::other)?;

    let processes = dbcalm_storage::ProcessRepository::new(pool.clone());
    let backups = dbcalm_storage::BackupRepository::new(pool.clone());
    let restores = dbcalm_storage::RestoreRepository::new(pool);

    let handler = DbCommandHandler {
        runner: ProcessRunner::new(processes.clone()),
        validator: PreconditionValidator::new(
            backups.clone(),
            processes,
            config.credentials_file.clone(),
            config.data_dir.clone(),
        ),
        queue: Arc::new(QueueHandler::new(backups, restores, config.backup_dir.clone())),
        engine_probe: EngineProbe::new(config.engine, config.credentials_file.clone(), config.project.clone()),
        settings: config.backup_settings(),
        credentials_file: config.credentials_file.clone(),
        project: config.project.clone(),
    };

    tracing::info!(socket = %config.db_cmd_socket, "starting dbcalm DB command service");
    let listener = bind(std::path::Path::new(&config.db_cmd_socket)).await.map_err(std::io::Error::other)?;
    serve(listener, Arc::new(handler)).await
}
