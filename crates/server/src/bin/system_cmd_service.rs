//! System command service (socket B): owns `cleanup_backups` and
//! `update_cron_schedules`. Runs as root since `rm -rf` on backup folders
//! and the `/etc/cron.d` rewrite both need privileges the DB service user
//! doesn't have.

use std::sync::Arc;

use async_trait::async_trait;
use dbcalm_cmdbus::{bind, serve, CommandHandler, CommandRequest, CommandResponse};
use dbcalm_core::CommandSpec;
use dbcalm_models::{ProcessArgs, ProcessType, Schedule};
use dbcalm_server::config::ConfigLoader;
use dbcalm_server::db::init_pool_with_config;
use dbcalm_server::services::{CronWriter, ProcessRunner, QueueHandler};
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct SystemCommandHandler {
    runner: ProcessRunner,
    queue: Arc<QueueHandler>,
    cron_writer: CronWriter,
}

#[async_trait]
impl CommandHandler for SystemCommandHandler {
    async fn handle(&self, request: CommandRequest) -> CommandResponse {
        match request.cmd.as_str() {
            "cleanup_backups" => self.handle_cleanup(request).await,
            "update_cron_schedules" => self.handle_update_cron(request).await,
            other => CommandResponse::rejected(400, format!("unknown command: {other}")),
        }
    }
}

impl SystemCommandHandler {
    async fn handle_cleanup(&self, request: CommandRequest) -> CommandResponse {
        let Some(folders) = request.args.get("folders").and_then(|v| v.as_array()) else {
            return CommandResponse::rejected(400, "missing folders");
        };
        let folders: Vec<String> = folders.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
        if folders.is_empty() {
            return CommandResponse::rejected(400, "folders must not be empty");
        }

        let mut argv = vec!["rm".to_string(), "-rf".to_string()];
        argv.extend(folders);
        let spec = CommandSpec::Direct(argv);

        let mut args: ProcessArgs = request.args.as_object().cloned().unwrap_or_default().into_iter().collect();
        args.remove("folders");

        match self.runner.execute(spec, ProcessType::CleanupBackups, None, args).await {
            Ok((process, rx)) => {
                self.queue.clone().spawn_watcher(rx);
                CommandResponse::accepted(process.command_id)
            }
            Err(err) => CommandResponse::rejected(503, err.to_string()),
        }
    }

    /// Writes the cron fragment directly — rendering and the atomic rename
    /// are plain file I/O, not an external binary, so no `Process` row is
    /// recorded for this one.
    async fn handle_update_cron(&self, request: CommandRequest) -> CommandResponse {
        let Some(raw_schedules) = request.args.get("schedules") else {
            return CommandResponse::rejected(400, "missing schedules");
        };
        let schedules: Vec<Schedule> = match serde_json::from_value(raw_schedules.clone()) {
            Ok(s) => s,
            Err(err) => return CommandResponse::rejected(400, format!("invalid schedules: {err}")),
        };

        match self.cron_writer.write(&schedules).await {
            Ok(()) => CommandResponse::accepted(uuid::Uuid::new_v4().to_string()),
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

    let handler = SystemCommandHandler {
        runner: ProcessRunner::new(processes),
        queue: Arc::new(QueueHandler::new(backups, restores, config.backup_dir.clone())),
        cron_writer: CronWriter::new("/etc/cron.d", config.project.clone(), config.cli_binary_path.clone()),
    };

    tracing::info!(socket = %config.system_cmd_socket, "starting dbcalm system command service");
    let listener = bind(std::path::Path::new(&config.system_cmd_socket)).await.map_err(std::io::Error::other)?;
    serve(listener, Arc::new(handler)).await
}
