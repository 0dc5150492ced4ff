//! Shared application state handed to every actix-web handler as
//! `web::Data<AppState>`. Built once in `main`, never rebuilt per-request.

use std::sync::Arc;

use dbcalm_cmdbus::ClientConfig;
use dbcalm_storage::{
    AuthCodeRepository, BackupRepository, ClientRepository, DatabasePool, ProcessRepository,
    RestoreRepository, ScheduleRepository, UserRepository,
};

use crate::config::DbcalmConfig;
use crate::services::EngineProbe;

pub struct AppState {
    pub config: Arc<DbcalmConfig>,
    pub pool: DatabasePool,
    pub clients: ClientRepository,
    pub users: UserRepository,
    pub auth_codes: AuthCodeRepository,
    pub backups: BackupRepository,
    pub restores: RestoreRepository,
    pub schedules: ScheduleRepository,
    pub processes: ProcessRepository,
    pub engine_probe: EngineProbe,
    pub db_cmd_client: ClientConfig,
    pub system_cmd_client: ClientConfig,
}

impl AppState {
    #[must_use]
    pub fn new(config: Arc<DbcalmConfig>, pool: DatabasePool) -> Self {
        let engine_probe =
            EngineProbe::new(config.engine, config.credentials_file.clone(), config.project.clone());
        let db_cmd_client = ClientConfig::new(config.db_cmd_socket.clone().into());
        let system_cmd_client = ClientConfig::new(config.system_cmd_socket.clone().into());

        Self {
            clients: ClientRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            auth_codes: AuthCodeRepository::new(pool.clone()),
            backups: BackupRepository::new(pool.clone()),
            restores: RestoreRepository::new(pool.clone()),
            schedules: ScheduleRepository::new(pool.clone()),
            processes: ProcessRepository::new(pool.clone()),
            engine_probe,
            db_cmd_client,
            system_cmd_client,
            pool,
            config,
        }
    }
}
