//! Re-exports the storage crate's pool/migration entry points so handlers
//! only need to depend on `crate::db`, not `dbcalm_storage` directly.

pub use dbcalm_storage::{
    init_pool, init_pool_with_config, AuthCodeRepository, BackupRepository, ClientRepository,
    DatabasePool, ProcessRepository, RestoreRepository, ScheduleRepository, StorageError,
    StorageResult, UserRepository,
};
