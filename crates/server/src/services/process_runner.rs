//! Spawns external binaries (`mariabackup`/`xtrabackup`, `mysqladmin`, `cp`,
//! ...), recording one `Process` row per spawn and publishing exactly the
//! terminal process of a chain on a completion channel.
//!
//! Every child is spawned with a cleared environment plus a minimal
//! `PATH`/`HOME` so a bundled backup binary never inherits ambient
//! credentials or locale settings from the service process.

use std::process::Stdio;

use chrono::Utc;
use dbcalm_core::CommandSpec;
use dbcalm_models::{Process, ProcessArgs, ProcessType};
use dbcalm_storage::ProcessRepository;
use tokio::process::Command;
use tokio::sync::mpsc;

use super::error::{RunnerError, RunnerResult};

const COMMAND_ID_ALLOC_ATTEMPTS: u32 = 20;
const MASTER_CHANNEL_CAPACITY: usize = 1;

pub struct ProcessRunner {
    processes: ProcessRepository,
}

impl ProcessRunner {
    #[must_use]
    pub const fn new(processes: ProcessRepository) -> Self {
        Self { processes }
    }

    /// Spawns `spec`, persists a `running` row under `command_id` (generating
    /// one if not supplied), and returns that row plus a receiver that fires
    /// once, with the terminal state, when the child exits.
    pub async fn execute(
        &self,
        spec: CommandSpec,
        process_type: ProcessType,
        command_id: Option<String>,
        args: ProcessArgs,
    ) -> RunnerResult<(Process, mpsc::Receiver<Process>)> {
        let command_id = match command_id {
            Some(id) => id,
            None => self.allocate_command_id().await?,
        };

        let (tx, rx) = mpsc::channel(MASTER_CHANNEL_CAPACITY);
        let process = self.spawn_and_track(spec, process_type, command_id, args, Some(tx)).await?;
        Ok((process, rx))
    }

    /// Runs `specs` one after another under a single shared `command_id`.
    /// Stops at the first failure. Only the final process in the chain
    /// (success or the failing step) is sent on the returned channel — the
    /// earlier steps are still recorded as `Process` rows, just not
    /// re-published, so the queue handler never sees duplicate completions
    /// for one logical chain.
    pub async fn execute_consecutive(
        &self,
        specs: Vec<CommandSpec>,
        process_type: ProcessType,
        args: ProcessArgs,
    ) -> RunnerResult<(Process, mpsc::Receiver<Process>)> {
        let mut specs = specs.into_iter();
        let first_spec = specs.next().ok_or(RunnerError::EmptyChain)?;
        let command_id = self.allocate_command_id().await?;

        let (tx, rx) = mpsc::channel(MASTER_CHANNEL_CAPACITY);
        let remaining: Vec<CommandSpec> = specs.collect();
        let first_process =
            self.spawn_chain(first_spec, remaining, process_type, command_id, args, tx).await?;
        Ok((first_process, rx))
    }

    async fn spawn_chain(
        &self,
        spec: CommandSpec,
        remaining: Vec<CommandSpec>,
        process_type: ProcessType,
        command_id: String,
        args: ProcessArgs,
        tx: mpsc::Sender<Process>,
    ) -> RunnerResult<Process> {
        let (step_tx, step_rx) = mpsc::channel(MASTER_CHANNEL_CAPACITY);
        let first_process =
            self.spawn_and_track(spec, process_type, command_id.clone(), args.clone(), Some(step_tx)).await?;

        let processes = self.processes.clone();
        tokio::spawn(Self::run_chain_tail(processes, step_rx, remaining, process_type, command_id, args, tx));

        Ok(first_process)
    }

    /// Awaits each step's terminal process before starting the next — including
    /// the first — so a later step never runs against a directory a failed or
    /// still-running earlier step left half-written. Publishes only the
    /// chain's final terminal process (the first failure, or the last step's
    /// success) onto `tx`.
    async fn run_chain_tail(
        processes: ProcessRepository,
        mut pending: mpsc::Receiver<Process>,
        mut remaining: Vec<CommandSpec>,
        process_type: ProcessType,
        command_id: String,
        args: ProcessArgs,
        tx: mpsc::Sender<Process>,
    ) {
        loop {
            let Some(terminal) = pending.recv().await else {
                tracing::warn!(command_id = %command_id, "command chain aborted: a step produced no terminal process");
                return;
            };

            if terminal.status != dbcalm_models::ProcessStatus::Success {
                let _ = tx.send(terminal).await;
                tracing::warn!(command_id = %command_id, "command chain aborted after step failure");
                return;
            }

            if remaining.is_empty() {
                let _ = tx.send(terminal).await;
                return;
            }

            let next = remaining.remove(0);
            match spawn_detached(&processes, next, process_type, command_id.clone(), args.clone()).await {
                Ok(rx) => pending = rx,
                Err(_) => {
                    tracing::warn!(command_id = %command_id, "command chain aborted: failed to spawn next step");
                    return;
                }
            }
        }
    }

    async fn allocate_command_id(&self) -> RunnerResult<String> {
        for _ in 0..COMMAND_ID_ALLOC_ATTEMPTS {
            let candidate = uuid::Uuid::new_v4().to_string();
            if !self.processes.command_id_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(RunnerError::CommandIdExhausted(COMMAND_ID_ALLOC_ATTEMPTS))
    }

    async fn spawn_and_track(
        &self,
        spec: CommandSpec,
        process_type: ProcessType,
        command_id: String,
        args: ProcessArgs,
        publish_to: Option<mpsc::Sender<Process>>,
    ) -> RunnerResult<Process> {
        spawn_detached_owned(self.processes.clone(), spec, process_type, command_id, args, publish_to).await
    }
}

/// Spawns a child and, in a background task, waits for it and updates its
/// `Process` row to terminal. Returns the freshly-inserted `running` row
/// immediately.
async fn spawn_detached_owned(
    processes: ProcessRepository,
    spec: CommandSpec,
    process_type: ProcessType,
    command_id: String,
    args: ProcessArgs,
    publish_to: Option<mpsc::Sender<Process>>,
) -> RunnerResult<Process> {
    let command_label = describe(&spec);
    let mut command = build_tokio_command(&spec);
    command.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| RunnerError::Spawn(e.to_string()))?;
    let pid = i32::try_from(child.id().unwrap_or(0)).unwrap_or(i32::MAX);

    let mut process = Process::new_running(command_label, command_id, pid, process_type, args, Utc::now());
    processes.create(&mut process).await?;
    let running_snapshot = process.clone();

    tokio::spawn(async move {
        let output = child.wait_with_output().await;
        let mut process = process;
        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let code = output.status.code().unwrap_or(-1);
                process.complete(Utc::now(), stdout, stderr, code);
            }
            Err(err) => {
                process.complete(Utc::now(), String::new(), err.to_string(), -1);
            }
        }
        if let Err(err) = processes.update_terminal(&process).await {
            tracing::error!(error = %err, command_id = %process.command_id, "failed to persist terminal process state");
        }
        if let Some(tx) = publish_to {
            let _ = tx.send(process).await;
        }
    });

    Ok(running_snapshot)
}

/// Thin wrapper so the chain-continuation task (which only needs the
/// terminal result, not the running snapshot) can await completion directly.
async fn spawn_detached(
    processes: &ProcessRepository,
    spec: CommandSpec,
    process_type: ProcessType,
    command_id: String,
    args: ProcessArgs,
) -> RunnerResult<mpsc::Receiver<Process>> {
    let (tx, rx) = mpsc::channel(MASTER_CHANNEL_CAPACITY);
    spawn_detached_owned(processes.clone(), spec, process_type, command_id, args, Some(tx)).await?;
    Ok(rx)
}

fn build_tokio_command(spec: &CommandSpec) -> Command {
    let mut command = match spec {
        CommandSpec::Direct(argv) => {
            let mut cmd = Command::new(&argv[0]);
            cmd.args(&argv[1..]);
            cmd
        }
        CommandSpec::Shell(script) => {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
            cmd
        }
    };
    command.env_clear();
    if let Ok(path) = std::env::var("PATH") {
        command.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
        command.env("HOME", home);
    }
    command
}

fn describe(spec: &CommandSpec) -> String {
    match spec {
        CommandSpec::Direct(argv) => argv.join(" "),
        CommandSpec::Shell(script) => script.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbcalm_storage::init_pool_with_config;

    async fn test_repo() -> ProcessRepository {
        let pool = init_pool_with_config("sqlite::memory:", 1, std::time::Duration::from_secs(5)).await.unwrap();
        ProcessRepository::new(pool)
    }

    #[tokio::test]
    async fn execute_runs_a_direct_command_and_publishes_terminal_state() {
        let repo = test_repo().await;
        let runner = ProcessRunner::new(repo);
        let spec = CommandSpec::Direct(vec!["true".to_string()]);
        let (running, mut rx) = runner.execute(spec, ProcessType::MysqlPingCheck, None, ProcessArgs::new()).await.unwrap();
        assert_eq!(running.status, dbcalm_models::ProcessStatus::Running);

        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal.status, dbcalm_models::ProcessStatus::Success);
    }

    #[tokio::test]
    async fn execute_reports_nonzero_exit_as_failed() {
        let repo = test_repo().await;
        let runner = ProcessRunner::new(repo);
        let spec = CommandSpec::Direct(vec!["false".to_string()]);
        let (_running, mut rx) = runner.execute(spec, ProcessType::MysqlPingCheck, None, ProcessArgs::new()).await.unwrap();
        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal.status, dbcalm_models::ProcessStatus::Failed);
    }

    #[tokio::test]
    async fn execute_consecutive_stops_at_first_failure() {
        let repo = test_repo().await;
        let runner = ProcessRunner::new(repo);
        let specs = vec![
            CommandSpec::Direct(vec!["true".to_string()]),
            CommandSpec::Direct(vec!["false".to_string()]),
            CommandSpec::Direct(vec!["true".to_string()]),
        ];
        let (_first, mut rx) = runner.execute_consecutive(specs, ProcessType::Restore, ProcessArgs::new()).await.unwrap();
        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal.status, dbcalm_models::ProcessStatus::Failed);
    }

    #[tokio::test]
    async fn execute_consecutive_never_starts_step_two_when_step_one_fails() {
        let repo = test_repo().await;
        let runner = ProcessRunner::new(repo.clone());
        let specs = vec![CommandSpec::Direct(vec!["false".to_string()]), CommandSpec::Direct(vec!["true".to_string()])];
        let (first, mut rx) = runner.execute_consecutive(specs, ProcessType::Restore, ProcessArgs::new()).await.unwrap();

        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal.status, dbcalm_models::ProcessStatus::Failed);

        // give the background task a moment past the point it would have
        // spawned step two, were the (now-fixed) serialization bug present.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let rows = repo.by_command_id(&first.command_id).await.unwrap();
        assert_eq!(rows.len(), 1, "step two must never spawn once step one fails");
    }
}
