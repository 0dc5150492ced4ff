//! Administrative CLI: launches the API front door, manages operator users
//! and service clients, and serves as the non-interactive cron entry point
//! that actually triggers a scheduled backup.

use chrono::Utc;
use clap::{Parser, Subcommand};
use dbcalm_models::{BackupType, Client, User};
use dbcalm_server::auth::{PasswordHasher, ALL_SCOPES, SCOPE_BACKUPS_WRITE};
use dbcalm_server::config::ConfigLoader;
use dbcalm_server::db::{init_pool_with_config, ClientRepository, UserRepository};
use rand::Rng;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dbcalmctl", about = "Administrative CLI for the dbcalm backup control plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Launch the API front door (`dbcalm-api`).
    Server,
    /// Manage operator login accounts.
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage service-to-service API credentials.
    Clients {
        #[command(subcommand)]
        action: ClientAction,
    },
    /// Trigger a backup — the cron-invoked entry point.
    Backup {
        #[arg(value_enum)]
        kind: BackupKind,
        #[arg(long)]
        schedule_id: Option<i64>,
    },
}

#[derive(Subcommand)]
enum UserAction {
    Add { username: String, password: String },
    Delete { username: String },
    UpdatePassword { username: String, password: String },
    List,
}

#[derive(Subcommand)]
enum ClientAction {
    Add { id: String, label: String },
    Delete { id: String },
    Update { id: String, label: String },
    List,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum BackupKind {
    Full,
    Incremental,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = ConfigLoader::load().unwrap_or_default();

    match cli.command {
        Command::Server => exec_server(),
        Command::Users { action } => {
            let pool = init_pool_with_config(
                &format!("sqlite://{}/db.sqlite3", config.state_dir),
                1,
                std::time::Duration::from_secs(5),
            )
            .await?;
            run_users(UserRepository::new(pool), action).await
        }
        Command::Clients { action } => {
            let pool = init_pool_with_config(
                &format!("sqlite://{}/db.sqlite3", config.state_dir),
                1,
                std::time::Duration::from_secs(5),
            )
            .await?;
            run_clients(ClientRepository::new(pool), action).await
        }
        Command::Backup { kind, schedule_id } => run_backup(&config, kind, schedule_id).await,
    }
}

/// Replaces this process with the API front door binary — cron and systemd
/// units both just invoke `dbcalmctl server`.
fn exec_server() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let err = std::process::Command::new("dbcalm-api").exec();
        anyhow::bail!("failed to exec dbcalm-api: {err}");
    }
    #[cfg(not(unix))]
    {
        let status = std::process::Command::new("dbcalm-api").status()?;
        std::process::exit(status.code().unwrap_or(1));
    }
}

async fn run_users(repo: UserRepository, action: UserAction) -> anyhow::Result<()> {
    match action {
        UserAction::Add { username, password } => {
            let now = Utc::now();
            let user = User { username, password_hash: PasswordHasher::hash(&password)?, created_at: now, updated_at: now };
            repo.create(&user).await?;
            println!("created user {}", user.username);
        }
        UserAction::Delete { username } => {
            repo.delete(&username).await?;
            println!("deleted user {username}");
        }
        UserAction::UpdatePassword { username, password } => {
            let hash = PasswordHasher::hash(&password)?;
            repo.update_password(&username, &hash, Utc::now()).await?;
            println!("updated password for {username}");
        }
        UserAction::List => {
            for user in repo.list().await? {
                println!("{}\t{}", user.username, user.updated_at);
            }
        }
    }
    Ok(())
}

async fn run_clients(repo: ClientRepository, action: ClientAction) -> anyhow::Result<()> {
    match action {
        ClientAction::Add { id, label } => {
            let secret = generate_secret();
            let client = Client {
                id: id.clone(),
                secret_hash: PasswordHasher::hash(&secret)?,
                scopes: ALL_SCOPES.iter().map(ToString::to_string).collect(),
                label,
            };
            repo.create(&client, Utc::now()).await?;
            println!("created client {id}");
            println!("client_secret: {secret}");
            println!("(this is shown once; store it now)");
        }
        ClientAction::Delete { id } => {
            repo.delete(&id).await?;
            println!("deleted client {id}");
        }
        ClientAction::Update { id, label } => {
            let Some(mut client) = repo.get(&id).await? else {
                anyhow::bail!("no such client: {id}");
            };
            client.label = label;
            repo.update(&client).await?;
            println!("updated client {id}");
        }
        ClientAction::List => {
            for client in repo.list().await? {
                println!("{}\t{}\t{:?}", client.id, client.label, client.scopes);
            }
        }
    }
    Ok(())
}

/// The cron entry point: mints a throwaway `Client`, trades it for a JWT,
/// calls the API, then deletes the client whether the backup call
/// succeeded or not.
async fn run_backup(config: &dbcalm_server::DbcalmConfig, kind: BackupKind, schedule_id: Option<i64>) -> anyhow::Result<()> {
    let pool = init_pool_with_config(
        &format!("sqlite://{}/db.sqlite3", config.state_dir),
        1,
        std::time::Duration::from_secs(5),
    )
    .await?;
    let clients = ClientRepository::new(pool);

    let client_id = format!("cron-{}", Uuid::new_v4());
    let secret = generate_secret();
    let client = Client {
        id: client_id.clone(),
        secret_hash: PasswordHasher::hash(&secret)?,
        scopes: vec![SCOPE_BACKUPS_WRITE.to_string()],
        label: "temporary cron client".to_string(),
    };
    clients.create(&client, Utc::now()).await?;

    let result = call_backup_api(config, &client_id, &secret, kind, schedule_id).await;

    if let Err(err) = clients.delete(&client_id).await {
        tracing::warn!(error = %err, client_id, "failed to delete temporary cron client");
    }

    result
}

async fn call_backup_api(
    config: &dbcalm_server::DbcalmConfig,
    client_id: &str,
    secret: &str,
    kind: BackupKind,
    schedule_id: Option<i64>,
) -> anyhow::Result<()> {
    let base_url = format!("http://{}:{}", config.api_host, config.api_port);
    let http = reqwest::Client::new();

    let token_response: serde_json::Value = http
        .post(format!("{base_url}/auth/token"))
        .json(&serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": client_id,
            "client_secret": secret,
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let token = token_response["access_token"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("token response missing access_token"))?;

    let backup_type = match kind {
        BackupKind::Full => BackupType::Full,
        BackupKind::Incremental => BackupType::Incremental,
    };
    let response = http
        .post(format!("{base_url}/backups"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "type": backup_type.as_str(),
            "schedule_id": schedule_id,
        }))
        .send()
        .await?
        .error_for_status()?;
    let body: serde_json::Value = response.json().await?;
    println!("{body}");
    Ok(())
}

fn generate_secret() -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..40).map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char).collect()
}
