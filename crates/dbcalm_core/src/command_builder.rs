//! Builds `mariabackup`/`xtrabackup` argv vectors for full backup,
//! incremental backup, and multi-stage restore. Purely functional: no I/O,
//! no process spawning.

use dbcalm_models::{DomainError, DomainResult, RestoreTarget};

use crate::engine::requires_apply_log_only;
use crate::settings::BackupSettings;

/// A command ready to hand to the process runner. `Direct` is executed by
/// `exec` with no shell involved; `Shell` must run under `sh -c` because it
/// contains a pipe or redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    Direct(Vec<String>),
    Shell(String),
}

fn base_backup_argv(settings: &BackupSettings, target_dir: &str) -> Vec<String> {
    vec![
        settings.backup_binary().to_string(),
        format!("--defaults-file={}", settings.credentials_file),
        format!("--defaults-group-suffix=-{}", settings.project),
        "--backup".to_string(),
        format!("--target-dir={target_dir}"),
        "--host=localhost".to_string(),
    ]
}

/// Wraps a base backup argv with streaming/compression/forwarding, per the
/// pipeline design contract: if any pipe or redirect is needed, the whole
/// thing becomes one shell command string; otherwise a direct argv.
fn finish_backup_command(settings: &BackupSettings, mut argv: Vec<String>, id: &str) -> CommandSpec {
    if !settings.stream {
        return CommandSpec::Direct(argv);
    }
    argv.push("--stream=xbstream".to_string());

    let compression = settings.compression.unwrap_or(crate::settings::Compression::Gzip);
    let mut pipeline = argv.join(" ");
    pipeline.push_str(" | ");
    pipeline.push_str(compression.pipe_command());

    if let Some(forward) = &settings.forward {
        pipeline.push_str(" | ");
        pipeline.push_str(forward);
    } else {
        pipeline.push_str(&format!(
            " > {}/backup-{id}.xbstream{}",
            settings.backup_dir,
            compression.extension(),
        ));
    }

    CommandSpec::Shell(pipeline)
}

/// `build_full_backup_cmd(id)`.
#[must_use]
pub fn build_full_backup_cmd(settings: &BackupSettings, id: &str) -> CommandSpec {
    let target_dir = format!("{}/{id}", settings.backup_dir);
    let argv = base_backup_argv(settings, &target_dir);
    finish_backup_command(settings, argv, id)
}

/// `build_incremental_backup_cmd(id, from_backup_id)`.
#[must_use]
pub fn build_incremental_backup_cmd(settings: &BackupSettings, id: &str, from_backup_id: &str) -> CommandSpec {
    let target_dir = format!("{}/{id}", settings.backup_dir);
    let mut argv = base_backup_argv(settings, &target_dir);
    argv.push(format!("--incremental-basedir={}/{from_backup_id}", settings.backup_dir));
    finish_backup_command(settings, argv, id)
}

/// `build_restore_cmds(tmp_dir, id_list, target)`: an ordered chain of
/// direct argv commands (copy base, prepare base, prepare each incremental,
/// optional copy-back).
pub fn build_restore_cmds(
    settings: &BackupSettings,
    tmp_dir: &str,
    id_list: &[String],
    target: RestoreTarget,
    engine_version: (u32, u32, u32),
) -> DomainResult<Vec<CommandSpec>> {
    let (full_id, incrementals) = id_list
        .split_first()
        .ok_or_else(|| DomainError::InvalidInput("restore id_list must not be empty".into()))?;

    let mut commands = Vec::new();

    commands.push(CommandSpec::Direct(vec![
        "cp".to_string(),
        "-r".to_string(),
        format!("{}/{full_id}", settings.backup_dir),
        format!("{tmp_dir}/"),
    ]));

    let more_after_base = !incrementals.is_empty();
    let base_needs_log_only = requires_apply_log_only(settings.engine, engine_version, more_after_base);
    let mut prepare_base = vec![
        settings.backup_binary().to_string(),
        "--prepare".to_string(),
        "--target-dir".to_string(),
        format!("{tmp_dir}/{full_id}"),
    ];
    if base_needs_log_only {
        prepare_base.push("--apply-log-only".to_string());
    }
    commands.push(CommandSpec::Direct(prepare_base));

    for (i, inc_id) in incrementals.iter().enumerate() {
        let more_remain = i + 1 < incrementals.len();
        let needs_log_only = requires_apply_log_only(settings.engine, engine_version, more_remain);
        let mut prepare_inc = vec![
            settings.backup_binary().to_string(),
            "--prepare".to_string(),
            "--target-dir".to_string(),
            format!("{tmp_dir}/{full_id}"),
            "--incremental-dir".to_string(),
            format!("{}/{inc_id}", settings.backup_dir),
        ];
        if needs_log_only {
            prepare_inc.push("--apply-log-only".to_string());
        }
        commands.push(CommandSpec::Direct(prepare_inc));
    }

    if target == RestoreTarget::Database {
        let mut copy_back = vec![
            settings.backup_binary().to_string(),
            "--copy-back".to_string(),
            "--target-dir".to_string(),
            format!("{tmp_dir}/{full_id}"),
        ];
        if settings.engine.always_sets_datadir_on_copy_back() {
            copy_back.push(format!("--datadir={}", settings.data_dir));
        }
        commands.push(CommandSpec::Direct(copy_back));
    }

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Compression, Engine};

    fn settings(stream: bool, compression: Option<Compression>, forward: Option<&str>) -> BackupSettings {
        BackupSettings {
            engine: Engine::MariaDb,
            backup_bin: None,
            credentials_file: "/etc/dbcalm/client.cnf".into(),
            project: "dbcalm".into(),
            backup_dir: "/var/backups/dbcalm".into(),
            data_dir: "/var/lib/mysql".into(),
            stream,
            compression,
            forward: forward.map(ToString::to_string),
        }
    }

    #[test]
    fn full_backup_without_streaming_is_direct() {
        let s = settings(false, None, None);
        match build_full_backup_cmd(&s, "2024-10-18-03-00-00") {
            CommandSpec::Direct(argv) => {
                assert_eq!(argv[0], "mariabackup");
                assert!(argv.contains(&"--target-dir=/var/backups/dbcalm/2024-10-18-03-00-00".to_string()));
            }
            CommandSpec::Shell(_) => panic!("expected direct exec"),
        }
    }

    #[test]
    fn streaming_without_compression_defaults_to_gzip() {
        let s = settings(true, None, None);
        match build_full_backup_cmd(&s, "id1") {
            CommandSpec::Shell(cmd) => {
                assert!(cmd.contains("| gzip"));
                assert!(cmd.contains("backup-id1.xbstream.gz"));
            }
            CommandSpec::Direct(_) => panic!("expected shell pipeline"),
        }
    }

    #[test]
    fn streaming_with_forward_skips_file_redirect() {
        let s = settings(true, Some(Compression::Zstd), Some("nc remote-host 9999"));
        match build_full_backup_cmd(&s, "id1") {
            CommandSpec::Shell(cmd) => {
                assert!(cmd.contains("zstd - -c -T0"));
                assert!(cmd.ends_with("nc remote-host 9999"));
                assert!(!cmd.contains(".xbstream"));
            }
            CommandSpec::Direct(_) => panic!("expected shell pipeline"),
        }
    }

    #[test]
    fn incremental_backup_adds_basedir() {
        let s = settings(false, None, None);
        match build_incremental_backup_cmd(&s, "id2", "id1") {
            CommandSpec::Direct(argv) => {
                assert!(argv.contains(&"--incremental-basedir=/var/backups/dbcalm/id1".to_string()));
            }
            CommandSpec::Shell(_) => panic!("expected direct exec"),
        }
    }

    #[test]
    fn restore_chain_to_database_with_one_incremental() {
        let s = settings(false, None, None);
        let ids = vec!["full1".to_string(), "inc1".to_string()];
        let cmds = build_restore_cmds(&s, "/tmp/restore-1", &ids, RestoreTarget::Database, (10, 5, 0)).unwrap();
        assert_eq!(cmds.len(), 4);

        let CommandSpec::Direct(cp) = &cmds[0] else { panic!() };
        assert_eq!(cp[0], "cp");

        let CommandSpec::Direct(prepare_base) = &cmds[1] else { panic!() };
        assert!(!prepare_base.contains(&"--apply-log-only".to_string()));

        let CommandSpec::Direct(prepare_inc) = &cmds[2] else { panic!() };
        assert!(prepare_inc.contains(&"--incremental-dir".to_string()));

        let CommandSpec::Direct(copy_back) = &cmds[3] else { panic!() };
        assert!(copy_back.contains(&"--copy-back".to_string()));
        assert!(!copy_back.iter().any(|a| a.starts_with("--datadir")));
    }

    #[test]
    fn restore_folder_target_skips_copy_back() {
        let s = settings(false, None, None);
        let ids = vec!["full1".to_string()];
        let cmds = build_restore_cmds(&s, "/tmp/restore-1", &ids, RestoreTarget::Folder, (10, 5, 0)).unwrap();
        assert_eq!(cmds.len(), 2);
    }

    #[test]
    fn old_mariadb_version_sets_apply_log_only_on_base() {
        let s = settings(false, None, None);
        let ids = vec!["full1".to_string(), "inc1".to_string()];
        let cmds = build_restore_cmds(&s, "/tmp/restore-1", &ids, RestoreTarget::Folder, (10, 1, 0)).unwrap();
        let CommandSpec::Direct(prepare_base) = &cmds[1] else { panic!() };
        assert!(prepare_base.contains(&"--apply-log-only".to_string()));
    }

    #[test]
    fn mysql_copy_back_always_sets_datadir() {
        let mut s = settings(false, None, None);
        s.engine = Engine::MySql;
        let ids = vec!["full1".to_string()];
        let cmds = build_restore_cmds(&s, "/tmp/restore-1", &ids, RestoreTarget::Database, (8, 0, 35)).unwrap();
        let CommandSpec::Direct(copy_back) = cmds.last().unwrap() else { panic!() };
        assert!(copy_back.contains(&"--datadir=/var/lib/mysql".to_string()));
    }

    #[test]
    fn empty_id_list_is_rejected() {
        let s = settings(false, None, None);
        let err = build_restore_cmds(&s, "/tmp/x", &[], RestoreTarget::Folder, (10, 5, 0)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
