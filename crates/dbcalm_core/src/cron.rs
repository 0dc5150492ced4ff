//! Scheduler bridge: translates enabled `Schedule` rows into an
//! `/etc/cron.d` fragment. Pure string building; the system command service
//! owns the atomic file swap (see `dbcalm-server::services::cron_writer`).

use chrono::{DateTime, Utc};
use dbcalm_models::{DomainError, DomainResult, Frequency, Schedule};

/// One cron expression field set: `minute hour day_of_month month day_of_week`.
#[must_use]
pub fn cron_expression(schedule: &Schedule) -> DomainResult<String> {
    match schedule.frequency {
        Frequency::Interval => {
            let value = schedule.interval_value.ok_or_else(|| {
                DomainError::ValidationError("interval schedule missing interval_value".into())
            })?;
            let unit = schedule.interval_unit.ok_or_else(|| {
                DomainError::ValidationError("interval schedule missing interval_unit".into())
            })?;
            match unit {
                dbcalm_models::IntervalUnit::Minutes => Ok(format!("*/{value} * * * *")),
                dbcalm_models::IntervalUnit::Hours => Ok(format!("0 */{value} * * *")),
            }
        }
        Frequency::Hourly => {
            let minute = require_minute(schedule)?;
            Ok(format!("{minute} * * * *"))
        }
        Frequency::Daily => {
            let minute = require_minute(schedule)?;
            let hour = require_hour(schedule)?;
            Ok(format!("{minute} {hour} * * *"))
        }
        Frequency::Weekly => {
            let minute = require_minute(schedule)?;
            let hour = require_hour(schedule)?;
            let dow = schedule
                .day_of_week
                .map_or_else(|| "*".to_string(), |d| d.to_string());
            Ok(format!("{minute} {hour} * * {dow}"))
        }
        Frequency::Monthly => {
            let minute = require_minute(schedule)?;
            let hour = require_hour(schedule)?;
            let dom = schedule
                .day_of_month
                .map_or_else(|| "*".to_string(), |d| d.to_string());
            Ok(format!("{minute} {hour} {dom} * *"))
        }
    }
}

fn require_minute(schedule: &Schedule) -> DomainResult<u8> {
    schedule
        .minute
        .ok_or_else(|| DomainError::ValidationError("schedule missing minute".into()))
}

fn require_hour(schedule: &Schedule) -> DomainResult<u8> {
    schedule
        .hour
        .ok_or_else(|| DomainError::ValidationError("schedule missing hour".into()))
}

/// The full line run by cron for one enabled schedule:
/// `<expr> root <binary> backup <type> --schedule-id=<id>  >> <log> 2>&1`.
pub fn cron_line(
    schedule: &Schedule,
    binary_path: &str,
    project: &str,
) -> DomainResult<String> {
    let id = schedule
        .id
        .ok_or_else(|| DomainError::ValidationError("schedule has no id".into()))?;
    let expr = cron_expression(schedule)?;
    Ok(format!(
        "{expr} root {binary_path} backup {backup_type} --schedule-id={id} >> /var/log/{project}/cron-{id}.log 2>&1",
        backup_type = schedule.backup_type.as_str(),
    ))
}

/// Renders the whole `/etc/cron.d/<project>` fragment: a generated-file
/// banner followed by one line per enabled schedule, in input order.
#[must_use]
pub fn render_cron_file(
    schedules: &[Schedule],
    binary_path: &str,
    project: &str,
    now: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        format!("# {project} backup schedules"),
        "# auto-generated - do not edit manually".to_string(),
        format!("# last updated: {}", now.format("%Y-%m-%d %H:%M:%S UTC")),
        String::new(),
    ];

    for schedule in schedules.iter().filter(|s| s.enabled) {
        match cron_line(schedule, binary_path, project) {
            Ok(line) => {
                if let Some(id) = schedule.id {
                    lines.push(format!("# schedule id: {id}"));
                }
                lines.push(line);
            }
            Err(err) => {
                tracing::warn!(error = %err, schedule_id = ?schedule.id, "skipping malformed schedule in cron render");
            }
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbcalm_models::{BackupType, IntervalUnit};

    fn base_schedule() -> Schedule {
        Schedule {
            id: Some(1),
            backup_type: BackupType::Full,
            frequency: Frequency::Daily,
            day_of_week: None,
            day_of_month: None,
            hour: Some(3),
            minute: Some(0),
            interval_value: None,
            interval_unit: None,
            retention_value: None,
            retention_unit: None,
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn daily_expression() {
        let s = base_schedule();
        assert_eq!(cron_expression(&s).unwrap(), "0 3 * * *");
    }

    #[test]
    fn interval_minutes_expression() {
        let mut s = base_schedule();
        s.frequency = Frequency::Interval;
        s.interval_value = Some(15);
        s.interval_unit = Some(IntervalUnit::Minutes);
        assert_eq!(cron_expression(&s).unwrap(), "*/15 * * * *");
    }

    #[test]
    fn interval_hours_expression() {
        let mut s = base_schedule();
        s.frequency = Frequency::Interval;
        s.interval_value = Some(6);
        s.interval_unit = Some(IntervalUnit::Hours);
        assert_eq!(cron_expression(&s).unwrap(), "0 */6 * * *");
    }

    #[test]
    fn weekly_expression_with_day() {
        let mut s = base_schedule();
        s.frequency = Frequency::Weekly;
        s.day_of_week = Some(2);
        assert_eq!(cron_expression(&s).unwrap(), "0 3 * * 2");
    }

    #[test]
    fn monthly_expression_with_day() {
        let mut s = base_schedule();
        s.frequency = Frequency::Monthly;
        s.day_of_month = Some(15);
        assert_eq!(cron_expression(&s).unwrap(), "0 3 15 * *");
    }

    #[test]
    fn disabled_schedules_are_excluded_from_render() {
        let mut enabled = base_schedule();
        enabled.id = Some(1);
        let mut disabled = base_schedule();
        disabled.id = Some(2);
        disabled.enabled = false;

        let rendered = render_cron_file(&[enabled, disabled], "/usr/bin/dbcalmctl", "dbcalm", Utc::now());
        assert!(rendered.contains("schedule id: 1"));
        assert!(!rendered.contains("schedule id: 2"));
    }

    #[test]
    fn render_is_idempotent_modulo_timestamp_line() {
        let s = base_schedule();
        let now = Utc::now();
        let a = render_cron_file(std::slice::from_ref(&s), "/usr/bin/dbcalmctl", "dbcalm", now);
        let b = render_cron_file(std::slice::from_ref(&s), "/usr/bin/dbcalmctl", "dbcalm", now);
        assert_eq!(a, b);
    }
}
