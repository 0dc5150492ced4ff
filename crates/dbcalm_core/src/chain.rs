//! Restore chain walker: resolves the ordered sequence of backups a restore
//! must apply, from the requested backup back to its root full backup.

use dbcalm_models::{Backup, DomainError, DomainResult};

/// Walks `from_backup_id` links starting at `backup` back to the root full
/// backup, returning the chain in apply order (full first, most-derived
/// last). `lookup` resolves a backup id to its row; a missing link is
/// reported with the offending id so the caller can produce a precise
/// 404 detail.
pub fn required_backups<F>(backup: &Backup, mut lookup: F) -> DomainResult<Vec<Backup>>
where
    F: FnMut(&str) -> Option<Backup>,
{
    let mut chain = vec![backup.clone()];
    let mut current = backup.clone();

    while let Some(parent_id) = current.from_backup_id.clone() {
        let parent = lookup(&parent_id)
            .ok_or_else(|| DomainError::ChainBroken(format!("{parent_id} not found")))?;
        chain.push(parent.clone());
        current = parent;
    }

    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn backup(id: &str, from: Option<&str>) -> Backup {
        Backup {
            id: id.to_string(),
            from_backup_id: from.map(ToString::to_string),
            schedule_id: None,
            start_time: Utc::now(),
            end_time: Utc::now(),
            process_id: 1,
        }
    }

    #[test]
    fn single_full_backup_chain_is_itself() {
        let full = backup("full", None);
        let chain = required_backups(&full, |_| None).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].id, "full");
    }

    #[test]
    fn chain_walk_orders_full_first() {
        let full = backup("full", None);
        let inc = backup("inc", Some("full"));
        let store: HashMap<&str, Backup> = HashMap::from([("full", full.clone())]);

        let chain = required_backups(&inc, |id| store.get(id).cloned()).unwrap();
        assert_eq!(chain.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), vec!["full", "inc"]);
    }

    #[test]
    fn missing_base_reports_the_missing_id() {
        let inc = backup("inc", Some("missing-base"));
        let err = required_backups(&inc, |_| None).unwrap_err();
        assert!(err.to_string().contains("missing-base not found"));
    }
}
