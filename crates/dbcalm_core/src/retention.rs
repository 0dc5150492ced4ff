//! Chain-aware retention policy: which `Backup` rows are old enough, as a
//! whole chain, to be removed.

use chrono::{DateTime, Utc};
use dbcalm_models::Backup;

/// One full backup plus every incremental descending from it, in
/// `start_time` order.
#[derive(Debug, Clone)]
pub struct Chain {
    pub members: Vec<Backup>,
}

impl Chain {
    #[must_use]
    pub fn oldest_member_age(&self) -> Option<DateTime<Utc>> {
        self.members.first().map(|b| b.start_time)
    }

    #[must_use]
    pub fn is_expired(&self, cutoff: DateTime<Utc>) -> bool {
        !self.members.is_empty() && self.members.iter().all(|b| b.start_time < cutoff)
    }
}

/// Groups backups (already filtered to one schedule, ordered by
/// `start_time` ascending) into chains: a chain starts at every backup with
/// `from_backup_id == None` and absorbs every following backup until the
/// next full.
#[must_use]
pub fn group_into_chains(backups: &[Backup]) -> Vec<Chain> {
    let mut chains: Vec<Chain> = Vec::new();
    for backup in backups {
        if backup.is_full() || chains.is_empty() {
            chains.push(Chain { members: vec![backup.clone()] });
        } else {
            chains.last_mut().expect("just checked non-empty").members.push(backup.clone());
        }
    }
    chains
}

/// Returns the backups belonging to chains that are wholly older than
/// `cutoff`. `backups` must already be filtered to one schedule and ordered
/// by `start_time` ascending.
#[must_use]
pub fn expired_backups(backups: &[Backup], cutoff: DateTime<Utc>) -> Vec<Backup> {
    group_into_chains(backups)
        .into_iter()
        .filter(|chain| chain.is_expired(cutoff))
        .flat_map(|chain| chain.members)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn backup(id: &str, from: Option<&str>, start: DateTime<Utc>) -> Backup {
        Backup {
            id: id.to_string(),
            from_backup_id: from.map(ToString::to_string),
            schedule_id: Some(1),
            start_time: start,
            end_time: start + Duration::minutes(5),
            process_id: 1,
        }
    }

    #[test]
    fn single_chain_with_recent_member_is_kept_whole() {
        let now = Utc::now();
        let backups = vec![
            backup("full", None, now - Duration::days(10)),
            backup("inc", Some("full"), now - Duration::days(3)),
        ];
        let cutoff = now - Duration::days(7);
        assert!(expired_backups(&backups, cutoff).is_empty());
    }

    #[test]
    fn chain_expires_only_when_every_member_is_old() {
        let now = Utc::now();
        let backups = vec![
            backup("full", None, now - Duration::days(10)),
            backup("inc", Some("full"), now - Duration::days(10)),
        ];
        let cutoff = now - Duration::days(7);
        let expired = expired_backups(&backups, cutoff);
        assert_eq!(expired.len(), 2);
    }

    #[test]
    fn new_full_starts_a_new_chain() {
        let now = Utc::now();
        let backups = vec![
            backup("full1", None, now - Duration::days(20)),
            backup("inc1", Some("full1"), now - Duration::days(19)),
            backup("full2", None, now - Duration::days(2)),
        ];
        let cutoff = now - Duration::days(7);
        let expired = expired_backups(&backups, cutoff);
        assert_eq!(expired.len(), 2);
        assert!(expired.iter().all(|b| b.id != "full2"));
    }

    #[test]
    fn empty_input_yields_no_expirations() {
        let cutoff = Utc::now();
        assert!(expired_backups(&[], cutoff).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    /// Builds a schedule's worth of chains from a flat list of ages (days
    /// before `now`) and `is_full` markers, the way `group_into_chains`
    /// expects: sorted ascending by `start_time`, with the first backup
    /// always full so every age list produces at least one chain.
    fn backups_from_ages(ages_days: &[u32], full_flags: &[bool]) -> Vec<Backup> {
        let now = Utc::now();
        ages_days
            .iter()
            .zip(full_flags.iter())
            .enumerate()
            .map(|(i, (age, is_full))| {
                let start = now - Duration::days(i64::from(*age));
                let from_backup_id = if i == 0 || *is_full { None } else { Some("prev".to_string()) };
                Backup {
                    id: format!("b{i}"),
                    from_backup_id,
                    schedule_id: Some(1),
                    start_time: start,
                    end_time: start + Duration::minutes(5),
                    process_id: 1,
                }
            })
            .collect()
    }

    proptest! {
        /// The chain-expiry invariant from the retention policy: a chain
        /// with any member at or newer than the cutoff must never appear,
        /// even partially, in the expired set.
        #[test]
        fn chain_with_a_recent_member_is_never_returned_as_expired(
            ages in prop::collection::vec(0u32..60, 1..12),
            full_flags in prop::collection::vec(any::<bool>(), 1..12),
            cutoff_days in 0u32..60,
        ) {
            let len = ages.len().min(full_flags.len());
            let backups = backups_from_ages(&ages[..len], &full_flags[..len]);
            let now = Utc::now();
            let cutoff = now - Duration::days(i64::from(cutoff_days));

            let expired = expired_backups(&backups, cutoff);
            let expired_ids: std::collections::HashSet<_> = expired.iter().map(|b| b.id.clone()).collect();

            for chain in group_into_chains(&backups) {
                let has_recent_member = chain.members.iter().any(|b| b.start_time >= cutoff);
                if has_recent_member {
                    for member in &chain.members {
                        prop_assert!(!expired_ids.contains(&member.id));
                    }
                }
            }
        }

        /// Every chain is expired-in-full or kept-in-full: the expired set
        /// never contains only part of a chain.
        #[test]
        fn expiration_is_all_or_nothing_per_chain(
            ages in prop::collection::vec(0u32..60, 1..12),
            full_flags in prop::collection::vec(any::<bool>(), 1..12),
            cutoff_days in 0u32..60,
        ) {
            let len = ages.len().min(full_flags.len());
            let backups = backups_from_ages(&ages[..len], &full_flags[..len]);
            let now = Utc::now();
            let cutoff = now - Duration::days(i64::from(cutoff_days));

            let expired = expired_backups(&backups, cutoff);
            let expired_ids: std::collections::HashSet<_> = expired.iter().map(|b| b.id.clone()).collect();

            for chain in group_into_chains(&backups) {
                let expired_count = chain.members.iter().filter(|b| expired_ids.contains(&b.id)).count();
                prop_assert!(expired_count == 0 || expired_count == chain.members.len());
            }
        }
    }
}
