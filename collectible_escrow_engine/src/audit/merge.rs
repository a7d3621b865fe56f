use std::{cmp::Ordering, collections::HashSet};

use crate::audit::{AuditLogEntry, AuditStatus, SortKey};

/// Timeline order: timestamp first. At the same instant chain entries come before local ones, chain entries keep
/// their on-chain order, and whatever still ties falls back to the title.
pub fn compare_entries(a: &AuditLogEntry, b: &AuditLogEntry) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| match (a.sort_key, b.sort_key) {
            (SortKey::Chain { .. }, SortKey::Chain { .. }) => a.sort_key.cmp(&b.sort_key),
            (SortKey::Chain { .. }, SortKey::Local(_)) => Ordering::Less,
            (SortKey::Local(_), SortKey::Chain { .. }) => Ordering::Greater,
            (SortKey::Local(_), SortKey::Local(_)) => Ordering::Equal,
        })
        .then_with(|| a.title.cmp(&b.title))
}

pub fn sort_audit_log(entries: &mut [AuditLogEntry]) {
    entries.sort_by(compare_entries);
}

/// Combines the two sources into a single timeline. Chain data wins: a local entry is dropped whenever a chain entry
/// carries the same status.
pub fn merge_audit_logs(chain: Vec<AuditLogEntry>, local: Vec<AuditLogEntry>) -> Vec<AuditLogEntry> {
    let on_chain = chain.iter().map(|e| e.status).collect::<HashSet<AuditStatus>>();
    let mut merged = chain;
    merged.extend(local.into_iter().filter(|e| !on_chain.contains(&e.status)));
    sort_audit_log(&mut merged);
    merged
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, Utc};

    use super::*;

    fn entry(title: &str, status: AuditStatus, ts: DateTime<Utc>, sort_key: SortKey) -> AuditLogEntry {
        AuditLogEntry { title: title.into(), timestamp: ts, detail: String::new(), actor: None, status, sort_key }
    }

    fn chain_key(block_number: u64, log_index: u64) -> SortKey {
        SortKey::Chain { block_number, log_index }
    }

    #[test]
    fn chain_status_replaces_local() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        let t2 = t0 + Duration::minutes(7);
        let chain = vec![entry("Shipment marked", AuditStatus::Shipped, t1, chain_key(4, 0))];
        let local = vec![
            entry("Order placed", AuditStatus::Placed, t0, SortKey::Local(0)),
            entry("Shipment marked", AuditStatus::Shipped, t2, SortKey::Local(1)),
        ];
        let merged = merge_audit_logs(chain, local);
        assert_eq!(merged.len(), 2);
        let shipped: Vec<_> = merged.iter().filter(|e| e.status == AuditStatus::Shipped).collect();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].timestamp, t1);
        assert!(shipped[0].is_on_chain());
        assert_eq!(merged[0].status, AuditStatus::Placed);
    }

    #[test]
    fn statuses_missing_on_chain_are_kept() {
        let t0 = Utc::now();
        let chain = vec![entry("In transit", AuditStatus::InTransit, t0 + Duration::minutes(2), chain_key(5, 0))];
        let local = vec![
            entry("Order placed", AuditStatus::Placed, t0, SortKey::Local(0)),
            entry("Shipment marked", AuditStatus::Shipped, t0 + Duration::minutes(1), SortKey::Local(1)),
        ];
        let titles: Vec<String> = merge_audit_logs(chain, local).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["Order placed", "Shipment marked", "In transit"]);
    }

    #[test]
    fn same_block_time_keeps_chain_order() {
        let t = Utc::now();
        let chain = vec![
            entry("Delivery confirmed", AuditStatus::Confirmed, t, chain_key(9, 1)),
            entry("Delivered", AuditStatus::Delivered, t, chain_key(9, 0)),
        ];
        let titles: Vec<String> = merge_audit_logs(chain, vec![]).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["Delivered", "Delivery confirmed"]);
    }

    #[test]
    fn ties_break_on_title() {
        let t = Utc::now();
        let mut entries = vec![
            entry("Payment released", AuditStatus::Released, t, SortKey::Local(3)),
            entry("Delivery marked", AuditStatus::Delivered, t, SortKey::Local(2)),
        ];
        sort_audit_log(&mut entries);
        assert_eq!(entries[0].title, "Delivery marked");
    }

    #[test]
    fn same_instant_order_ignores_input_order() {
        let t = Utc::now();
        let entries = [
            entry("M local", AuditStatus::Delivered, t, SortKey::Local(2)),
            entry("Z chain", AuditStatus::Shipped, t, chain_key(9, 0)),
            entry("A chain", AuditStatus::InTransit, t, chain_key(9, 1)),
        ];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let mut shuffled: Vec<AuditLogEntry> = order.iter().map(|&i| entries[i].clone()).collect();
            sort_audit_log(&mut shuffled);
            let titles: Vec<&str> = shuffled.iter().map(|e| e.title.as_str()).collect();
            assert_eq!(titles, ["Z chain", "A chain", "M local"], "input order {order:?}");
        }
    }

    #[test]
    fn empty_sources() {
        assert!(merge_audit_logs(vec![], vec![]).is_empty());
    }
}
