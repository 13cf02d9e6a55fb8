//! Turning a complete-replacement change into Cloudflare record operations
//!
//! Cloudflare stores one record per value, so replacing a record set means
//! reconciling individual records: records that already hold a wanted value
//! are kept, spare records are overwritten with missing values, remaining
//! values are created and remaining records deleted.

use ipwatch_core::traits::RecordChange;
use std::collections::BTreeSet;

use crate::api::DnsRecord;

/// One record operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOp {
    /// PUT an existing record with `content`
    Overwrite { id: String, content: String },
    /// POST a new record
    Create { content: String },
    /// DELETE an existing record
    Delete { id: String },
}

/// Operations replacing one record set
///
/// The store submits all of them as one atomic batch, so a failure leaves
/// the published set untouched. Ops are ordered overwrites, creates,
/// deletes for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementPlan {
    pub ops: Vec<RecordOp>,
}

impl ReplacementPlan {
    /// Build the plan for `change` given the records currently published
    pub fn build(existing: &[DnsRecord], change: &RecordChange) -> Self {
        let wanted: BTreeSet<&str> = change.addresses.iter().map(String::as_str).collect();

        let mut records: Vec<&DnsRecord> = existing.iter().collect();
        records.sort_by(|a, b| (&a.content, &a.id).cmp(&(&b.content, &b.id)));

        let mut kept: BTreeSet<&str> = BTreeSet::new();
        let mut refresh = Vec::new();
        let mut spare = Vec::new();
        for record in records {
            let content = record.content.as_str();
            if wanted.contains(content) && kept.insert(content) {
                if record.ttl != Some(change.ttl)
                    || record.comment.as_deref() != Some(change.comment.as_str())
                {
                    refresh.push(record);
                }
            } else {
                spare.push(record);
            }
        }

        let mut missing = wanted.difference(&kept).copied();
        let mut ops = Vec::new();

        for record in refresh {
            ops.push(RecordOp::Overwrite {
                id: record.id.clone(),
                content: record.content.clone(),
            });
        }

        let mut leftovers = Vec::new();
        for record in spare {
            match missing.next() {
                Some(content) => ops.push(RecordOp::Overwrite {
                    id: record.id.clone(),
                    content: content.to_string(),
                }),
                None => leftovers.push(record),
            }
        }

        for content in missing {
            ops.push(RecordOp::Create {
                content: content.to_string(),
            });
        }

        for record in leftovers {
            ops.push(RecordOp::Delete {
                id: record.id.clone(),
            });
        }

        Self { ops }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Counts of (overwrites, creates, deletes)
    pub fn counts(&self) -> (usize, usize, usize) {
        self.ops.iter().fold((0, 0, 0), |(o, c, d), op| match op {
            RecordOp::Overwrite { .. } => (o + 1, c, d),
            RecordOp::Create { .. } => (o, c + 1, d),
            RecordOp::Delete { .. } => (o, c, d + 1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipwatch_core::traits::{CHANGE_COMMENT, RecordType};

    fn record(id: &str, content: &str) -> DnsRecord {
        DnsRecord {
            id: id.to_string(),
            name: "a.example.com".to_string(),
            record_type: "A".to_string(),
            content: content.to_string(),
            ttl: Some(60),
            comment: Some(CHANGE_COMMENT.to_string()),
        }
    }

    fn change(addresses: &[&str]) -> RecordChange {
        RecordChange::upsert(
            "a.example.com",
            RecordType::A,
            addresses.iter().map(|a| a.to_string()).collect(),
            60,
        )
    }

    #[test]
    fn test_fresh_name_creates_every_value() {
        let plan = ReplacementPlan::build(&[], &change(&["1.2.3.4", "5.6.7.8"]));
        assert_eq!(
            plan.ops,
            vec![
                RecordOp::Create { content: "1.2.3.4".into() },
                RecordOp::Create { content: "5.6.7.8".into() },
            ]
        );
    }

    #[test]
    fn test_matching_records_are_kept() {
        let existing = [record("r1", "1.2.3.4")];
        let plan = ReplacementPlan::build(&existing, &change(&["1.2.3.4", "5.6.7.8"]));
        assert_eq!(plan.ops, vec![RecordOp::Create { content: "5.6.7.8".into() }]);
    }

    #[test]
    fn test_spare_record_is_reused_before_creating() {
        let existing = [record("r1", "9.9.9.9"), record("r2", "1.2.3.4")];
        let plan = ReplacementPlan::build(&existing, &change(&["1.2.3.4", "5.6.7.8"]));
        assert_eq!(
            plan.ops,
            vec![RecordOp::Overwrite {
                id: "r1".into(),
                content: "5.6.7.8".into()
            }]
        );
    }

    #[test]
    fn test_surplus_records_are_deleted_last() {
        let existing = [
            record("r3", "9.9.9.9"),
            record("r1", "1.2.3.4"),
            record("r2", "1.2.3.4"),
        ];
        let plan = ReplacementPlan::build(&existing, &change(&["1.2.3.4"]));
        assert_eq!(
            plan.ops,
            vec![
                RecordOp::Delete { id: "r2".into() },
                RecordOp::Delete { id: "r3".into() },
            ]
        );
        assert_eq!(plan.counts(), (0, 0, 2));
    }

    #[test]
    fn test_stale_ttl_is_refreshed() {
        let mut stale = record("r1", "1.2.3.4");
        stale.ttl = Some(300);
        let plan = ReplacementPlan::build(&[stale], &change(&["1.2.3.4"]));
        assert_eq!(
            plan.ops,
            vec![RecordOp::Overwrite {
                id: "r1".into(),
                content: "1.2.3.4".into()
            }]
        );
    }

    #[test]
    fn test_plan_ignores_listing_order() {
        let forward = [record("r1", "9.9.9.9"), record("r2", "8.8.8.8")];
        let backward = [record("r2", "8.8.8.8"), record("r1", "9.9.9.9")];
        let wanted = change(&["1.2.3.4"]);
        assert_eq!(
            ReplacementPlan::build(&forward, &wanted),
            ReplacementPlan::build(&backward, &wanted)
        );
    }
}
