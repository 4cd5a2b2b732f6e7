//! Left-outer join of the enrichment extracts onto the JAR record set.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::{CapitalRecord, JarRecord, MergedRow, PvmRecord};

/// Counters reported for every merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub primary_rows: usize,
    pub primary_without_name: usize,
    pub primary_duplicates: usize,
    pub pvm_matched: usize,
    pub pvm_unmatched: usize,
    pub capital_matched: usize,
    pub capital_unmatched: usize,
}

#[derive(Debug)]
pub struct MergeOutcome {
    pub rows: Vec<MergedRow>,
    pub stats: MergeStats,
}

/// Anything keyed by company code.
trait Keyed {
    fn code(&self) -> &str;
}

impl Keyed for JarRecord {
    fn code(&self) -> &str {
        &self.code
    }
}

impl Keyed for PvmRecord {
    fn code(&self) -> &str {
        &self.code
    }
}

impl Keyed for CapitalRecord {
    fn code(&self) -> &str {
        &self.code
    }
}

/// Index by code; later occurrences replace earlier ones.
fn last_wins<T: Keyed>(records: Vec<T>) -> HashMap<String, T> {
    let mut by_code = HashMap::with_capacity(records.len());
    for record in records {
        by_code.insert(record.code().to_string(), record);
    }
    by_code
}

/// Drops nameless rows and collapses duplicate codes. A duplicate keeps the
/// position of the code's first occurrence and the values of its last.
fn primary_rows(jar: Vec<JarRecord>, stats: &mut MergeStats) -> Vec<JarRecord> {
    let mut rows: Vec<JarRecord> = Vec::with_capacity(jar.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(jar.len());

    for record in jar {
        if record.name.is_none() {
            stats.primary_without_name += 1;
            continue;
        }
        match positions.get(&record.code) {
            Some(&idx) => {
                stats.primary_duplicates += 1;
                rows[idx] = record;
            }
            None => {
                positions.insert(record.code.clone(), rows.len());
                rows.push(record);
            }
        }
    }

    rows
}

/// Joins enrichment onto `jar`. `None` means the source was unavailable this
/// run; its columns stay null for every row.
pub fn merge(
    jar: Vec<JarRecord>,
    pvm: Option<Vec<PvmRecord>>,
    capital: Option<Vec<CapitalRecord>>,
) -> MergeOutcome {
    let mut stats = MergeStats::default();
    let primary = primary_rows(jar, &mut stats);
    stats.primary_rows = primary.len();

    let mut pvm = pvm.map(last_wins).unwrap_or_default();
    let mut capital = capital.map(last_wins).unwrap_or_default();

    let rows: Vec<MergedRow> = primary
        .into_iter()
        .map(|jar| {
            let pvm = pvm.remove(&jar.code);
            let capital = capital.remove(&jar.code);
            if pvm.is_some() {
                stats.pvm_matched += 1;
            }
            if capital.is_some() {
                stats.capital_matched += 1;
            }
            MergedRow { jar, pvm, capital }
        })
        .collect();

    // Whatever was not claimed by a JAR row has no company to attach to.
    stats.pvm_unmatched = pvm.len();
    stats.capital_unmatched = capital.len();

    tracing::info!(
        rows = stats.primary_rows,
        pvm_matched = stats.pvm_matched,
        capital_matched = stats.capital_matched,
        "merged sources"
    );
    if stats.pvm_unmatched > 0 || stats.capital_unmatched > 0 {
        tracing::info!(
            pvm_unmatched = stats.pvm_unmatched,
            capital_unmatched = stats.capital_unmatched,
            "dropped enrichment rows without a JAR company"
        );
    }
    if stats.primary_without_name > 0 || stats.primary_duplicates > 0 {
        tracing::warn!(
            without_name = stats.primary_without_name,
            duplicates = stats.primary_duplicates,
            "JAR rows dropped or collapsed"
        );
    }

    MergeOutcome { rows, stats }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar(code: &str, name: &str) -> JarRecord {
        JarRecord {
            code: code.to_string(),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn pvm(code: &str, pvm_code: &str) -> PvmRecord {
        PvmRecord {
            code: code.to_string(),
            pvm_code: Some(pvm_code.to_string()),
            pvm_date: None,
        }
    }

    fn capital(code: &str, amount: &str) -> CapitalRecord {
        CapitalRecord {
            code: code.to_string(),
            amount: Some(amount.to_string()),
            currency: None,
        }
    }

    #[test]
    fn test_primary_only_keeps_every_row() {
        let outcome = merge(vec![jar("1", "A"), jar("2", "B"), jar("3", "C")], None, None);
        assert_eq!(outcome.rows.len(), 3);
        assert!(outcome
            .rows
            .iter()
            .all(|row| row.pvm.is_none() && row.capital.is_none()));
    }

    #[test]
    fn test_left_join_on_code() {
        let outcome = merge(
            vec![jar("1", "A"), jar("2", "B")],
            Some(vec![pvm("2", "LT2")]),
            Some(vec![capital("1", "100")]),
        );

        let first = &outcome.rows[0];
        assert_eq!(first.jar.code, "1");
        assert!(first.pvm.is_none());
        assert_eq!(first.capital.as_ref().unwrap().amount.as_deref(), Some("100"));

        let second = &outcome.rows[1];
        assert_eq!(second.pvm.as_ref().unwrap().pvm_code.as_deref(), Some("LT2"));
        assert!(second.capital.is_none());

        assert_eq!(outcome.stats.pvm_matched, 1);
        assert_eq!(outcome.stats.capital_matched, 1);
    }

    #[test]
    fn test_secondary_duplicates_last_wins() {
        let outcome = merge(
            vec![jar("1", "A")],
            Some(vec![pvm("1", "LT-OLD"), pvm("1", "LT-NEW")]),
            None,
        );
        assert_eq!(
            outcome.rows[0].pvm.as_ref().unwrap().pvm_code.as_deref(),
            Some("LT-NEW")
        );
    }

    #[test]
    fn test_secondary_rows_cannot_add_companies() {
        let outcome = merge(
            vec![jar("1", "A")],
            Some(vec![pvm("1", "LT1"), pvm("999", "LT999")]),
            Some(vec![capital("998", "5")]),
        );
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.stats.pvm_unmatched, 1);
        assert_eq!(outcome.stats.capital_unmatched, 1);
    }

    #[test]
    fn test_empty_secondary_behaves_like_absent() {
        let outcome = merge(vec![jar("1", "A")], Some(vec![]), Some(vec![]));
        assert!(outcome.rows[0].pvm.is_none());
        assert!(outcome.rows[0].capital.is_none());
    }

    #[test]
    fn test_primary_duplicates_collapse_in_place() {
        let outcome = merge(
            vec![jar("1", "Old"), jar("2", "B"), jar("1", "New")],
            None,
            None,
        );
        let codes: Vec<_> = outcome.rows.iter().map(|r| r.jar.code.as_str()).collect();
        assert_eq!(codes, vec!["1", "2"]);
        assert_eq!(outcome.rows[0].jar.name.as_deref(), Some("New"));
        assert_eq!(outcome.stats.primary_duplicates, 1);
    }

    #[test]
    fn test_nameless_primary_rows_dropped() {
        let mut nameless = jar("2", "x");
        nameless.name = None;
        let outcome = merge(vec![jar("1", "A"), nameless], None, None);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.stats.primary_without_name, 1);
        assert_eq!(outcome.stats.primary_rows, 1);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let build = || {
            merge(
                vec![jar("3", "C"), jar("1", "A"), jar("2", "B")],
                Some(vec![pvm("1", "LT1"), pvm("3", "LT3")]),
                Some(vec![capital("2", "10")]),
            )
        };
        let baseline = build();
        for _ in 0..10 {
            let outcome = build();
            assert_eq!(baseline.rows, outcome.rows);
            assert_eq!(baseline.stats, outcome.stats);
        }
    }
}
