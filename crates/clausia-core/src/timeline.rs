//! Clause evolution timeline: how one clause type changed across a matter's
//! documents, newest first.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::MatterClause;
use crate::source::MatterSource;

/// Clause type shown when the caller does not ask for one.
pub const DEFAULT_CLAUSE_TYPE: &str = "Indemnity";

/// Longest document title shown as a badge before it is cut.
pub const BADGE_CHARS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// "2021 Original", "2022 Version" or "2024 Update (Current)".
    pub label: String,
    pub badge: String,
    pub text: String,
    pub is_current: bool,
}

/// Build display entries from matching clauses.
///
/// Clauses are ordered by owning-document creation time (stable, so equal
/// timestamps keep their input order), labelled, and returned newest first.
pub fn build_timeline(mut clauses: Vec<MatterClause>) -> Vec<TimelineEntry> {
    clauses.sort_by_key(|c| c.document_created_at);
    let last = clauses.len().saturating_sub(1);

    let mut entries: Vec<TimelineEntry> = clauses
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let year = row.document_created_at.year();
            let is_current = index == last;
            // "Current" is applied after "Original" so a lone clause reads as current.
            let mut label = format!("{year} Version");
            if index == 0 {
                label = format!("{year} Original");
            }
            if is_current {
                label = format!("{year} Update (Current)");
            }
            TimelineEntry {
                label,
                badge: badge(&row.document_title),
                text: row.clause.original_text,
                is_current,
            }
        })
        .collect();

    entries.reverse();
    entries
}

/// Document title cut to [`BADGE_CHARS`] characters with a trailing ellipsis.
pub fn badge(title: &str) -> String {
    let title = if title.trim().is_empty() { "Contract" } else { title };
    if title.chars().count() > BADGE_CHARS {
        let head: String = title.chars().take(BADGE_CHARS).collect();
        format!("{head}…")
    } else {
        title.to_string()
    }
}

/// Fetch clauses matching `clause_type` for a matter and build its timeline.
pub fn clause_evolution<S: MatterSource>(
    source: &S,
    matter_id: &str,
    tenant_id: &str,
    clause_type: &str,
) -> Result<Vec<TimelineEntry>, S::Error> {
    let rows = source.list_clauses_by_type_for_matter(matter_id, tenant_id, clause_type)?;
    tracing::debug!(matter_id, clause_type, matches = rows.len(), "clause evolution");
    Ok(build_timeline(rows))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::Clause;
    use crate::genealogy::fixtures::{at, doc};
    use crate::source::memory::MemorySource;

    fn row(title: &str, year: i32, text: &str) -> MatterClause {
        let created = Utc.with_ymd_and_hms(year, 3, 1, 9, 0, 0).unwrap();
        MatterClause {
            clause: Clause {
                id: format!("{title}-{year}"),
                document_id: title.into(),
                tenant_id: "t1".into(),
                clause_type: "Indemnity".into(),
                original_text: text.into(),
                summary: None,
                extracted_at: created,
            },
            document_title: title.into(),
            document_created_at: created,
        }
    }

    #[test]
    fn newest_first_with_single_current() {
        let entries = build_timeline(vec![
            row("MSA", 2021, "v1"),
            row("Amendment 1", 2022, "v2"),
            row("Amendment 2", 2024, "v3"),
        ]);
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["2024 Update (Current)", "2022 Version", "2021 Original"]
        );
        assert!(entries[0].is_current);
        assert!(entries[1..].iter().all(|e| !e.is_current));
        assert_eq!(entries.iter().filter(|e| e.label.contains("Original")).count(), 1);
        assert_eq!(entries[0].text, "v3");
    }

    #[test]
    fn unsorted_input_is_ordered_by_document_date() {
        let entries = build_timeline(vec![row("B", 2023, "later"), row("A", 2020, "earlier")]);
        assert_eq!(entries[0].text, "later");
        assert_eq!(entries[1].label, "2020 Original");
    }

    #[test]
    fn single_match_is_current_not_original() {
        let entries = build_timeline(vec![row("MSA", 2021, "only")]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "2021 Update (Current)");
        assert!(entries[0].is_current);
    }

    #[test]
    fn no_matches_is_empty() {
        assert!(build_timeline(Vec::new()).is_empty());
    }

    #[test]
    fn badge_truncates_long_titles() {
        assert_eq!(badge("Master Services Agreement.pdf"), "Master Servi…");
        assert_eq!(badge("NDA.pdf"), "NDA.pdf");
        assert_eq!(badge("exactly12chr"), "exactly12chr");
        assert_eq!(badge(""), "Contract");
    }

    #[test]
    fn clause_evolution_filters_by_type_substring() {
        let mut s = MemorySource {
            documents: vec![doc("a", "MSA", "MSA", 0), doc("b", "Amendment", "Amendment", 400)],
            ..Default::default()
        };
        let c = |d: &str, kind: &str, text: &str| Clause {
            id: format!("{d}{kind}"),
            document_id: d.into(),
            tenant_id: "t1".into(),
            clause_type: kind.into(),
            original_text: text.into(),
            summary: None,
            extracted_at: at(0),
        };
        s.clauses.insert("a".into(), vec![c("a", "Mutual Indemnity", "one"), c("a", "Termination", "x")]);
        s.clauses.insert("b".into(), vec![c("b", "INDEMNITY", "two")]);

        let entries = clause_evolution(&s, "m1", "t1", "indemnity").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "two");
        assert_eq!(entries[0].label, "2023 Update (Current)");
        assert_eq!(entries[1].label, "2022 Original");
    }
}
