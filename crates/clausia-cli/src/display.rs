//! Text rendering for command output.
//!
//! Every command can instead print its result as JSON (`--json`); these
//! functions cover the human-readable form.

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use clausia_ai::ChatAnswer;
use clausia_core::graph::{GraphNode, NodeData};
use clausia_core::{
    Document, DueDisplay, GenealogyGraph, Matter, Note, Obligation, PrevailingOutcome,
    TimelineEntry,
};
use serde::Serialize;

use crate::panel::Panel;
use crate::upload::{IngestionResult, UploadOutcome};

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_batches(batches: &[RecordBatch]) -> anyhow::Result<()> {
    println!("{}", arrow::util::pretty::pretty_format_batches(batches)?);
    Ok(())
}

// ── Matters ──

pub fn print_matters(matters: &[Matter]) {
    if matters.is_empty() {
        println!("No matters.");
        return;
    }
    for m in matters {
        println!("{}  {}", m.id, m.title);
        println!("  {:<14} {}", "client", m.client_name);
        println!("  {:<14} {}", "practice area", m.practice_area);
        println!("  {:<14} {}", "status", m.status);
        if !m.description.is_empty() {
            println!("  {:<14} {}", "description", m.description);
        }
    }
}

pub fn print_conflicts(client: &str, matters: &[Matter]) {
    if matters.is_empty() {
        println!("No existing matters for \"{client}\".");
        return;
    }
    println!("Possible conflicts for \"{client}\":");
    for m in matters {
        println!("  {:<38} {} ({})", m.id, m.client_name, m.title);
    }
}

// ── Documents ──

pub fn print_documents(docs: &[Document]) {
    if docs.is_empty() {
        println!("No documents.");
        return;
    }
    for d in docs {
        let risk = d.risk_level.map(|r| r.as_str()).unwrap_or("-");
        let value = d.contract_value.as_deref().unwrap_or("-");
        println!(
            "{}  {:<38} {:<32} {:<14} risk {:<7} value {}",
            d.created_at.format("%Y-%m-%d"),
            d.id,
            d.title,
            d.category,
            risk,
            value
        );
    }
}

pub fn print_upload(outcome: &UploadOutcome) {
    let d = &outcome.document;
    println!("Uploaded {} as {}", d.title, d.id);
    if let Some(rel) = &outcome.relationship {
        println!("  linked to parent {} ({})", rel.parent_id, rel.relationship_type);
    }
    match &outcome.ingestion {
        IngestionResult::Skipped => println!("  ingestion skipped"),
        IngestionResult::Applied { clauses, obligations } => {
            println!("  ingested: {clauses} clauses, {obligations} obligations");
            if let Some(risk) = d.risk_level {
                println!("  risk {risk}");
            }
        }
        IngestionResult::Failed { error } => println!("  ingestion failed: {error}"),
    }
}

// ── Genealogy ──

pub fn print_graph(graph: &GenealogyGraph) {
    if graph.is_empty() {
        println!("No documents in this matter.");
        return;
    }
    let (roots, children): (Vec<&GraphNode>, Vec<&GraphNode>) = graph
        .nodes()
        .iter()
        .partition(|n| matches!(n.data, NodeData::Parent { .. }));

    println!("Parent contracts");
    for node in roots {
        if let NodeData::Parent { category, title, deal_value, liability_cap } = &node.data {
            println!("  {:<38} {title} [{category}]", node.id);
            println!("  {:<38} value {deal_value}, liability {liability_cap}", "");
        }
    }
    if !children.is_empty() {
        println!();
        println!("Descendants");
    }
    for node in children {
        if let NodeData::Child { category, title, status, value, progress, warning } = &node.data {
            let flag = if *warning { "  !high risk" } else { "" };
            let progress = progress.map(|p| format!(" {p}%")).unwrap_or_default();
            println!("  {:<38} {title} [{category}] {}{progress}{flag}", node.id, status.as_str());
            if !value.is_empty() {
                println!("  {:<38} value {value}", "");
            }
        }
    }
    if !graph.edges().is_empty() {
        println!();
        println!("Relationships");
        for e in graph.edges() {
            println!("  {} -> {} ({})", e.source, e.target, e.relationship_type);
        }
    }
}

// ── Prevailing terms and timeline ──

pub fn prevailing_lines(outcome: &PrevailingOutcome) -> Vec<String> {
    match outcome {
        PrevailingOutcome::InsufficientData => {
            vec!["Not enough linked documents to compare terms.".to_string()]
        }
        PrevailingOutcome::Harmonized => {
            vec!["No conflicts: the latest document agrees with its parent.".to_string()]
        }
        PrevailingOutcome::Conflict(c) => vec![
            c.issue.clone(),
            c.description.clone(),
            format!("  {:<10} {}: {}", "was", c.parent_title, c.parent_text),
            format!("  {:<10} {}: {}", "now", c.child_title, c.child_text),
            format!("  {:<10} {}", "prevails", c.prevailing_title),
        ],
    }
}

pub fn print_prevailing(outcome: &PrevailingOutcome) {
    for line in prevailing_lines(outcome) {
        println!("{line}");
    }
}

pub fn print_timeline(clause_type: &str, entries: &[TimelineEntry]) {
    if entries.is_empty() {
        println!("No {clause_type} clauses in this matter.");
        return;
    }
    for e in entries {
        let marker = if e.is_current { "*" } else { " " };
        println!("{marker} {:<24} [{}]", e.label, e.badge);
        println!("    {}", e.text);
    }
}

// ── Obligations ──

pub fn obligation_line(o: &Obligation, today: NaiveDate) -> String {
    let due = DueDisplay::for_due_date(o.due_date, today)
        .map(|d| d.label)
        .unwrap_or_else(|| "No due date".to_string());
    let source = o.document_title.as_deref().unwrap_or("unknown document");
    format!("{due:<16} {} ({source}) [{}]", o.description, o.status)
}

pub fn print_obligations(obligations: &[Obligation], today: NaiveDate) {
    if obligations.is_empty() {
        println!("No obligations.");
        return;
    }
    for o in obligations {
        println!("{}", obligation_line(o, today));
    }
}

pub fn obligations_heading(obligations: &[Obligation]) -> String {
    let pending = obligations.iter().filter(|o| o.is_pending()).count();
    format!("== Obligations ({pending} pending of {}) ==", obligations.len())
}

pub fn print_panel(panel: &Panel, clause_type: &str, today: NaiveDate) {
    println!("{}", obligations_heading(&panel.obligations));
    print_obligations(&panel.obligations, today);
    println!();
    println!("== Prevailing terms ==");
    print_prevailing(&panel.prevailing);
    println!();
    println!("== {clause_type} timeline ==");
    print_timeline(clause_type, &panel.timeline);
}

// ── Notes and chat ──

pub fn print_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("No notes.");
        return;
    }
    for n in notes {
        println!("{}  \"{}\"", n.created_at.format("%Y-%m-%d %H:%M"), n.quote);
        println!("  {}", n.comment);
    }
}

pub fn print_chat(answer: &ChatAnswer) {
    println!("{}", answer.answer);
    if !answer.citations.is_empty() {
        println!();
        println!("Sources");
        for c in &answer.citations {
            println!("  {} ({})", c.file_name, c.contract_id);
        }
    }
}

pub fn print_stats(counts: &[(&str, usize)]) {
    for (table, count) in counts {
        println!("  {table:<24} {count}");
    }
}

#[cfg(test)]
mod tests {
    use clausia_core::ConflictReport;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn obligation_line_shows_urgency_and_source() {
        let mut o = Obligation {
            id: "o1".into(),
            tenant_id: "t1".into(),
            document_id: "d1".into(),
            description: "Deliver audit report".into(),
            due_date: Some(d(2025, 3, 1)),
            status: "pending".into(),
            document_title: Some("MSA".into()),
        };
        let today = d(2025, 3, 4);
        assert_eq!(
            obligation_line(&o, today),
            "Overdue by 3d    Deliver audit report (MSA) [pending]"
        );
        o.due_date = None;
        o.document_title = None;
        assert!(obligation_line(&o, today).starts_with("No due date"));
        assert!(obligation_line(&o, today).contains("(unknown document)"));
    }

    #[test]
    fn heading_counts_pending_obligations() {
        let mut o = Obligation {
            id: "o1".into(),
            tenant_id: "t1".into(),
            document_id: "d1".into(),
            description: "Renew insurance".into(),
            due_date: None,
            status: "pending".into(),
            document_title: None,
        };
        let mut done = o.clone();
        done.status = "completed".into();
        o.id = "o2".into();
        assert_eq!(obligations_heading(&[o, done]), "== Obligations (1 pending of 2) ==");
        assert_eq!(obligations_heading(&[]), "== Obligations (0 pending of 0) ==");
    }

    #[test]
    fn conflict_lines_name_the_prevailing_document() {
        let outcome = PrevailingOutcome::Conflict(ConflictReport {
            clause_type: "Liability".into(),
            issue: "Liability Terms".into(),
            description: "Specific terms in SOW override general terms in MSA.".into(),
            parent_title: "MSA".into(),
            parent_text: "capped at fees".into(),
            child_title: "SOW".into(),
            child_text: "uncapped".into(),
            prevailing_title: "SOW".into(),
        });
        let lines = prevailing_lines(&outcome);
        assert_eq!(lines[0], "Liability Terms");
        assert_eq!(lines.last().unwrap(), "  prevails   SOW");
    }

    #[test]
    fn insufficient_data_is_one_line() {
        assert_eq!(prevailing_lines(&PrevailingOutcome::InsufficientData).len(), 1);
    }
}
