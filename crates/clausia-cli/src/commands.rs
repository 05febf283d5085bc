//! Command dispatch.

use anyhow::Context;
use chrono::Local;
use clausia_core::{NewMatter, build_graph, clause_evolution, resolve_prevailing_terms};
use clausia_store::FileVault;
use tracing::{info, warn};

use crate::cli::{Cli, Command, DocCommand, MatterCommand, NoteCommand};
use crate::config::Workspace;
use crate::display;
use crate::panel::load_panel;
use crate::upload::{UploadRequest, upload};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ws = Workspace::open(&cli)?;
    match cli.command {
        Command::Matter(cmd) => matter(&ws, cmd),
        Command::Doc(cmd) => doc(&ws, cmd).await,
        Command::Genealogy { matter } => {
            let tenant = ws.tenant()?;
            let docs = ws.store.list_documents(&matter, &tenant)?;
            let rels = ws.scope.apply(&docs, ws.store.list_relationships(&tenant)?);
            let graph = build_graph(&docs, &rels);
            if ws.json {
                display::print_json(&graph)
            } else {
                display::print_graph(&graph);
                Ok(())
            }
        }
        Command::Prevailing { matter } => {
            let tenant = ws.tenant()?;
            let outcome = resolve_prevailing_terms(&ws.store, &matter, &tenant, ws.scope)
                .context("resolving prevailing terms")?;
            if ws.json {
                display::print_json(&outcome)
            } else {
                display::print_prevailing(&outcome);
                Ok(())
            }
        }
        Command::Timeline { matter, clause_type } => {
            let tenant = ws.tenant()?;
            let entries = clause_evolution(&ws.store, &matter, &tenant, &clause_type)
                .context("building clause timeline")?;
            if ws.json {
                display::print_json(&entries)
            } else {
                display::print_timeline(&clause_type, &entries);
                Ok(())
            }
        }
        Command::Obligations { matter } => {
            let tenant = ws.tenant()?;
            let obligations = ws.store.list_obligations_by_matter(&matter, &tenant)?;
            if ws.json {
                display::print_json(&obligations)
            } else {
                display::print_obligations(&obligations, Local::now().date_naive());
                Ok(())
            }
        }
        Command::Panel { matter, clause_type } => {
            let tenant = ws.tenant()?;
            let panel = load_panel(&ws.store, &matter, &tenant, ws.scope, &clause_type).await?;
            if ws.json {
                display::print_json(&panel)
            } else {
                display::print_panel(&panel, &clause_type, Local::now().date_naive());
                Ok(())
            }
        }
        Command::Note(cmd) => note(&ws, cmd),
        Command::Chat { question } => {
            let tenant = ws.tenant()?;
            let answer = ws
                .backend()
                .chat(&question, &tenant)
                .await
                .with_context(|| format!("asking {}", ws.backend_url))?;
            if ws.json {
                display::print_json(&answer)
            } else {
                display::print_chat(&answer);
                Ok(())
            }
        }
        Command::Import { dir } => {
            ws.store
                .load_all(&dir)
                .with_context(|| format!("importing from {}", dir.display()))?;
            stats(&ws)
        }
        Command::Export { dir } => {
            ws.store
                .export_all(&dir)
                .with_context(|| format!("exporting to {}", dir.display()))?;
            println!("Exported to {}", dir.display());
            Ok(())
        }
        Command::Stats => stats(&ws),
        Command::Query { sql } => {
            let batches = ws.store.query_arrow(&sql)?;
            display::print_batches(&batches)
        }
    }
}

fn matter(ws: &Workspace, cmd: MatterCommand) -> anyhow::Result<()> {
    let tenant = ws.tenant()?;
    match cmd {
        MatterCommand::Create(args) => {
            let matter = ws.store.create_matter(
                &tenant,
                &NewMatter {
                    title: args.title,
                    description: args.description,
                    practice_area: args.practice_area,
                    client_name: args.client,
                },
            )?;
            if ws.json {
                display::print_json(&matter)
            } else {
                println!("Created matter {} ({})", matter.id, matter.title);
                Ok(())
            }
        }
        MatterCommand::List => {
            let matters = ws.store.list_matters(&tenant)?;
            if ws.json {
                display::print_json(&matters)
            } else {
                display::print_matters(&matters);
                Ok(())
            }
        }
        MatterCommand::Delete { id } => {
            let removed = ws.store.delete_matter(&id, &tenant)?;
            for doc in &removed {
                remove_stored_file(&ws.vault, doc.file_path.as_deref());
            }
            info!(matter_id = %id, documents = removed.len(), "matter deleted");
            println!("Deleted matter {id} and {} documents", removed.len());
            Ok(())
        }
        MatterCommand::Conflicts { client } => {
            let matches = ws.store.search_client_conflicts(&tenant, &client)?;
            if ws.json {
                display::print_json(&matches)
            } else {
                display::print_conflicts(&client, &matches);
                Ok(())
            }
        }
    }
}

async fn doc(ws: &Workspace, cmd: DocCommand) -> anyhow::Result<()> {
    let tenant = ws.tenant()?;
    match cmd {
        DocCommand::Upload(args) => {
            let queue = (!args.no_ingest).then(|| ws.ingestion_queue());
            let req = UploadRequest {
                matter_id: &args.matter,
                path: &args.path,
                title: args.title.clone(),
                category: args.category.clone(),
                parent_id: args.parent.clone(),
                relationship_type: args.relationship.clone(),
            };
            let outcome = upload(&ws.store, &ws.vault, queue.as_ref(), &tenant, req).await?;
            if ws.json {
                display::print_json(&outcome)
            } else {
                display::print_upload(&outcome);
                Ok(())
            }
        }
        DocCommand::List { matter } => {
            let docs = ws.store.list_documents(&matter, &tenant)?;
            if ws.json {
                display::print_json(&docs)
            } else {
                display::print_documents(&docs);
                Ok(())
            }
        }
        DocCommand::Link { parent, child, relationship } => {
            let rel = ws.store.link_documents(&tenant, &parent, &child, &relationship)?;
            if ws.json {
                display::print_json(&rel)
            } else {
                println!("Linked {child} to parent {parent} ({})", rel.relationship_type);
                Ok(())
            }
        }
        DocCommand::Delete { id } => {
            let doc = ws.store.delete_document(&id, &tenant)?;
            remove_stored_file(&ws.vault, doc.file_path.as_deref());
            println!("Deleted {} ({})", doc.title, doc.id);
            Ok(())
        }
    }
}

fn note(ws: &Workspace, cmd: NoteCommand) -> anyhow::Result<()> {
    let tenant = ws.tenant()?;
    match cmd {
        NoteCommand::Add { document, quote, comment, position } => {
            let position: serde_json::Value =
                serde_json::from_str(&position).context("--position must be JSON")?;
            let note = ws.store.create_note(&tenant, &document, &quote, &comment, position)?;
            if ws.json {
                display::print_json(&note)
            } else {
                println!("Added note {}", note.id);
                Ok(())
            }
        }
        NoteCommand::List { document } => {
            let notes = ws.store.list_notes(&document, &tenant)?;
            if ws.json {
                display::print_json(&notes)
            } else {
                display::print_notes(&notes);
                Ok(())
            }
        }
    }
}

fn stats(ws: &Workspace) -> anyhow::Result<()> {
    let counts = ws.store.table_counts()?;
    if ws.json {
        let map: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(t, n)| (t.to_string(), (*n).into()))
            .collect();
        display::print_json(&map)
    } else {
        display::print_stats(&counts);
        Ok(())
    }
}

/// The database row is already gone; a file left behind is only logged.
fn remove_stored_file(vault: &FileVault, path: Option<&str>) {
    if let Some(path) = path
        && let Err(e) = vault.remove(path)
    {
        warn!(path, error = %e, "stored file not removed");
    }
}
