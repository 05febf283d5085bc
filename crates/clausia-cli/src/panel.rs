//! The matter intelligence panel: obligations, prevailing terms and the
//! clause timeline, read concurrently.
//!
//! Each read runs on its own blocking task over a cloned connection. The
//! panel is built only when all three succeed; the first failure fails it.

use std::future::Future;

use anyhow::Context;
use clausia_core::{
    Obligation, PrevailingOutcome, RelationshipScope, TimelineEntry, clause_evolution,
    resolve_prevailing_terms,
};
use clausia_store::{DuckStore, StoreError};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct Panel {
    pub obligations: Vec<Obligation>,
    pub prevailing: PrevailingOutcome,
    pub timeline: Vec<TimelineEntry>,
}

pub async fn load_panel(
    store: &DuckStore,
    matter_id: &str,
    tenant_id: &str,
    scope: RelationshipScope,
    clause_type: &str,
) -> anyhow::Result<Panel> {
    let (matter, tenant, kind) = (matter_id.to_string(), tenant_id.to_string(), clause_type.to_string());

    let obligations = on_clone(store, "obligations", {
        let (matter, tenant) = (matter.clone(), tenant.clone());
        move |s| s.list_obligations_by_matter(&matter, &tenant)
    });
    let prevailing = on_clone(store, "prevailing terms", {
        let (matter, tenant) = (matter.clone(), tenant.clone());
        move |s| resolve_prevailing_terms(s, &matter, &tenant, scope)
    });
    let timeline = on_clone(store, "clause timeline", move |s| {
        clause_evolution(s, &matter, &tenant, &kind)
    });

    let (obligations, prevailing, timeline) = futures::try_join!(obligations, prevailing, timeline)?;
    debug!(
        matter_id,
        obligations = obligations.len(),
        timeline = timeline.len(),
        "panel loaded"
    );
    Ok(Panel {
        obligations,
        prevailing,
        timeline,
    })
}

/// Run `read` on a blocking task against a fresh handle to the same database.
fn on_clone<T, F>(
    store: &DuckStore,
    what: &'static str,
    read: F,
) -> impl Future<Output = anyhow::Result<T>>
where
    T: Send + 'static,
    F: FnOnce(&DuckStore) -> Result<T, StoreError> + Send + 'static,
{
    let handle = store.try_clone();
    async move {
        let handle = handle.with_context(|| format!("opening connection for {what}"))?;
        let value = tokio::task::spawn_blocking(move || read(&handle))
            .await
            .with_context(|| format!("{what} task"))?
            .with_context(|| format!("loading {what}"))?;
        Ok(value)
    }
}
