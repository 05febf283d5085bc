//! Resolved runtime configuration: open stores and caller identity.

use anyhow::Context;
use clausia_ai::{BackendClient, IngestionQueue};
use clausia_core::{Principal, RelationshipScope};
use clausia_store::{DuckStore, FileVault};
use tracing::debug;

use crate::cli::Cli;

pub struct Workspace {
    pub store: DuckStore,
    pub vault: FileVault,
    pub principal: Principal,
    pub scope: RelationshipScope,
    pub backend_url: String,
    pub json: bool,
}

impl Workspace {
    /// Open the database (creating tables on first use) and the file vault.
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let store = DuckStore::open_persistent(&cli.db)
            .with_context(|| format!("opening database {}", cli.db.display()))?;
        store.ensure_schema().context("creating tables")?;
        let vault = FileVault::open(&cli.files)
            .with_context(|| format!("opening file vault {}", cli.files.display()))?;
        debug!(db = %cli.db.display(), files = %cli.files.display(), "workspace open");

        Ok(Self {
            store,
            vault,
            principal: Principal::new(cli.user.clone(), cli.org.clone()),
            scope: cli.scope,
            backend_url: cli.backend_url.clone(),
            json: cli.json,
        })
    }

    /// The caller's tenant id.
    pub fn tenant(&self) -> anyhow::Result<String> {
        let tenant = self
            .principal
            .tenant_id()
            .context("no acting user: pass --user or set CLAUSIA_USER")?;
        Ok(tenant.to_string())
    }

    pub fn backend(&self) -> BackendClient {
        BackendClient::new(self.backend_url.clone())
    }

    pub fn ingestion_queue(&self) -> IngestionQueue<BackendClient> {
        IngestionQueue::new(self.backend())
    }
}
