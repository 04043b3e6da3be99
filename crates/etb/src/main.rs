use std::sync::Arc;

use tracing::warn;

use etb_core::{
    config::{Config, StorageBackend},
    dispatcher::Dispatcher,
    ledger::{memory::InMemoryLedger, LedgerStore},
};
use etb_postgres::PgLedger;

#[tokio::main]
async fn main() -> Result<(), etb_core::Error> {
    etb_core::logging::init("etb")?;

    let cfg = Arc::new(Config::load()?);

    let ledger: Arc<dyn LedgerStore> = match &cfg.storage {
        StorageBackend::Postgres {
            url,
            max_connections,
        } => Arc::new(PgLedger::connect(url, *max_connections).await?),
        StorageBackend::Memory => {
            warn!("DATABASE_URL=memory: entries are lost on restart");
            Arc::new(InMemoryLedger::new())
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(ledger, cfg.targets));

    etb_telegram::router::run(cfg, dispatcher)
        .await
        .map_err(|e| etb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
