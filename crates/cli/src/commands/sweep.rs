//! `barangay sweep`

use crate::db;
use anyhow::Result;
use barangay_business::{SanctionService, ServiceContext};
use barangay_config::PortalConfig;

pub async fn run(config: &PortalConfig) -> Result<()> {
    let db = db::connect(config).await?;
    let ctx = ServiceContext::with_settings(&db, db::service_settings(config));

    let deleted = SanctionService::new(&ctx).expire_sanctions().await?;
    println!("🧹 Removed {} expired sanction(s)", deleted);

    db.close().await;
    Ok(())
}
