//! `barangay add-staff`

use crate::db;
use anyhow::Result;
use barangay_business::{AuthService, ServiceContext};
use barangay_config::PortalConfig;
use barangay_core::Role;

pub async fn add_staff(
    config: &PortalConfig,
    role: Role,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let db = db::connect(config).await?;
    let ctx = ServiceContext::with_settings(&db, db::service_settings(config));

    let id = AuthService::new(&ctx)
        .create_staff(role, username, email, password)
        .await?;
    println!("✅ Created {} account #{} ({})", role, id, username);

    db.close().await;
    Ok(())
}
