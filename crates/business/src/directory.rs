//! Directory - resident and staff listings for dashboards

use crate::error::BusinessResult;
use crate::services::ServiceContext;
use anyhow::Context;
use barangay_core::text;
use barangay_persistence::{ActiveStaffRow, ResidentRepo, ResidentRow, StaffRepo};
use chrono::{DateTime, Timelike, Utc};

/// Resident listing filter by online state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidentFilter {
    #[default]
    All,
    Online,
    Offline,
}

impl ResidentFilter {
    /// "Online" / "Offline"; anything else (including "Default") lists all
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("Online") => ResidentFilter::Online,
            Some("Offline") => ResidentFilter::Offline,
            _ => ResidentFilter::All,
        }
    }

    fn is_active(&self) -> Option<bool> {
        match self {
            ResidentFilter::All => None,
            ResidentFilter::Online => Some(true),
            ResidentFilter::Offline => Some(false),
        }
    }
}

pub struct DirectoryService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DirectoryService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn residents(&self, filter: ResidentFilter) -> BusinessResult<Vec<ResidentRow>> {
        let rows = ResidentRepo::list(self.ctx.pool(), filter.is_active())
            .await
            .context("Failed to list residents")?;
        Ok(rows)
    }

    /// Secretaries and treasurers currently online
    pub async fn active_staff(&self) -> BusinessResult<Vec<ActiveStaffRow>> {
        let rows = StaffRepo::active_staff(self.ctx.pool())
            .await
            .context("Failed to list active staff")?;
        Ok(rows)
    }
}

/// Dashboard greeting for a point in time
pub fn greeting_at(now: DateTime<Utc>) -> &'static str {
    text::greeting(now.hour())
}
