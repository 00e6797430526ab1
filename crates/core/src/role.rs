//! # Role Module
//!
//! Ba vai trò của portal, mỗi vai trò có bảng riêng trong DB:
//! - Resident: cư dân - nộp request, report, comment, vote
//! - Secretary: thư ký - duyệt request, quản lý sanctions, đăng updates
//! - Treasurer: thủ quỹ - receipts, báo cáo tài chính

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of account kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Resident,
    Secretary,
    Treasurer,
}

impl Role {
    /// Thứ tự tìm kiếm khi login / kiểm tra email trùng
    pub const ALL: [Role; 3] = [Role::Resident, Role::Secretary, Role::Treasurer];

    /// Trả về code string (cũng là path prefix của HTTP routes)
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Resident => "resident",
            Role::Secretary => "secretary",
            Role::Treasurer => "treasurer",
        }
    }

    /// Parse từ string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "resident" => Some(Role::Resident),
            "secretary" => Some(Role::Secretary),
            "treasurer" => Some(Role::Treasurer),
            _ => None,
        }
    }

    /// Staff roles act on other people's rows
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Secretary | Role::Treasurer)
    }

    /// Landing page after login
    pub fn dashboard_path(&self) -> String {
        format!("/{}/dashboard", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated principal behind a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn resident(id: i64) -> Self {
        Self::new(id, Role::Resident)
    }

    pub fn secretary(id: i64) -> Self {
        Self::new(id, Role::Secretary)
    }

    pub fn treasurer(id: i64) -> Self {
        Self::new(id, Role::Treasurer)
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.role, self.id)
    }
}
