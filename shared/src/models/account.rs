//! Account model - identity resolution for priority flags and audit stamps

use crate::order::status::ActorRole;
use serde::{Deserialize, Serialize};

/// A registered account (staff or customer)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: ActorRole,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub is_teacher: bool,
    #[serde(default)]
    pub is_blacklisted: bool,
}

impl Account {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            phone: None,
            role,
            is_vip: false,
            is_teacher: false,
            is_blacklisted: false,
        }
    }
}
