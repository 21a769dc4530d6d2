use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{DomainError, DomainResult, HubId, TenantId};

/// A warehouse / fulfillment location and the person managing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub tenant_id: TenantId,
    pub manager_name: String,
    pub manager_contact: Option<String>,
    pub manager_email: String,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHub {
    pub tenant_id: TenantId,
    pub manager_name: String,
    #[serde(default)]
    pub manager_contact: Option<String>,
    pub manager_email: String,
}

impl Hub {
    /// Validate `input` and mint a hub with a fresh identifier.
    pub fn create(input: NewHub, now: DateTime<Utc>) -> DomainResult<Self> {
        Self::create_with_id(HubId::generate(), input, now)
    }

    /// Like [`Hub::create`] but with a caller-chosen identifier.
    pub fn create_with_id(id: HubId, input: NewHub, now: DateTime<Utc>) -> DomainResult<Self> {
        let manager_name = input.manager_name.trim();
        let manager_email = input.manager_email.trim();

        if manager_name.is_empty() || manager_email.is_empty() {
            return Err(DomainError::validation("manager email and name are required"));
        }

        let manager_contact = input
            .manager_contact
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            id,
            tenant_id: input.tenant_id,
            manager_name: manager_name.to_string(),
            manager_contact,
            manager_email: manager_email.to_string(),
            created_at: now,
        })
    }
}
