use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::workflow::Actor;

/// Account roles. Stored in `users.role`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    OrderCreator,
    OrderApprover,
    Manufacturer,
    ManufacturerTeamMember,
    SubManufacturer,
    Client,
    Warehouse,
    ManufacturerInventoryManager,
}

impl Role {
    /// The routing party this role acts as, if any.
    pub fn actor(&self) -> Option<Actor> {
        match self {
            Role::SuperAdmin | Role::Admin | Role::OrderCreator | Role::OrderApprover => {
                Some(Actor::Admin)
            }
            Role::Manufacturer | Role::ManufacturerTeamMember | Role::SubManufacturer => {
                Some(Actor::Manufacturer)
            }
            Role::Client => Some(Actor::Client),
            Role::Warehouse | Role::ManufacturerInventoryManager => None,
        }
    }

    /// Whose view of an order this role gets. Manufacturer-side roles that cannot route
    /// still see only the manufacturer's side; `None` is the unfiltered view.
    pub fn viewer(&self) -> Option<Actor> {
        match self.actor() {
            None if self.is_manufacturer_side() => Some(Actor::Manufacturer),
            actor => actor,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.actor(), Some(Actor::Admin))
    }

    /// Roles allowed to manage user accounts.
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    pub fn can_create_orders(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin | Role::OrderCreator)
    }

    /// Roles scoped to a single manufacturer's data.
    pub fn is_manufacturer_side(&self) -> bool {
        matches!(
            self,
            Role::Manufacturer
                | Role::ManufacturerTeamMember
                | Role::SubManufacturer
                | Role::ManufacturerInventoryManager
        )
    }

    pub fn can_manage_inventory(&self) -> bool {
        self.is_admin() || self.is_manufacturer_side()
    }
}
