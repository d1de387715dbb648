//! Order-product routing rules.
//!
//! Everything here is pure: given who is acting, what they asked for and the product's
//! current stage and location, [`plan_transition`] decides the resulting state and the
//! side effects the routing service has to persist. Nothing in this module touches the
//! database.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;
use utoipa::ToSchema;

/// Production stage of an order product (`order_products.product_status`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductStatus {
    Pending,
    PendingAdmin,
    InProduction,
    SampleRequested,
    PendingClientApproval,
    RevisionRequested,
    ClientApproved,
    Shipped,
    Completed,
}

/// Which party's queue a product currently sits in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoutedTo {
    Admin,
    Manufacturer,
    Client,
}

/// Party performing a routing action. Derived from the verified user role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Actor {
    Admin,
    Manufacturer,
    Client,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoutingAction {
    SendToProduction,
    RequestSample,
    SendForApproval,
    SendBackToManufacturer,
    MarkCompleted,
    SendToAdmin,
    InProduction,
    Shipped,
    Approve,
    RequestChanges,
}

/// Order-level status, rolled up from the statuses of its products.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    AwaitingClient,
    InProduction,
    Shipped,
    Completed,
}

/// Approval flag on an order item, kept separately for each side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl RoutingAction {
    /// The only party allowed to issue this action.
    pub fn actor(&self) -> Actor {
        match self {
            RoutingAction::SendToProduction
            | RoutingAction::RequestSample
            | RoutingAction::SendForApproval
            | RoutingAction::SendBackToManufacturer
            | RoutingAction::MarkCompleted => Actor::Admin,
            RoutingAction::SendToAdmin | RoutingAction::InProduction | RoutingAction::Shipped => {
                Actor::Manufacturer
            }
            RoutingAction::Approve | RoutingAction::RequestChanges => Actor::Client,
        }
    }

    /// `action_type` written to the audit log for this action.
    pub fn audit_action_type(&self) -> String {
        format!("product_routed_{self}")
    }
}

impl From<Actor> for RoutedTo {
    fn from(actor: Actor) -> Self {
        match actor {
            Actor::Admin => RoutedTo::Admin,
            Actor::Manufacturer => RoutedTo::Manufacturer,
            Actor::Client => RoutedTo::Client,
        }
    }
}

/// Audience-segmented notes column that receives a routing note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    AdminNotes,
    ManufacturerNotes,
    ClientNotes,
}

impl NoteField {
    pub fn for_destination(routed_to: RoutedTo) -> Self {
        match routed_to {
            RoutedTo::Admin => NoteField::AdminNotes,
            RoutedTo::Manufacturer => NoteField::ManufacturerNotes,
            RoutedTo::Client => NoteField::ClientNotes,
        }
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            NoteField::AdminNotes => "admin_notes",
            NoteField::ManufacturerNotes => "manufacturer_notes",
            NoteField::ClientNotes => "client_notes",
        }
    }
}

/// Where a product currently is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductState {
    pub status: ProductStatus,
    pub routed_to: RoutedTo,
}

/// Outcome of a valid routing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    pub action: RoutingAction,
    pub from: ProductState,
    pub to: ProductState,
    /// `Some(true)` when the transition locks the product.
    pub lock: Option<bool>,
    pub requires_sample: bool,
    pub requires_client_approval: bool,
    pub stamp_shipped_date: bool,
    /// Order-level `sample_routed_to` to set alongside the product update.
    pub sample_routed_to: Option<RoutedTo>,
    pub notify_order_creator: bool,
    /// Trimmed note and the column it is appended to.
    pub note: Option<(NoteField, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{actor} cannot perform {action}")]
    WrongActor { actor: Actor, action: RoutingAction },

    #[error("product is routed to {actual}, expected {expected}")]
    NotRoutedToActor { expected: RoutedTo, actual: RoutedTo },

    #[error("{action} is not allowed while product is {status}")]
    InvalidState {
        action: RoutingAction,
        status: ProductStatus,
    },

    #[error("{action} requires a note")]
    NoteRequired { action: RoutingAction },
}

impl TransitionError {
    /// Permission failures as opposed to workflow/validation failures.
    pub fn is_permission(&self) -> bool {
        matches!(self, TransitionError::WrongActor { .. })
    }
}

/// Decide the effect of `action` issued by `actor` on a product in state `current`.
pub fn plan_transition(
    actor: Actor,
    action: RoutingAction,
    current: ProductState,
    note: Option<&str>,
) -> Result<TransitionPlan, TransitionError> {
    if action.actor() != actor {
        return Err(TransitionError::WrongActor { actor, action });
    }

    let expected = RoutedTo::from(actor);
    if current.routed_to != expected {
        return Err(TransitionError::NotRoutedToActor {
            expected,
            actual: current.routed_to,
        });
    }

    if current.status == ProductStatus::Completed {
        return Err(TransitionError::InvalidState {
            action,
            status: current.status,
        });
    }

    let note = note.map(str::trim).filter(|n| !n.is_empty());

    let mut plan = TransitionPlan {
        action,
        from: current,
        to: current,
        lock: None,
        requires_sample: false,
        requires_client_approval: false,
        stamp_shipped_date: false,
        sample_routed_to: None,
        notify_order_creator: false,
        note: None,
    };

    let (status, routed_to) = match action {
        RoutingAction::SendToProduction => {
            plan.lock = Some(true);
            (ProductStatus::InProduction, RoutedTo::Manufacturer)
        }
        RoutingAction::RequestSample => {
            plan.requires_sample = true;
            plan.sample_routed_to = Some(RoutedTo::Manufacturer);
            (ProductStatus::SampleRequested, RoutedTo::Manufacturer)
        }
        RoutingAction::SendForApproval => {
            plan.requires_client_approval = true;
            (ProductStatus::PendingClientApproval, RoutedTo::Client)
        }
        RoutingAction::SendBackToManufacturer => {
            (ProductStatus::RevisionRequested, RoutedTo::Manufacturer)
        }
        RoutingAction::MarkCompleted => {
            if current.status != ProductStatus::Shipped {
                return Err(TransitionError::InvalidState {
                    action,
                    status: current.status,
                });
            }
            (ProductStatus::Completed, RoutedTo::Admin)
        }
        RoutingAction::SendToAdmin => {
            plan.notify_order_creator = true;
            (ProductStatus::PendingAdmin, RoutedTo::Admin)
        }
        RoutingAction::InProduction => {
            plan.lock = Some(true);
            (ProductStatus::InProduction, RoutedTo::Manufacturer)
        }
        RoutingAction::Shipped => {
            plan.stamp_shipped_date = true;
            (ProductStatus::Shipped, RoutedTo::Admin)
        }
        RoutingAction::Approve | RoutingAction::RequestChanges => {
            if current.status != ProductStatus::PendingClientApproval {
                return Err(TransitionError::InvalidState {
                    action,
                    status: current.status,
                });
            }
            if action == RoutingAction::RequestChanges && note.is_none() {
                return Err(TransitionError::NoteRequired { action });
            }
            plan.notify_order_creator = true;
            let status = if action == RoutingAction::Approve {
                ProductStatus::ClientApproved
            } else {
                ProductStatus::RevisionRequested
            };
            (status, RoutedTo::Admin)
        }
    };

    plan.to = ProductState { status, routed_to };
    plan.note = note.map(|n| (NoteField::for_destination(routed_to), n.to_string()));
    Ok(plan)
}

/// Stage a product is forced into when its lock flag flips to `locked`.
pub fn stage_for_lock(locked: bool) -> ProductStatus {
    if locked {
        ProductStatus::InProduction
    } else {
        ProductStatus::Pending
    }
}

/// Whether a product is shown to a party. `None` (warehouse and similar) gets the
/// admin read-only view.
pub fn visible_to(actor: Option<Actor>, state: ProductState) -> bool {
    match actor {
        None | Some(Actor::Admin) => true,
        Some(actor) => {
            state.routed_to == RoutedTo::from(actor)
                || matches!(
                    state.status,
                    ProductStatus::InProduction | ProductStatus::Completed
                )
        }
    }
}

/// Roll product stages up into an order status. `None` for an order without products.
pub fn rollup_order_status(statuses: &[ProductStatus]) -> Option<OrderStatus> {
    if statuses.is_empty() {
        return None;
    }
    let all = |pred: fn(&ProductStatus) -> bool| statuses.iter().all(pred);

    let status = if all(|s| *s == ProductStatus::Completed) {
        OrderStatus::Completed
    } else if all(|s| matches!(s, ProductStatus::Shipped | ProductStatus::Completed)) {
        OrderStatus::Shipped
    } else if all(|s| {
        matches!(
            s,
            ProductStatus::InProduction | ProductStatus::Shipped | ProductStatus::Completed
        )
    }) {
        OrderStatus::InProduction
    } else if statuses.contains(&ProductStatus::PendingClientApproval) {
        OrderStatus::AwaitingClient
    } else if all(|s| *s == ProductStatus::Pending) {
        OrderStatus::Pending
    } else {
        OrderStatus::InProgress
    };
    Some(status)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn at(status: ProductStatus, routed_to: RoutedTo) -> ProductState {
        ProductState { status, routed_to }
    }

    #[test]
    fn blank_note_is_dropped() {
        let plan = plan_transition(
            Actor::Admin,
            RoutingAction::SendBackToManufacturer,
            at(ProductStatus::PendingAdmin, RoutedTo::Admin),
            Some("   "),
        )
        .unwrap();
        assert!(plan.note.is_none());
    }

    #[test]
    fn note_lands_in_receiving_audience_column() {
        let plan = plan_transition(
            Actor::Manufacturer,
            RoutingAction::SendToAdmin,
            at(ProductStatus::Pending, RoutedTo::Manufacturer),
            Some(" priced "),
        )
        .unwrap();
        assert_eq!(
            plan.note,
            Some((NoteField::AdminNotes, "priced".to_string()))
        );
    }

    #[test]
    fn completed_accepts_nothing() {
        let err = plan_transition(
            Actor::Admin,
            RoutingAction::SendToProduction,
            at(ProductStatus::Completed, RoutedTo::Admin),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidState { .. }));
    }

    #[test]
    fn every_action_string_round_trips() {
        for action in RoutingAction::iter() {
            assert_eq!(action.to_string().parse::<RoutingAction>().unwrap(), action);
        }
    }
}
