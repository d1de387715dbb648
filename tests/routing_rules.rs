use strum::IntoEnumIterator;

use orderflow_api::workflow::{
    Actor, NoteField, OrderStatus, ProductState, ProductStatus, RoutedTo, RoutingAction,
    TransitionError, plan_transition, rollup_order_status, stage_for_lock, visible_to,
};

fn at(status: ProductStatus, routed_to: RoutedTo) -> ProductState {
    ProductState { status, routed_to }
}

#[test]
fn transition_table() {
    use ProductStatus as S;
    use RoutedTo as R;
    use RoutingAction as A;

    let rows = [
        (Actor::Admin, A::SendToProduction, at(S::PendingAdmin, R::Admin), at(S::InProduction, R::Manufacturer)),
        (Actor::Admin, A::RequestSample, at(S::Pending, R::Admin), at(S::SampleRequested, R::Manufacturer)),
        (Actor::Admin, A::SendForApproval, at(S::PendingAdmin, R::Admin), at(S::PendingClientApproval, R::Client)),
        (Actor::Admin, A::SendBackToManufacturer, at(S::PendingAdmin, R::Admin), at(S::RevisionRequested, R::Manufacturer)),
        (Actor::Admin, A::MarkCompleted, at(S::Shipped, R::Admin), at(S::Completed, R::Admin)),
        (Actor::Manufacturer, A::SendToAdmin, at(S::SampleRequested, R::Manufacturer), at(S::PendingAdmin, R::Admin)),
        (Actor::Manufacturer, A::InProduction, at(S::RevisionRequested, R::Manufacturer), at(S::InProduction, R::Manufacturer)),
        (Actor::Manufacturer, A::Shipped, at(S::InProduction, R::Manufacturer), at(S::Shipped, R::Admin)),
        (Actor::Client, A::Approve, at(S::PendingClientApproval, R::Client), at(S::ClientApproved, R::Admin)),
    ];

    for (actor, action, from, to) in rows {
        let plan = plan_transition(actor, action, from, None)
            .unwrap_or_else(|e| panic!("{action} from {from:?} failed: {e}"));
        assert_eq!(plan.to, to, "{action}");
        assert_eq!(plan.from, from);
    }
}

#[test]
fn side_effects_follow_the_action() {
    let production = plan_transition(
        Actor::Admin,
        RoutingAction::SendToProduction,
        at(ProductStatus::PendingAdmin, RoutedTo::Admin),
        None,
    )
    .unwrap();
    assert_eq!(production.lock, Some(true));

    let sample = plan_transition(
        Actor::Admin,
        RoutingAction::RequestSample,
        at(ProductStatus::Pending, RoutedTo::Admin),
        None,
    )
    .unwrap();
    assert!(sample.requires_sample);
    assert_eq!(sample.sample_routed_to, Some(RoutedTo::Manufacturer));
    assert_eq!(sample.lock, None);

    let approval = plan_transition(
        Actor::Admin,
        RoutingAction::SendForApproval,
        at(ProductStatus::PendingAdmin, RoutedTo::Admin),
        None,
    )
    .unwrap();
    assert!(approval.requires_client_approval);
    assert!(!approval.notify_order_creator);

    let shipped = plan_transition(
        Actor::Manufacturer,
        RoutingAction::Shipped,
        at(ProductStatus::InProduction, RoutedTo::Manufacturer),
        None,
    )
    .unwrap();
    assert!(shipped.stamp_shipped_date);

    let back = plan_transition(
        Actor::Manufacturer,
        RoutingAction::SendToAdmin,
        at(ProductStatus::Pending, RoutedTo::Manufacturer),
        None,
    )
    .unwrap();
    assert!(back.notify_order_creator);
}

#[test]
fn request_changes_needs_a_note() {
    let current = at(ProductStatus::PendingClientApproval, RoutedTo::Client);

    let err = plan_transition(Actor::Client, RoutingAction::RequestChanges, current, Some("  "))
        .unwrap_err();
    assert_eq!(
        err,
        TransitionError::NoteRequired {
            action: RoutingAction::RequestChanges
        }
    );

    let plan = plan_transition(
        Actor::Client,
        RoutingAction::RequestChanges,
        current,
        Some("logo too small"),
    )
    .unwrap();
    assert_eq!(
        plan.to,
        at(ProductStatus::RevisionRequested, RoutedTo::Admin)
    );
    assert_eq!(
        plan.note,
        Some((NoteField::AdminNotes, "logo too small".to_string()))
    );
    assert!(plan.notify_order_creator);
}

#[test]
fn note_goes_to_the_receiving_party() {
    let plan = plan_transition(
        Actor::Admin,
        RoutingAction::SendForApproval,
        at(ProductStatus::PendingAdmin, RoutedTo::Admin),
        Some("please check colours"),
    )
    .unwrap();
    let (field, text) = plan.note.unwrap();
    assert_eq!(field, NoteField::ClientNotes);
    assert_eq!(field.column_name(), "client_notes");
    assert_eq!(text, "please check colours");
}

#[test]
fn wrong_actor_is_a_permission_error() {
    let err = plan_transition(
        Actor::Client,
        RoutingAction::SendToProduction,
        at(ProductStatus::PendingAdmin, RoutedTo::Admin),
        None,
    )
    .unwrap_err();
    assert!(err.is_permission());
}

#[test]
fn product_must_be_routed_to_the_actor() {
    let err = plan_transition(
        Actor::Manufacturer,
        RoutingAction::Shipped,
        at(ProductStatus::InProduction, RoutedTo::Admin),
        None,
    )
    .unwrap_err();
    assert_eq!(
        err,
        TransitionError::NotRoutedToActor {
            expected: RoutedTo::Manufacturer,
            actual: RoutedTo::Admin,
        }
    );
    assert!(!err.is_permission());
}

#[test]
fn completed_products_reject_every_action() {
    for action in RoutingAction::iter() {
        let actor = action.actor();
        let current = at(ProductStatus::Completed, RoutedTo::from(actor));
        let err = plan_transition(actor, action, current, Some("note")).unwrap_err();
        assert!(
            matches!(err, TransitionError::InvalidState { .. }),
            "{action} was accepted on a completed product"
        );
    }
}

#[test]
fn mark_completed_requires_shipped() {
    let err = plan_transition(
        Actor::Admin,
        RoutingAction::MarkCompleted,
        at(ProductStatus::InProduction, RoutedTo::Admin),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState { .. }));
}

#[test]
fn client_actions_require_pending_approval() {
    let err = plan_transition(
        Actor::Client,
        RoutingAction::Approve,
        at(ProductStatus::InProduction, RoutedTo::Client),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState { .. }));
}

#[test]
fn visibility_by_party() {
    let with_admin = at(ProductStatus::PendingAdmin, RoutedTo::Admin);
    let with_client = at(ProductStatus::PendingClientApproval, RoutedTo::Client);
    let producing = at(ProductStatus::InProduction, RoutedTo::Manufacturer);
    let done = at(ProductStatus::Completed, RoutedTo::Admin);

    assert!(visible_to(Some(Actor::Admin), with_client));
    assert!(visible_to(None, with_client));

    assert!(!visible_to(Some(Actor::Client), with_admin));
    assert!(visible_to(Some(Actor::Client), with_client));
    assert!(visible_to(Some(Actor::Client), producing));
    assert!(visible_to(Some(Actor::Client), done));

    assert!(!visible_to(Some(Actor::Manufacturer), with_client));
    assert!(visible_to(Some(Actor::Manufacturer), producing));
    assert!(visible_to(Some(Actor::Manufacturer), done));
}

#[test]
fn order_status_rollup() {
    use ProductStatus as S;

    assert_eq!(rollup_order_status(&[]), None);
    assert_eq!(
        rollup_order_status(&[S::Pending, S::Pending]),
        Some(OrderStatus::Pending)
    );
    assert_eq!(
        rollup_order_status(&[S::Completed, S::Completed]),
        Some(OrderStatus::Completed)
    );
    assert_eq!(
        rollup_order_status(&[S::Shipped, S::Completed]),
        Some(OrderStatus::Shipped)
    );
    assert_eq!(
        rollup_order_status(&[S::InProduction, S::Shipped]),
        Some(OrderStatus::InProduction)
    );
    assert_eq!(
        rollup_order_status(&[S::PendingClientApproval, S::Pending]),
        Some(OrderStatus::AwaitingClient)
    );
    assert_eq!(
        rollup_order_status(&[S::SampleRequested, S::Pending]),
        Some(OrderStatus::InProgress)
    );
}

#[test]
fn lock_flag_forces_stage() {
    assert_eq!(stage_for_lock(true), ProductStatus::InProduction);
    assert_eq!(stage_for_lock(false), ProductStatus::Pending);
}

#[test]
fn every_action_has_one_owner() {
    let admin = [
        RoutingAction::SendToProduction,
        RoutingAction::RequestSample,
        RoutingAction::SendForApproval,
        RoutingAction::SendBackToManufacturer,
        RoutingAction::MarkCompleted,
    ];
    for action in admin {
        assert_eq!(action.actor(), Actor::Admin);
    }
    assert_eq!(RoutingAction::Shipped.actor(), Actor::Manufacturer);
    assert_eq!(RoutingAction::Approve.actor(), Actor::Client);
    assert_eq!(
        RoutingAction::SendToAdmin.audit_action_type(),
        "product_routed_send_to_admin"
    );
}
