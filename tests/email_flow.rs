mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{count_audit, create_catalog_product, create_company, create_user, setup_state};
use orderflow_api::{
    dto::{
        email::SendToManufacturerRequest,
        orders::{CreateOrderRequest, NewOrderItem, NewOrderProduct},
    },
    error::AppError,
    mailer::{MailError, Mailer, OutgoingEmail},
    roles::Role,
    services::{email_service, order_service},
};
use uuid::Uuid;

/// Accepts every message and keeps a copy.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| MailError::NotConfigured("outbox poisoned".into()))?;
        sent.push(email.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

fn request(order_id: Uuid) -> SendToManufacturerRequest {
    SendToManufacturerRequest {
        order_id,
        include_attachments: false,
    }
}

#[tokio::test]
async fn orders_are_emailed_to_their_manufacturer() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let client_id = create_company(&state, "clients", None).await?;
    let manufacturer_id = create_company(&state, "manufacturers", Some("orders@factory.test")).await?;
    let silent_id = create_company(&state, "manufacturers", None).await?;
    let admin = create_user(&state, Role::Admin, None, None).await?;
    let client = create_user(&state, Role::Client, Some(client_id), None).await?;
    let jacket = create_catalog_product(&state).await?;

    let order_for = |manufacturer_id| CreateOrderRequest {
        client_id,
        manufacturer_id,
        sub_manufacturer_id: None,
        products: vec![NewOrderProduct {
            product_id: jacket,
            internal_notes: Some("margin is thin".into()),
            items: vec![NewOrderItem {
                variant_combo: "Olive / M".into(),
                quantity: 12,
                notes: None,
            }],
        }],
    };
    let order = order_service::create_order(&state, &admin, order_for(manufacturer_id))
        .await?
        .data
        .expect("order detail")
        .order;
    let silent_order = order_service::create_order(&state, &admin, order_for(silent_id))
        .await?
        .data
        .expect("order detail")
        .order;

    // No provider key configured: a server-side configuration error.
    let unconfigured = email_service::send_to_manufacturer(&state, &admin, request(order.id)).await;
    let err = unconfigured.expect_err("send without a provider key");
    assert!(matches!(err, AppError::Misconfigured(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let mailer = Arc::new(RecordingMailer::default());
    let state = state.with_mailer(mailer.clone());

    let missing = email_service::send_to_manufacturer(&state, &admin, request(Uuid::new_v4())).await;
    let err = missing.expect_err("unknown order");
    assert!(matches!(err, AppError::NotFound));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let not_admin = email_service::send_to_manufacturer(&state, &client, request(order.id)).await;
    assert!(matches!(not_admin, Err(AppError::Forbidden)));

    let no_address =
        email_service::send_to_manufacturer(&state, &admin, request(silent_order.id)).await;
    assert!(matches!(no_address, Err(AppError::BadRequest(_))));

    let sent = email_service::send_to_manufacturer(&state, &admin, request(order.id)).await?;
    assert_eq!(
        serde_json::to_value(&sent)?,
        serde_json::json!({
            "success": true,
            "messageId": "msg-1",
            "recipient": "orders@factory.test",
        })
    );

    let outbox = mailer.sent.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone();
    assert_eq!(outbox.len(), 1);
    assert_eq!(outbox[0].to, "orders@factory.test");
    assert_eq!(outbox[0].subject, format!("New order {}", order.order_number));
    assert!(outbox[0].html.contains("Olive / M"));

    let (recipient, message_id): (String, Option<String>) = sqlx::query_as(
        "SELECT recipient, provider_message_id FROM email_history WHERE order_id = $1",
    )
    .bind(order.id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(recipient, "orders@factory.test");
    assert_eq!(message_id.as_deref(), Some("msg-1"));
    assert_eq!(count_audit(&state, order.id, "email_sent").await?, 1);

    Ok(())
}
