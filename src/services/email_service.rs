use std::fmt::Write as _;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit::{AuditAction, AuditEvent, TargetType, log_audit},
    dto::email::{SendEmailResponse, SendToManufacturerRequest},
    entity::{
        Clients, Manufacturers,
        email_history::ActiveModel as EmailHistoryActive,
        order_items::{Column as ItemCol, Entity as OrderItems, Model as ItemModel},
        order_media::{Column as MediaCol, Entity as OrderMedia, Model as MediaModel},
        order_products::{Column as ProductCol, Entity as OrderProducts, Model as ProductModel},
        orders::{Entity as Orders, Model as OrderModel},
        products::Entity as CatalogProducts,
    },
    error::{AppError, AppResult},
    mailer::OutgoingEmail,
    middleware::auth::{AuthUser, ensure_admin},
    state::AppState,
};

/// Everything the manufacturer email shows.
#[derive(Debug, Clone)]
pub struct OrderEmail {
    pub order: OrderModel,
    pub client_name: String,
    pub manufacturer_name: String,
    pub products: Vec<EmailProduct>,
    pub attachments: Vec<MediaModel>,
}

#[derive(Debug, Clone)]
pub struct EmailProduct {
    pub name: String,
    pub product: ProductModel,
    pub items: Vec<ItemModel>,
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn subject_for(order_number: &str) -> String {
    format!("New order {order_number}")
}

pub fn render_order_email(email: &OrderEmail) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<h2>Order {}</h2><p>Hello {},</p><p>The following products for client <strong>{}</strong> are ready for your review.</p>",
        escape_html(&email.order.order_number),
        escape_html(&email.manufacturer_name),
        escape_html(&email.client_name),
    );

    for product in &email.products {
        let _ = write!(
            html,
            "<h3>{}</h3><p>Status: {}</p>",
            escape_html(&product.name),
            escape_html(&product.product.product_status),
        );
        if let Some(notes) = product.product.manufacturer_notes.as_deref() {
            let _ = write!(html, "<p>Notes: {}</p>", escape_html(notes));
        }
        if !product.items.is_empty() {
            html.push_str("<table><tr><th>Variant</th><th>Quantity</th><th>Notes</th></tr>");
            for item in &product.items {
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&item.variant_combo),
                    item.quantity,
                    escape_html(item.notes.as_deref().unwrap_or("")),
                );
            }
            html.push_str("</table>");
        }
    }

    if !email.attachments.is_empty() {
        html.push_str("<h3>Attachments</h3><ul>");
        for media in &email.attachments {
            let url = escape_html(&media.file_url);
            let _ = write!(html, "<li><a href=\"{url}\">{url}</a></li>");
        }
        html.push_str("</ul>");
    }
    html
}

async fn load_order_email(
    state: &AppState,
    order_id: Uuid,
    include_attachments: bool,
) -> AppResult<(OrderEmail, Option<String>)> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let client_name = Clients::find_by_id(order.client_id)
        .one(&state.orm)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();
    let manufacturer = Manufacturers::find_by_id(order.manufacturer_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let rows = OrderProducts::find()
        .filter(ProductCol::OrderId.eq(order.id))
        .find_also_related(CatalogProducts)
        .order_by_asc(ProductCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let mut products = Vec::with_capacity(rows.len());
    for (product, catalog) in rows {
        let items = OrderItems::find()
            .filter(ItemCol::OrderProductId.eq(product.id))
            .order_by_asc(ItemCol::CreatedAt)
            .all(&state.orm)
            .await?;
        products.push(EmailProduct {
            name: catalog.map(|c| c.name).unwrap_or_default(),
            product,
            items,
        });
    }

    let attachments = if include_attachments {
        OrderMedia::find()
            .filter(MediaCol::OrderId.eq(order.id))
            .order_by_asc(MediaCol::CreatedAt)
            .all(&state.orm)
            .await?
    } else {
        Vec::new()
    };

    Ok((
        OrderEmail {
            order,
            client_name,
            manufacturer_name: manufacturer.name,
            products,
            attachments,
        },
        manufacturer.email.filter(|e| !e.trim().is_empty()),
    ))
}

/// Email the order to its manufacturer. One provider call per request; duplicate
/// requests send duplicate emails.
pub async fn send_to_manufacturer(
    state: &AppState,
    user: &AuthUser,
    payload: SendToManufacturerRequest,
) -> AppResult<SendEmailResponse> {
    ensure_admin(user)?;

    let (email, recipient) =
        load_order_email(state, payload.order_id, payload.include_attachments).await?;
    let recipient =
        recipient.ok_or_else(|| AppError::BadRequest("manufacturer has no email address".into()))?;

    let subject = subject_for(&email.order.order_number);
    let message_id = state
        .mailer
        .send(&OutgoingEmail {
            to: recipient.clone(),
            subject: subject.clone(),
            html: render_order_email(&email),
        })
        .await?;

    tracing::info!(
        order_number = %email.order.order_number,
        %recipient,
        %message_id,
        "order emailed to manufacturer"
    );

    if let Err(err) = (EmailHistoryActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(email.order.id),
        recipient: Set(recipient.clone()),
        subject: Set(subject),
        provider_message_id: Set(Some(message_id.clone())),
        sent_by: Set(Some(user.user_id)),
        created_at: Set(Utc::now().into()),
    })
    .insert(&state.orm)
    .await
    {
        tracing::warn!(error = %err, "email history write failed");
    }

    if let Err(err) = log_audit(
        &state.orm,
        user,
        AuditEvent::new(AuditAction::EmailSent, TargetType::Order, email.order.id)
            .order(email.order.id)
            .values("", recipient.clone()),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(SendEmailResponse {
        success: true,
        message_id,
        recipient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_in_names_is_escaped() {
        assert_eq!(
            escape_html("<b>\"Tom & Jerry's\"</b>"),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
    }
}
