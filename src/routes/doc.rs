use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    audit::FieldChange,
    dto::{
        auth::{LoginRequest, LoginResponse},
        email::{SendEmailResponse, SendToManufacturerRequest},
        history::{HistoryLine, HistoryList},
        inventory::{
            AccessoryTypeList, CreateAccessoryTypeRequest, CreateInventoryRequest,
            InventoryAdjustRequest, InventoryList, UpdateAccessoryTypeRequest,
            UpdateInventoryRequest,
        },
        notifications::NotificationList,
        orders::{
            CompanyList, CreateOrderRequest, NewOrderItem, NewOrderProduct, OrderDetail,
            OrderList, ProductDetail, UpdatePaymentRequest, UpdateSampleRequest,
        },
        products::{CreateProductRequest, ProductList},
        routing::{
            AddMediaRequest, ItemApprovalRequest, LockProductRequest, PendingEdit,
            ProductUpdates, RouteAllRequest, RouteAllResponse, RouteItemResult,
            RouteProductRequest, UpdateProductRequest,
        },
        users::{
            CreateUserRequest, DeleteUserRequest, UpdateUserRequest, UserList, UserType,
            UserUpdates,
        },
    },
    error::ErrorClass,
    models::{
        AccessoryType, AuditLogEntry, Company, InventoryItem, Notification, Order, OrderItem,
        OrderMedia, OrderProduct, Product, User,
    },
    response::{ApiResponse, Meta},
    roles::Role,
    routes::{
        auth, directory, email, health, inventory, notifications, order_products, orders,
        products, users,
    },
    workflow::{ApprovalStatus, OrderStatus, ProductStatus, RoutedTo, RoutingAction},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::login,
        auth::me,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_sample,
        orders::add_sample_media,
        orders::update_payment,
        orders::route_all,
        orders::order_history,
        order_products::route_product,
        order_products::set_lock,
        order_products::update_product,
        order_products::delete_product,
        order_products::add_media,
        order_products::delete_media,
        order_products::update_item_approval,
        inventory::list_accessory_types,
        inventory::create_accessory_type,
        inventory::update_accessory_type,
        inventory::delete_accessory_type,
        inventory::list_inventory,
        inventory::list_low_stock,
        inventory::create_inventory,
        inventory::update_inventory,
        inventory::adjust_inventory,
        inventory::delete_inventory,
        users::list_users,
        users::create_user,
        users::update_user,
        users::delete_user,
        email::send_to_manufacturer,
        notifications::list_notifications,
        notifications::mark_read,
        products::list_products,
        products::create_product,
        directory::list_clients,
        directory::list_manufacturers,
    ),
    components(
        schemas(
            User,
            Company,
            Product,
            Order,
            OrderProduct,
            OrderItem,
            OrderMedia,
            AuditLogEntry,
            Notification,
            AccessoryType,
            InventoryItem,
            FieldChange,
            ErrorClass,
            Role,
            UserType,
            ProductStatus,
            RoutedTo,
            RoutingAction,
            OrderStatus,
            ApprovalStatus,
            LoginRequest,
            LoginResponse,
            CreateOrderRequest,
            NewOrderProduct,
            NewOrderItem,
            UpdateSampleRequest,
            UpdatePaymentRequest,
            OrderList,
            OrderDetail,
            ProductDetail,
            CompanyList,
            RouteProductRequest,
            LockProductRequest,
            ProductUpdates,
            UpdateProductRequest,
            PendingEdit,
            RouteAllRequest,
            RouteItemResult,
            RouteAllResponse,
            ItemApprovalRequest,
            AddMediaRequest,
            HistoryLine,
            HistoryList,
            CreateAccessoryTypeRequest,
            UpdateAccessoryTypeRequest,
            CreateInventoryRequest,
            UpdateInventoryRequest,
            InventoryAdjustRequest,
            AccessoryTypeList,
            InventoryList,
            CreateUserRequest,
            UserUpdates,
            UpdateUserRequest,
            DeleteUserRequest,
            UserList,
            SendToManufacturerRequest,
            SendEmailResponse,
            NotificationList,
            CreateProductRequest,
            ProductList,
            health::HealthData,
            Meta,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<OrderProduct>,
            ApiResponse<RouteAllResponse>,
            ApiResponse<HistoryList>,
            ApiResponse<InventoryList>,
            ApiResponse<UserList>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Login and current user"),
        (name = "Orders", description = "Orders, samples, payment and history"),
        (name = "Routing", description = "Moving order products between admin, manufacturer and client"),
        (name = "Order products", description = "Order product fields and item approval"),
        (name = "Media", description = "File references attached to orders"),
        (name = "Inventory", description = "Manufacturer accessory stock"),
        (name = "Users", description = "User administration"),
        (name = "Email", description = "Manufacturer email dispatch"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Products", description = "Product catalog"),
        (name = "Directory", description = "Clients and manufacturers"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
