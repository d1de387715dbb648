pub mod accessory_types;
pub mod audit_log;
pub mod clients;
pub mod email_history;
pub mod inventory;
pub mod manufacturers;
pub mod notifications;
pub mod order_items;
pub mod order_media;
pub mod order_products;
pub mod orders;
pub mod products;
pub mod users;

pub use accessory_types::Entity as AccessoryTypes;
pub use audit_log::Entity as AuditLog;
pub use clients::Entity as Clients;
pub use email_history::Entity as EmailHistory;
pub use inventory::Entity as Inventory;
pub use manufacturers::Entity as Manufacturers;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use order_media::Entity as OrderMedia;
pub use order_products::Entity as OrderProducts;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use users::Entity as Users;
