pub mod config;
pub mod context;
pub mod db;
pub mod inbox;
pub mod schema;
pub mod store;
pub mod types;

pub use config::Config;
pub use context::ClaimsContext;
pub use db::DbPool;
pub use store::{NotificationStore, PgStore, ReportStore, Stores, UserStore};
pub use types::{
    DamageReport, NewNotification, Notification, NotificationType, ReportError, ReportRecord,
    ReportStatus, Role, User,
};
