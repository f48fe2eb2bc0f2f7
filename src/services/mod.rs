pub mod access_gate;
pub mod auth_service;
pub mod class_service;
pub mod message_service;
pub mod notification_service;
pub mod package_service;
pub mod profile_service;
pub mod purchase_service;
pub mod revenue_service;
pub mod review_service;
pub mod session_service;
pub mod store_service;

pub use access_gate::*;
pub use auth_service::*;
pub use class_service::*;
pub use message_service::*;
pub use notification_service::*;
pub use package_service::*;
pub use profile_service::*;
pub use purchase_service::*;
pub use revenue_service::*;
pub use review_service::*;
pub use session_service::*;
pub use store_service::*;
