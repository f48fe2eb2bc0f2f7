pub mod auth_users;
pub mod class_enrollments;
pub mod group_classes;
pub mod messages;
pub mod notifications;
pub mod products;
pub mod profiles;
pub mod purchases;
pub mod reviews;
pub mod stores;

pub use auth_users as auth_user_entity;
pub use class_enrollments as class_enrollment_entity;
pub use group_classes as group_class_entity;
pub use group_classes::ClassStatus;
pub use messages as message_entity;
pub use notifications as notification_entity;
pub use products as product_entity;
pub use products::PackageType;
pub use profiles as profile_entity;
pub use profiles::UserRole;
pub use purchases as purchase_entity;
pub use purchases::PurchaseStatus;
pub use reviews as review_entity;
pub use stores as store_entity;
