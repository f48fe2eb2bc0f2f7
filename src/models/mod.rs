pub mod auth;
pub mod common;
pub mod group_class;
pub mod media;
pub mod message;
pub mod notification;
pub mod package;
pub mod pagination;
pub mod profile;
pub mod purchase;
pub mod revenue;
pub mod review;
pub mod store;

pub use auth::*;
pub use common::*;
pub use group_class::*;
pub use media::*;
pub use message::*;
pub use notification::*;
pub use package::*;
pub use pagination::*;
pub use profile::*;
pub use purchase::*;
pub use revenue::*;
pub use review::*;
pub use store::*;
