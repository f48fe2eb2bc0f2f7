pub mod email;
pub mod jwt;
pub mod password;
pub mod token;

pub use email::*;
pub use jwt::*;
pub use password::*;
pub use token::generate_confirmation_token;
