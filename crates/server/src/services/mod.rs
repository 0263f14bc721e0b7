//! Business-logic services sitting between routes and repositories.

pub mod auth;
pub mod orders;
pub mod uploads;

pub use auth::{AuthError, AuthService, TokenIssuer};
pub use orders::{OrderError, OrderLine, OrderService};
pub use uploads::{UploadError, UploadKind, UploadStore};
