// Typed wrappers over the storefront HTTP API

mod address;
mod auth;
mod catalog;
mod user;

pub use address::AddressApi;
pub use auth::AuthApi;
pub use catalog::CatalogApi;
pub use user::UserApi;
