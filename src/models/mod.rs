// Resource models for the storefront API

pub mod address;
pub mod catalog;
pub(crate) mod id;
pub mod user;

pub use address::{Address, AddressRequest};
pub use catalog::{Category, Product, ProductPage, ProductQuery};
pub use user::{ChangePasswordRequest, UpdateProfileRequest};
