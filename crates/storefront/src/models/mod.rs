//! Domain models shared between repositories and route handlers.
//!
//! These are the shapes the JSON API serves. Database row types live in the
//! `db` module and are converted into these models at the repository
//! boundary, so handlers never see raw rows.

pub mod cart;
pub mod discount;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use cart::{CartLine, CartView};
pub use discount::DiscountCode;
pub use order::{Order, OrderItem, OrderView};
pub use product::{Product, ProductImage};
pub use review::Review;
pub use user::User;
