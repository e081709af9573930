//! Business services: discount evaluation, token issuance, identity.

pub mod auth;
pub mod discount;
pub mod identity;
