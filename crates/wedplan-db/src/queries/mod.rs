//! Query helpers, one module per table family.

pub mod plan_items;
pub mod plans;
pub mod reservations;
pub mod users;
pub mod users_info;
pub mod vendors;
