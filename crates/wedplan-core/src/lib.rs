//! Plan composition and consistency engine.
//!
//! - [`recommend`]: per-category vendor selection under a budget
//! - [`composer`]: profile and plan creation, item edits, plan reads
//! - [`registry`]: the one-main-plan-per-user rule
//! - [`reservation`]: booking vendor visits against a plan

pub mod catalog;
pub mod composer;
pub mod error;
pub mod profile;
pub mod recommend;
pub mod registry;
pub mod reservation;
pub mod token;
pub mod view;

pub use error::{CoreError, CoreResult};
