//! Crate dispatch: decides how an order's unit quantities are packed into
//! supplier crates and standard 6/12/20-slot crates.
//!
//! The allocation engine lives in [`dispatch`] and is a pure library
//! function; [`catalog`] supplies the product classification it needs and
//! [`api`] wraps both in an HTTP service.

pub mod api;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod model;
