//! Calling the notification functions, and building what they carry.

pub mod client;
pub mod ids;
pub mod links;
pub mod templates;

pub use client::{DeliveryReport, NotificationClient, NotifyError};
