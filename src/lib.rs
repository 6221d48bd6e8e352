//! ElderCare Connect — senior-care coordination backend.
//!
//! Family members follow visit logs for their elders; providers submit
//! completed visits with notes, vitals, and photos; webhook notifiers
//! turn visit-completion change events into WhatsApp messages.

pub mod api;
pub mod changefeed;
pub mod config;
pub mod db;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod photos;
