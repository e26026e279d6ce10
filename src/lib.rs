pub mod config;
pub mod db;
pub mod error;
pub mod escrow;
pub mod events;
pub mod events_api;
pub mod format;
pub mod notify;
pub mod relay;
pub mod socket_relay;
pub mod sse;
pub mod startup;
