//! Data bundle reselling backend: storefront purchases, agent shops,
//! wallets and admin operations over Paystack and Datapacks.

pub mod api;
pub mod config;
pub mod database;
pub mod delivery;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod pricing;
pub mod services;
