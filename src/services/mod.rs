//! Services module for business logic

pub mod admin;
pub mod auth;
pub mod order_status;
pub mod purchase;
pub mod shop;
pub mod support;
pub mod wallet;

pub use admin::{AdminService, Metrics};
pub use auth::{AuthService, AuthenticatedSession, SignupRequest};
pub use order_status::OrderStatus;
pub use purchase::{PurchaseOutcome, PurchaseRequest, PurchaseService};
pub use shop::{ShopDetails, ShopService};
pub use support::SupportService;
pub use wallet::{TopUpOutcome, WalletService, WithdrawOutcome, WithdrawRequest};
