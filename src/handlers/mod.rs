//! HTTP handlers for the Retail POS Back Office

pub mod activity;
pub mod auth;
pub mod cash;
pub mod health;
pub mod inventory;
pub mod product;
pub mod promocode;
pub mod sale;

pub use activity::*;
pub use auth::*;
pub use cash::*;
pub use health::*;
pub use inventory::*;
pub use product::*;
pub use promocode::*;
pub use sale::*;
