//! Business logic services for the Retail POS Back Office

pub mod activity;
pub mod auth;
pub mod cash_session;
pub mod product;
pub mod promocode;
pub mod sale;
pub mod stock_ledger;

pub use activity::ActivityLogService;
pub use auth::AuthService;
pub use cash_session::CashSessionService;
pub use product::ProductService;
pub use promocode::PromoCodeService;
pub use sale::SaleService;
pub use stock_ledger::StockLedgerService;
