// Billing core of the hotel front-desk console

pub mod api;
pub mod billing;
pub mod catalog;
pub mod config;
pub mod folio;
pub mod folio_xml;
pub mod logging;
pub mod money;
pub mod session;
pub mod stay;
pub mod stay_filter;

// Re-export key types for convenience
pub use api::{
    ApiError, ClientConfig, ClientError, Discount, FrontDeskApi, HttpFrontDeskClient,
    PaymentMethod, PaymentReceipt, PaymentSubmission, ServiceCharge, StayRecord, StayStatus,
};
pub use billing::{change_due, BillDetails, BillInput, BillingError, BillingResult};
pub use catalog::DiscountCatalog;
pub use config::{ConfigError, ConsoleConfig};
pub use folio::{FolioDraft, FolioError};
pub use folio_xml::{FolioXmlError, ReceiptSummary, XmlFolio};
pub use money::{Money, MoneyError, Percentage};
pub use session::{Session, SessionHandle, StaffRole};
pub use stay::{is_overtime, StayPeriod};
pub use stay_filter::{departures_on, StayFilter};
