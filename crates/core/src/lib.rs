pub mod config;
pub mod error;
pub mod sheet;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use sheet::SheetTable;
