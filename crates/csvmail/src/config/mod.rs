pub mod loader;
pub mod schema;

pub use loader::{load_dotenv, load_store_config, load_store_config_from_str};
pub use schema::{MailConfig, MessageFilters, Paths, StoreConfig};
