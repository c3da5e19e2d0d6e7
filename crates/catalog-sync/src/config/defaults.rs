/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./catalog-sync.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// Scheduler defaults
pub const DEFAULT_AUTO_SEND_ENABLED: bool = true;

// Source defaults
pub const DEFAULT_SOURCE_BASE_URL: &str = "http://localhost:9000/api/catalog/items";
pub const DEFAULT_PAGE_PARAM: &str = "page";
pub const DEFAULT_SIZE_PARAM: &str = "size";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_ITEMS_FIELD: &str = "items";
pub const DEFAULT_ID_FIELD: &str = "id";
pub const DEFAULT_SOURCE_REQUEST_TIMEOUT: &str = "30s";

// Delivery defaults
pub const DEFAULT_CONNECT_TIMEOUT: &str = "10s";
pub const DEFAULT_DELIVERY_REQUEST_TIMEOUT: &str = "30s";
pub const DEFAULT_ITEM_QUEUE_CAPACITY: usize = 1000;
/// Status recorded when a delivery fails before the target answers
pub const DEFAULT_ERROR_STATUS_CODE: u16 = 500;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
