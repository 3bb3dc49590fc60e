pub mod catalog_api;
pub mod http_client;
pub mod router;
