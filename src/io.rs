pub mod local_store;
pub mod locator;
pub mod store;
