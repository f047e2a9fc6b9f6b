pub mod config;
pub mod error;
pub mod logging;

pub mod capture;
pub mod exchange;
pub mod extract;
pub mod har;
pub mod probe;
pub mod signed_url;
pub mod store;
pub mod summary;
pub mod url_model;
pub mod verify;
