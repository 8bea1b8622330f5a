pub mod config;
pub mod logging;

pub mod intercept;
pub mod manifest;
pub mod mime;
pub mod net;
pub mod prefetch;
pub mod session;
pub mod store;
pub mod url_model;
