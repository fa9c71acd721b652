pub mod capture_backend;
pub mod decode_backend;
pub mod delegate;
pub mod devices;
pub mod vault;
