pub mod context_driver;
pub mod device_provider;
pub mod encoder;
pub mod studio_delegate;
