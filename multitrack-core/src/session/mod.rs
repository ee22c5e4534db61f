pub mod device_session;
pub mod lifecycle;
pub mod pipeline;
pub mod recorder;
pub mod studio;
pub mod track_store;
