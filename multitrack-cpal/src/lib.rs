//! # multitrack-cpal
//!
//! Native cpal backend for multitrack-core.
//!
//! Provides:
//! - `CpalDeviceProvider`: device sessions on cpal input streams
//! - `CpalContextDriver`: monitoring output that drives the render clock
//! - `list_input_devices`: input device listing for device pickers
//!
//! ## Usage
//! ```ignore
//! use multitrack_core::{Studio, StudioConfiguration, WavEncoderFactory};
//! use multitrack_cpal::{CpalContextDriver, CpalDeviceProvider};
//!
//! let config = StudioConfiguration::default();
//! let encoders = WavEncoderFactory::from_config(&config);
//! let studio = Studio::new(config, CpalDeviceProvider::new(), CpalContextDriver::new(), encoders)?;
//! ```

pub mod devices;
pub mod input;
pub mod output;

pub use devices::list_input_devices;
pub use input::{CpalDeviceProvider, CpalInputStream};
pub use output::CpalContextDriver;
