//! HinksPix / EasyLights configuration upload engine
//!
//! Turns a lighting layout into the controller's port, universe, smart
//! remote and unpack configuration and writes it over the controller's
//! HTTP control plane. A separate binary socket protocol handles SD-card
//! file transfer and a few device commands.

pub mod allocator;
pub mod cli;
pub mod codec;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod layout;
pub mod logging;
pub mod model;
pub mod smart_remote;
pub mod transport;
pub mod unpack;
pub mod upload;

pub use controller::HinksPix;
pub use error::{ErrorKind, Result, UploadError};
pub use layout::Layout;
pub use upload::{upload, NoProgress, Progress, UploadOutcome};
