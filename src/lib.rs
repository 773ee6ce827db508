pub mod android_jni;
pub mod config;
pub mod direction;
pub mod error;
pub mod format;
pub mod generator;
pub mod geo;
pub mod geocode;
pub mod icon;
pub mod locale;
pub mod otp;

pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
