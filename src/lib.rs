pub mod config;
pub mod error;
pub mod model;
pub mod policy;
pub mod ownership;
pub mod lifecycle;
pub mod storage;
pub mod security;
pub mod seed;
pub mod hook;
pub mod bootstrap;

pub use bootstrap::{Host, Startup};
pub use config::{HookConfig, HostManifest};
pub use error::{BootstrapError, BootstrapResult, ConfigurationError, SeedError};

// Test-only printing helper: expands to eprintln! during tests and debug builds and is absent otherwise.
// Usage: tprintln!("debug: {}", value);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
