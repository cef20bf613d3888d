pub mod builder;
pub mod io;
pub mod release;
pub mod stage;
pub mod wheel;

pub mod reporter;

pub use release::{Arch, PLATFORM_MATRIX, Platform, Release, wheel_platform_tag};
pub use reporter::{ConsoleReporter, NullReporter, Reporter};

/// User Agent string for release downloads
pub const USER_AGENT: &str = concat!("gptscript-wheels/", env!("CARGO_PKG_VERSION"));
