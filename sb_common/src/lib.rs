mod platform;
mod secret;

pub use platform::{Platform, UnsupportedPlatform};
pub use secret::Secret;
