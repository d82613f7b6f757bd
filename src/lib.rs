//! Library crate root for the codezure launcher.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod azure;
pub mod cli;
pub mod interactive;
pub mod launcher;
pub mod profiles;
pub mod runtime;
pub mod secrets;
pub mod settings;
pub mod updater;

/// Version stamped at release build time; `dev` otherwise.
pub const APP_VERSION: &str = match option_env!("CODEZURE_RELEASE_VERSION") {
    Some(version) => version,
    None => "dev",
};
