//! Workspace facade crate.
//!
//! Re-exports the crates a host needs to drive the Google Drive → YouTube
//! pipeline without wiring each workspace member individually. The
//! `drive-uploader` binary lives in `uploader-cli`.

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;
#[cfg(feature = "desktop-shims")]
pub use core_runtime as runtime;
#[cfg(feature = "desktop-shims")]
pub use core_uploader as uploader;
