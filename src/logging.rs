//! ## Logging Configuration
//!
//! This module sets up diagnostic logging automatically at program startup using the `ctor` crate.
//! Logging behavior is controlled by the `DEBUG_PREPROC_ENGINE` environment variable:
//!
//! - **Disabled** (default): If the variable is unset, empty, or explicitly set to `"0"` or `"false"`,
//!   no logging will be initialized.
//! - **Enabled**: Any other value enables logging with a maximum log level of `DEBUG`.
//!
//! Diagnostics are unrelated to the transformation log returned by the interpreter, which is
//! part of the result and always produced.
//!
//! ### Usage Example
//!
//! ```sh
//! export DEBUG_PREPROC_ENGINE=true
//! ```

use ctor::ctor;
use tracing::Level;

/// Name of the environment variable that switches diagnostic logging on.
pub const DEBUG_ENV_VAR: &str = "DEBUG_PREPROC_ENGINE";

/// Returns true when the given value of [`DEBUG_ENV_VAR`] enables logging.
pub fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false")))
}

#[ctor]
fn set_debug_level() {
    let value = std::env::var(DEBUG_ENV_VAR).ok();
    if is_enabled(value.as_deref()) {
        // Another subscriber may already be installed by the host application.
        let _ = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .try_init();
    }
}
