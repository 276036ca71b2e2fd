//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `nodeconf_core::defaults`.

use nodeconf_core::defaults;

/// Generate default value functions that forward to nodeconf_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_sync_version => DEFAULT_SYNC_VERSION: u64,
    default_full_sync    => DEFAULT_FULL_SYNC: bool,
}

default_string_fns! {
    default_log_level  => DEFAULT_LOG_LEVEL,
    default_log_format => DEFAULT_LOG_FORMAT,
    default_log_output => DEFAULT_LOG_OUTPUT,
}
