//! Logging front-end.
//!
//! Library code logs through these macros instead of naming a backend:
//!
//! | Build                  | Backend   |
//! |------------------------|-----------|
//! | `defmt` (hardware)     | defmt/RTT |
//! | `emulator`             | tracing   |
//! | neither (host tests)   | none; arguments are still evaluated by reference |
//!
//! Format strings must stay within the common subset of defmt and `core::fmt`
//! (`{}` and `{:?}`), and every argument must implement both `Display` and
//! `defmt::Format`.

#![allow(unused_macros)]

macro_rules! log_with {
    ($defmt:ident, $tracing:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "defmt")]
        ::defmt::$defmt!($s $(, $x)*);
        #[cfg(all(feature = "emulator", not(feature = "defmt")))]
        ::tracing::$tracing!($s $(, $x)*);
        #[cfg(not(any(feature = "defmt", feature = "emulator")))]
        let _ = ($(&$x),*);
    }};
}

macro_rules! trace {
    ($($t:tt)*) => { log_with!(trace, trace, $($t)*) };
}

macro_rules! debug {
    ($($t:tt)*) => { log_with!(debug, debug, $($t)*) };
}

macro_rules! info {
    ($($t:tt)*) => { log_with!(info, info, $($t)*) };
}

macro_rules! warn {
    ($($t:tt)*) => { log_with!(warn, warn, $($t)*) };
}

macro_rules! error {
    ($($t:tt)*) => { log_with!(error, error, $($t)*) };
}
