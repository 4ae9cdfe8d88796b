//! Configuration resolver trait for layered overrides.
//!
//! ```text
//! ConfigLoader.load()  →  NosleepConfig (file + env)
//!                              │
//!                              ▼
//!                     ConfigResolver.apply()   (command-line flags)
//!                              │
//!                              ▼
//!                     NosleepConfig (final)
//! ```

use super::NosleepConfig;

/// Applies overrides on top of a loaded configuration.
///
/// Implementors should only touch fields they were explicitly given,
/// preserving everything else.
pub trait ConfigResolver {
    fn apply(&self, config: &mut NosleepConfig);
}
