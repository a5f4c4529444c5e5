//! Process-wide options.
//!
//! [`Settings`] holds the [`Options`] every indicator call starts from. It is
//! a process-wide singleton accessed via a `std::sync::OnceLock`; per-call
//! overrides on [`crate::IndicatorCall`] always win over it.

use std::fmt;
use std::str::FromStr;
use std::sync::{OnceLock, PoisonError, RwLock};

use cm_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::missing::MissingPolicy;

/// What to do with a recoverable input problem (sampling-frequency
/// mismatch, same-family kind mismatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Fail the call.
    Raise,
    /// Emit a warning notice and go on.
    #[default]
    Warn,
    /// Emit an informational notice and go on.
    Log,
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raise" => Ok(ValidationMode::Raise),
            "warn" => Ok(ValidationMode::Warn),
            "log" => Ok(ValidationMode::Log),
            other => Err(Error::InvalidArgument(format!("unknown validation mode `{other}`"))),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidationMode::Raise => "raise",
            ValidationMode::Warn => "warn",
            ValidationMode::Log => "log",
        })
    }
}

/// Library options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Default masking policy.
    pub missing: MissingPolicy,
    /// Master switch for masking.
    pub check_missing: bool,
    /// Handling of recoverable input problems.
    pub data_validation: ValidationMode,
    /// Whether outputs carry a `history` attribute.
    pub keep_history: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            missing: MissingPolicy::AnyMissing,
            check_missing: true,
            data_validation: ValidationMode::Warn,
            keep_history: true,
        }
    }
}

impl Options {
    /// Load options from a JSON document. Absent fields keep their default.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for malformed JSON or out-of-range values.
    pub fn from_json(text: &str) -> Result<Self> {
        let options: Options =
            serde_json::from_str(text).map_err(|e| Error::InvalidArgument(format!("invalid options: {e}")))?;
        options.missing.check()?;
        Ok(options)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Runtime(format!("cannot serialize options: {e}")))
    }

    /// Masking policy in effect: `None` when masking is switched off.
    pub fn effective_missing(&self) -> MissingPolicy {
        if self.check_missing {
            self.missing
        } else {
            MissingPolicy::None
        }
    }
}

/// Process-wide settings.
pub struct Settings {
    options: RwLock<Options>,
}

static INSTANCE: OnceLock<Settings> = OnceLock::new();

impl Settings {
    /// Return a reference to the global singleton.
    pub fn instance() -> &'static Settings {
        INSTANCE.get_or_init(|| Settings {
            options: RwLock::new(Options::default()),
        })
    }

    /// A copy of the current options.
    pub fn options(&self) -> Options {
        self.options.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the options, returning the previous ones.
    pub fn set(&self, options: Options) -> Options {
        let mut guard = self.options.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, options)
    }

    /// Modify the options in place.
    pub fn update(&self, f: impl FnOnce(&mut Options)) {
        let mut guard = self.options.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    /// Restore the defaults.
    pub fn reset(&self) {
        self.set(Options::default());
    }
}

/// Sets options for as long as it lives and restores the previous ones on
/// drop.
///
/// ```
/// use cm_indicators::{MissingPolicy, Options, ScopedOptions, Settings};
///
/// {
///     let _scope = ScopedOptions::new(Options { missing: MissingPolicy::None, ..Options::default() });
///     assert_eq!(Settings::instance().options().missing, MissingPolicy::None);
/// }
/// assert_eq!(Settings::instance().options().missing, MissingPolicy::AnyMissing);
/// ```
#[must_use = "options are restored as soon as the guard is dropped"]
pub struct ScopedOptions {
    previous: Option<Options>,
}

impl ScopedOptions {
    /// Install `options` globally.
    pub fn new(options: Options) -> Self {
        Self {
            previous: Some(Settings::instance().set(options)),
        }
    }
}

impl Drop for ScopedOptions {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            Settings::instance().set(previous);
        }
    }
}
