//! # Bridge Configuration Module
//!
//! Provides configuration for the page-side interception layer.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`BridgeConfig`]. It enforces fail-fast validation so a misconfigured page
//! fails at initialization rather than on its first request.
//!
//! ## Settings
//!
//! - `command` - Bridge command used for intercepted requests
//!   (default [`DEFAULT_COMMAND`])
//! - `reserved_scheme` - URL prefix that bypasses interception
//!   (default [`DEFAULT_RESERVED_SCHEME`], the host's own IPC channel)
//! - `max_redirects` - Optional bound on redirect chains (default: unbounded)
//! - `redirect_command` - Which command redirect follow-ups use
//!   (default: always [`DEFAULT_COMMAND`])
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::BridgeConfig;
//!
//! let config = BridgeConfig::builder()
//!     .command("my_app_request")
//!     .max_redirects(10)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.command, "my_app_request");
//! ```
//!
//! ## Redirect behaviour
//!
//! Follow-up requests for a redirect chain are sent with the default command
//! even when `command` is overridden, and chains are not bounded. Both are
//! the established page contract; [`RedirectCommand::Configured`] and
//! `max_redirects` opt out of them explicitly.

use crate::error::{Error, Result};
pub use bridge_traits::DEFAULT_COMMAND;

/// URL prefix of the host's internal IPC channel.
pub const DEFAULT_RESERVED_SCHEME: &str = "ipc://";

/// Command used for redirect follow-up requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectCommand {
    /// Always [`DEFAULT_COMMAND`], regardless of the configured command.
    #[default]
    FixedDefault,
    /// The same command as the initial request.
    Configured,
}

/// Page-side bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Bridge command for intercepted requests
    pub command: String,

    /// URL prefix that is passed straight to the original fetch
    pub reserved_scheme: String,

    /// Upper bound on followed redirects; `None` follows forever
    pub max_redirects: Option<usize>,

    /// Command used for redirect follow-ups
    pub redirect_command: RedirectCommand,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
            reserved_scheme: DEFAULT_RESERVED_SCHEME.to_string(),
            max_redirects: None,
            redirect_command: RedirectCommand::default(),
        }
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Default configuration with an optional command override, the shape the
    /// page bootstrap receives.
    pub fn with_command_override(command: Option<&str>) -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(command) = command {
            builder = builder.command(command);
        }
        builder.build()
    }

    /// Command used for redirect follow-up requests.
    pub fn redirect_command(&self) -> &str {
        match self.redirect_command {
            RedirectCommand::FixedDefault => DEFAULT_COMMAND,
            RedirectCommand::Configured => &self.command,
        }
    }

    /// Whether `url` addresses the host's internal scheme.
    pub fn is_reserved(&self, url: &str) -> bool {
        url.starts_with(&self.reserved_scheme)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(Error::Config("Bridge command cannot be empty".to_string()));
        }

        if self.reserved_scheme.is_empty() {
            return Err(Error::Config(
                "Reserved scheme prefix cannot be empty".to_string(),
            ));
        }

        if self.max_redirects == Some(0) {
            return Err(Error::Config(
                "max_redirects must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Default)]
pub struct BridgeConfigBuilder {
    command: Option<String>,
    reserved_scheme: Option<String>,
    max_redirects: Option<usize>,
    redirect_command: Option<RedirectCommand>,
}

impl BridgeConfigBuilder {
    /// Sets the bridge command name
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Sets the URL prefix that bypasses interception
    pub fn reserved_scheme(mut self, prefix: impl Into<String>) -> Self {
        self.reserved_scheme = Some(prefix.into());
        self
    }

    /// Bounds redirect chains
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Selects the command used for redirect follow-ups
    pub fn redirect_command(mut self, redirect_command: RedirectCommand) -> Self {
        self.redirect_command = Some(redirect_command);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty command or scheme, or a zero
    /// redirect limit.
    pub fn build(self) -> Result<BridgeConfig> {
        let defaults = BridgeConfig::default();
        let config = BridgeConfig {
            command: self.command.unwrap_or(defaults.command),
            reserved_scheme: self.reserved_scheme.unwrap_or(defaults.reserved_scheme),
            max_redirects: self.max_redirects,
            redirect_command: self.redirect_command.unwrap_or(defaults.redirect_command),
        };
        config.validate()?;
        Ok(config)
    }
}
