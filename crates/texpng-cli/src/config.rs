//! Configuration loading for the texpng client.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use texpng_config::Config;

use crate::AppError;

pub(crate) trait ConfigLoader {
    /// Loads configuration from the leading configuration flags.
    ///
    /// `args` starts with the program name; flags after the first command
    /// token never reach the loader.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Loads [`Config`] through `ortho_config` layering.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}
