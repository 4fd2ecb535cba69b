//! Logging support

use log::{debug, error, info, warn};

/// Enum that describes level associated with a log message
#[derive(Debug, Eq, PartialEq)]
pub enum EeLogLevels {
    /// Common error logging level
    EeError,
    /// Common info logging level
    EeInfo,
    /// Common warn logging level
    EeWarn,
    /// Common debug logging level
    EeDebug,
}

/// `log_message` provides a logging function that emits via the log facade.
pub fn log_message(level: &EeLogLevels, message: &str) {
    match level {
        EeLogLevels::EeError => error!("{}", message),
        EeLogLevels::EeWarn => warn!("{}", message),
        EeLogLevels::EeInfo => info!("{}", message),
        EeLogLevels::EeDebug => debug!("{}", message),
    }
}
