//! Result type alias for xmlcst operations

use crate::error::XmlCstError;

/// Standard Result type for xmlcst operations
pub type Result<T> = std::result::Result<T, XmlCstError>;
