//! RPC Error Types
//!
//! Maps application errors to JSON-RPC error codes. Operation failures are
//! not errors at this layer: they travel inside `{success: false, error}`.

use adb_dispatch_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    match err {
        AppError::Validation(msg) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, msg, None::<()>)
        }
        AppError::Domain(e) => {
            ErrorObjectOwned::owned(code::VALIDATION_ERROR, e.to_string(), None::<()>)
        }
        AppError::Queue(e) => {
            ErrorObjectOwned::owned(code::INTERNAL_ERROR, e.to_string(), None::<()>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_4000() {
        let err = to_rpc_error(AppError::Validation("command is empty".to_string()));
        assert_eq!(err.code(), code::VALIDATION_ERROR);
        assert_eq!(err.message(), "command is empty");
    }
}
