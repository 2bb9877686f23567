//! Placeholder native layer used until a real daemon binding is linked.

use crate::native::{NativeDaemon, NativeError, START_SUCCESS_SENTINEL};

const NATIVE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::native::noop");

/// Native daemon that accepts every call without doing any work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNativeDaemon;

impl NativeDaemon for NoopNativeDaemon {
    fn load_libraries(&self) -> Result<(), NativeError> {
        tracing::warn!(
            target: NATIVE_TARGET,
            "native library load requested but no binding is linked"
        );
        Ok(())
    }

    fn start_daemon(&self) -> Result<String, NativeError> {
        tracing::warn!(
            target: NATIVE_TARGET,
            "daemon start requested but no binding is linked"
        );
        Ok(START_SUCCESS_SENTINEL.to_owned())
    }

    fn stop_daemon(&self) -> Result<(), NativeError> {
        tracing::info!(target: NATIVE_TARGET, "daemon stop requested");
        Ok(())
    }

    fn stop_accepting_tunnels(&self) -> Result<(), NativeError> {
        tracing::info!(target: NATIVE_TARGET, "tunnel acceptance stop requested");
        Ok(())
    }
}
