//! Optional backend handles with an explicit degraded state.

use crate::error::ServiceError;
use std::fmt;
use std::sync::Arc;

/// Handle to an optional backend: either usable, or absent with the reason
/// it could not be brought up.
pub enum Dependency<T: ?Sized> {
    Present(Arc<T>),
    Absent { reason: String },
}

impl<T: ?Sized> Dependency<T> {
    pub fn present(handle: Arc<T>) -> Self {
        Dependency::Present(handle)
    }

    pub fn absent(reason: impl Into<String>) -> Self {
        Dependency::Absent {
            reason: reason.into(),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Dependency::Present(_))
    }

    /// Borrow the handle, or fail with `FeatureDisabled` naming the feature.
    pub fn require(&self, feature: &str) -> Result<&Arc<T>, ServiceError> {
        match self {
            Dependency::Present(handle) => Ok(handle),
            Dependency::Absent { reason } => Err(ServiceError::FeatureDisabled(format!(
                "{} is unavailable: {}",
                feature, reason
            ))),
        }
    }
}

impl<T: ?Sized> Clone for Dependency<T> {
    fn clone(&self) -> Self {
        match self {
            Dependency::Present(handle) => Dependency::Present(Arc::clone(handle)),
            Dependency::Absent { reason } => Dependency::Absent {
                reason: reason.clone(),
            },
        }
    }
}

impl<T: ?Sized> fmt::Debug for Dependency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Present(_) => f.write_str("Present"),
            Dependency::Absent { reason } => f.debug_struct("Absent").field("reason", reason).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_handle_is_returned() {
        let dep = Dependency::present(Arc::new(7u32));
        assert!(dep.is_present());
        assert_eq!(**dep.require("numbers").unwrap(), 7);
    }

    #[test]
    fn absent_handle_yields_feature_disabled() {
        let dep: Dependency<u32> = Dependency::absent("disabled by configuration");
        assert!(!dep.is_present());
        assert_eq!(
            dep.require("History storage").unwrap_err(),
            ServiceError::FeatureDisabled(
                "History storage is unavailable: disabled by configuration".to_string()
            )
        );
    }
}
