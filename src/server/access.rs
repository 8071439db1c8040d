use chrono::Utc;

use crate::features::{FeatureSet, resolve};
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::{Store, TenantStore};
use crate::types::{Feature, School};

/// Resolves the school's effective features from its plan and overrides.
pub fn school_features(store: &dyn Store, school: &School) -> Result<FeatureSet, ApiError> {
    let overrides = store
        .list_feature_flags(&school.id)
        .api_err("Failed to load feature flags")?;
    Ok(resolve(school, &overrides, Utc::now()))
}

/// Fails with 403 unless the feature is enabled for the school.
pub fn require_feature(
    store: &dyn Store,
    school: &School,
    feature: Feature,
) -> Result<(), ApiError> {
    if school_features(store, school)?.is_enabled(feature) {
        Ok(())
    } else {
        Err(feature_unavailable(feature))
    }
}

#[must_use]
pub fn feature_unavailable(feature: Feature) -> ApiError {
    ApiError::forbidden(format!(
        "Feature '{feature}' is not available on your plan"
    ))
}

/// 404 unless the record belongs to the caller's school, so foreign ids
/// are indistinguishable from missing ones.
pub fn require_owned<T>(
    item: Option<T>,
    school_id: impl Fn(&T) -> &str,
    school: &School,
    message: &'static str,
) -> Result<T, ApiError> {
    match item {
        Some(item) if school_id(&item) == school.id => Ok(item),
        _ => Err(ApiError::not_found(message)),
    }
}
