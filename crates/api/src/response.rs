//! Shared response envelope types for API handlers.
//!
//! Domain resources are returned in a `{ "data": ... }` envelope.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
