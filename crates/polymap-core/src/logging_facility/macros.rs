//! Canonical logging macros
//!
//! Every store operation brackets itself with a start event and exactly one
//! end or end_error event carrying `duration_ms`.

/// Log the start of an operation
///
/// ```
/// # use polymap_core::log_op_start;
/// log_op_start!("persist_graph");
/// log_op_start!("load_graph", entity_id = "61137189-40f8-478b-b2aa-5f63b91f3506");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = polymap_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = polymap_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use polymap_core::log_op_end;
/// log_op_end!("persist_graph", duration_ms = 42);
/// log_op_end!("persist_graph", duration_ms = 42, row_count = 5);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = polymap_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = polymap_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// Accepts anything convertible into `ExError`; the kind and stable code
/// are emitted as `err.kind` / `err.code`.
///
/// ```
/// # use polymap_core::{log_op_error, errors::MapError};
/// let err = MapError::EntityNotFound { entity_id: "e1".to_string() };
/// log_op_error!("load_graph", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = polymap_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = polymap_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message(),
            $($field)*
        );
    }};
}
