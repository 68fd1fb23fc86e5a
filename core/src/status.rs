//! Classification of HTTP status codes into success or an error kind.

/// Which error a failed status code maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// Any other status at or above 400.
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Failure(StatusKind),
}

/// Anything below 400 counts as success, including 1xx and 3xx.
pub fn is_successful(status: u16) -> bool {
    status < 400
}

pub fn classify(status: u16) -> Classification {
    if is_successful(status) {
        return Classification::Success;
    }
    let kind = match status {
        401 => StatusKind::Unauthorized,
        403 => StatusKind::Forbidden,
        404 => StatusKind::NotFound,
        _ => StatusKind::Api,
    };
    Classification::Failure(kind)
}
