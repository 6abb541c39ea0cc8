//! The single served HTML page.

use crate::http::{Response, StatusCode};

/// Serves the prompt-and-preview page at `GET /`.
pub fn index() -> Response {
    Response::new(StatusCode::Ok)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(include_str!("../../assets/index.html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_html() {
        let response = index();
        assert_eq!(response.status(), StatusCode::Ok);
    }
}
