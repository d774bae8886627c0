//! 呼び出し元の identity を AuthCtx として extensions に入れる
//!
//! - 本人確認は外部 identity provider の責務。ここでは provider が発行した
//!   安定した user id を `Authorization: Bearer <userId>` で受け取るだけ。
//! - ヘッダが無いリクエストは匿名として通す (GET /discussions は匿名可)。
//!   認証が必要かどうかは handler 側の `AuthCtxExtractor` が決める。
//! - ヘッダがあるのに形式が不正な場合は 401 で止める。

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

pub fn apply(router: Router<AppState>) -> Router<AppState> {
    router.layer(middleware::from_fn(identity_middleware))
}

/// Parses the caller identity, if any.
///
/// - `Ok(None)`: anonymous
/// - `Ok(Some(ctx))`: identified caller
/// - `Err(..)`: header present but unusable
fn parse_identity(headers: &HeaderMap) -> Result<Option<AuthCtx>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let user_id = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthorized)?;

    Ok(Some(AuthCtx::new(user_id)))
}

async fn identity_middleware(mut req: Request<Body>, next: Next) -> Result<Response, AppError> {
    match parse_identity(req.headers()) {
        Ok(Some(auth_ctx)) => {
            // middleware → extractor への受け渡し
            req.extensions_mut().insert(auth_ctx);
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(path = %req.uri().path(), "malformed authorization header");
            return Err(err);
        }
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(parse_identity(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn bearer_value_becomes_the_user_id() {
        let ctx = parse_identity(&headers("Bearer u1")).unwrap().unwrap();
        assert_eq!(ctx.user_id, "u1");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert!(matches!(
            parse_identity(&headers("Basic dTE6cHc=")),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            parse_identity(&headers("Bearer   ")),
            Err(AppError::Unauthorized)
        ));
    }
}
