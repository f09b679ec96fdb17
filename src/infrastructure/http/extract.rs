//! Request Extractors
//!
//! 带校验的 JSON 请求体提取器

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::error::ApiError;

/// 反序列化 JSON 请求体并执行 `validator::Validate`
///
/// 拒绝未知字段需要在 DTO 上标注 `#[serde(deny_unknown_fields)]`。
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;

        value
            .validate()
            .map_err(|errors| ApiError::bad_request(validation_message(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

/// 保留 axum 拒绝原因自带的状态码
///
/// 反序列化数据错误（axum 默认 422）统一为 400；5xx（读取请求体失败等）视为 Undeclared
fn json_rejection(rejection: JsonRejection) -> ApiError {
    let status = match &rejection {
        JsonRejection::JsonDataError(_) => StatusCode::BAD_REQUEST,
        other => other.status(),
    };

    if status.is_server_error() {
        ApiError::internal(anyhow::anyhow!(rejection.body_text()))
    } else {
        ApiError::new(status, rejection.body_text())
    }
}

/// 将校验错误整理为一条消息，按字段路径排序，多条之间以 `; ` 分隔
///
/// 嵌套结构体和列表中的错误带上路径前缀，例如 `inner.name`、`items[0].name`
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, "", &mut messages);
    messages.sort();
    messages.join("; ")
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, messages: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                messages.extend(field_errors.iter().map(|error| match &error.message {
                    Some(message) => format!("{}: {}", path, message),
                    None => format!("{}: failed '{}' validation", path, error.code),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, messages),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{}[{}]", path, index), messages);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header, response::IntoResponse, routing::post, Router};
    use serde::Deserialize;
    use tower::util::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(deny_unknown_fields)]
    struct CreateProposal {
        #[validate(length(min = 1, message = "title should not be empty"))]
        title: String,
        #[validate(range(min = 1, max = 365))]
        due_in_days: u32,
    }

    async fn create(ValidatedJson(body): ValidatedJson<CreateProposal>) -> impl IntoResponse {
        format!("{}:{}", body.title, body.due_in_days)
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Reviewer {
        #[validate(length(min = 1, message = "name should not be empty"))]
        name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct AssignReviewers {
        #[validate(nested)]
        lead: Reviewer,
        #[validate(nested)]
        members: Vec<Reviewer>,
    }

    async fn assign(ValidatedJson(body): ValidatedJson<AssignReviewers>) -> impl IntoResponse {
        format!("{}+{}", body.lead.name, body.members.len())
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Attachment {
        #[allow(dead_code)]
        content: String,
    }

    async fn attach(ValidatedJson(_): ValidatedJson<Attachment>) -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }

    fn app() -> Router {
        Router::new()
            .route("/proposals", post(create))
            .route("/reviewers", post(assign))
            .route("/attachments", post(attach))
    }

    async fn send(body: &str, content_type: Option<&str>) -> (StatusCode, Option<ApiError>) {
        send_to("/proposals", body, content_type).await
    }

    async fn send_to(
        uri: &str,
        body: &str,
        content_type: Option<&str>,
    ) -> (StatusCode, Option<ApiError>) {
        let mut builder = axum::http::Request::builder().method("POST").uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();

        let response = app().oneshot(request).await.unwrap();
        (
            response.status(),
            response.extensions().get::<ApiError>().cloned(),
        )
    }

    fn message(fault: Option<ApiError>) -> String {
        match fault {
            Some(ApiError::Declared { message, .. }) => message,
            other => panic!("expected declared fault, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_body_reaches_handler() {
        let (status, fault) = send(
            r#"{"title":"Cloud migration","due_in_days":30}"#,
            Some("application/json"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(fault.is_none());
    }

    #[tokio::test]
    async fn test_constraint_violations_are_reported_sorted() {
        let (status, fault) =
            send(r#"{"title":"","due_in_days":0}"#, Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            message(fault),
            "due_in_days: failed 'range' validation; title: title should not be empty"
        );
    }

    #[tokio::test]
    async fn test_unknown_field_is_rejected() {
        let (status, fault) = send(
            r#"{"title":"x","due_in_days":3,"owner":"root"}"#,
            Some("application/json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message(fault).contains("owner"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, fault) = send("{not json", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(fault.is_some());
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let (status, _) = send(r#"{"title":"x","due_in_days":3}"#, None).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_nested_violations_carry_field_path() {
        let (status, fault) = send_to(
            "/reviewers",
            r#"{"lead":{"name":""},"members":[{"name":"ana"},{"name":""}]}"#,
            Some("application/json"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            message(fault),
            "lead.name: name should not be empty; members[1].name: name should not be empty"
        );
    }

    #[tokio::test]
    async fn test_oversized_body_keeps_payload_too_large() {
        // 超过 axum 默认的 2 MB 请求体上限
        let body = format!(r#"{{"content":"{}"}}"#, "a".repeat(3 * 1024 * 1024));
        let (status, fault) = send_to("/attachments", &body, Some("application/json")).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(fault.map(|fault| fault.status()), Some(StatusCode::PAYLOAD_TOO_LARGE));
    }
}
