//! Route handlers

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ApiError;
use super::AppState;
use crate::domain::result::Error;
use crate::domain::{ImageUpload, Role, ScanRecord, ScanSubmission};

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Name of the multipart part carrying the image
pub const IMAGE_FIELD: &str = "scanImage";

/// Extract the credential from the Authorization header.
///
/// The `Bearer` scheme is matched case-insensitively. A header with any other
/// scheme is returned whole, so it fails verification (403) rather than
/// counting as absent (401).
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?
        .trim();
    match value.split_once(char::is_whitespace) {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => Some(token.trim()),
        _ if value.eq_ignore_ascii_case("bearer") => Some(""),
        _ => Some(value),
    }
}

/// Accepts both the web client's field names and the descriptive ones
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    identity: Option<String>,
    #[serde(alias = "password")]
    secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    role: Role,
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body.map_err(|e| Error::validation(e.body_text()))?;
    let identity = req
        .identity
        .ok_or_else(|| Error::validation("missing required field: email"))?;
    let secret = req
        .secret
        .ok_or_else(|| Error::validation("missing required field: password"))?;

    let credential = state.ctx.auth_service.authenticate(&identity, &secret).await?;
    Ok(Json(LoginResponse {
        token: credential.token,
        role: credential.role,
    }))
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let token = extract_bearer_token(&headers);
    // Reject before reading a potentially large body
    state.ctx.authorizer.authorize(token, Role::Technician)?;

    let mut multipart = multipart.map_err(|e| Error::validation(e.body_text()))?;
    let mut submission = ScanSubmission::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let content_type = field.content_type().map(str::to_string);
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::validation(e.body_text()))?;
                let mut upload = ImageUpload::new(bytes.to_vec());
                if let Some(ct) = content_type {
                    upload = upload.with_content_type(ct);
                }
                if let Some(name) = filename {
                    upload = upload.with_filename(name);
                }
                image = Some(upload);
            }
            "patientName" | "patientId" | "scanType" | "region" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Error::validation(e.body_text()))?;
                let slot = match name.as_str() {
                    "patientName" => &mut submission.patient_name,
                    "patientId" => &mut submission.patient_id,
                    "scanType" => &mut submission.scan_type,
                    _ => &mut submission.region,
                };
                *slot = Some(value);
            }
            _ => {}
        }
    }

    let record = state.ctx.ingest_service.ingest(token, &submission, image).await?;
    Ok(Json(json!({
        "message": "Scan uploaded successfully",
        "id": record.id,
    })))
}

/// GET /scans
pub async fn list_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ScanRecord>>> {
    let scans = state
        .ctx
        .scan_service
        .list_scans(extract_bearer_token(&headers))
        .await?;
    Ok(Json(scans))
}

/// GET /generate-pdf/{id}
pub async fn generate_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let report = state
        .ctx
        .report_service
        .generate_report(extract_bearer_token(&headers), &id)
        .await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.filename))
        .map_err(|_| Error::Render("report filename is not a valid header".to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(report.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response())
}

/// GET /images/{folder}/{file}, public like a hosted object URL
pub async fn serve_image(
    State(state): State<AppState>,
    Path((folder, file)): Path<(String, String)>,
) -> ApiResult<Response> {
    let store = state
        .ctx
        .local_images
        .as_ref()
        .ok_or_else(|| Error::not_found("images are not served locally"))?;
    let bytes = store
        .read_object(&folder, &file)
        .await
        .map_err(|_| Error::not_found(format!("image {}/{}", folder, file)))?;

    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer  abc.def "));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("BEARER abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn test_other_schemes_are_kept_as_invalid_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer_token(&headers), Some("Token abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(extract_bearer_token(&headers), Some("Basic dXNlcjpwdw=="));

        // Scheme without a token is still a missing credential
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(extract_bearer_token(&headers), Some(""));
    }

    #[test]
    fn test_login_accepts_both_field_spellings() {
        let a: LoginRequest = serde_json::from_str(r#"{"email":"a@x","password":"p"}"#).unwrap();
        let b: LoginRequest = serde_json::from_str(r#"{"identity":"a@x","secret":"p"}"#).unwrap();
        assert_eq!(a.identity, b.identity);
        assert_eq!(a.secret, b.secret);
    }
}
