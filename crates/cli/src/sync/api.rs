// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/reply endpoints and interpretation of their responses.
//!
//! Route builders percent-encode every caller-supplied segment. Response
//! interpreters turn a completed call into either a payload or a reason code;
//! malformed bodies are treated as empty payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use netsync_core::{FileChange, VersionHistory};

use super::events::reason;
use super::http::{HttpRequest, HttpResponse, HttpResult};

fn enc(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// `GET /status`
pub fn status() -> HttpRequest {
    HttpRequest::get("/status")
}

/// `POST /register {handle, email?, browserId}`
pub fn register(handle: &str, email: Option<&str>, client_id: &str) -> HttpRequest {
    let mut body = json!({ "handle": handle, "browserId": client_id });
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        body["email"] = Value::String(email.to_string());
    }
    HttpRequest::post("/register").with_body(body)
}

/// `POST /recover {recoveryCode, browserId}`
pub fn recover(recovery_code: &str, client_id: &str) -> HttpRequest {
    HttpRequest::post("/recover")
        .with_body(json!({ "recoveryCode": recovery_code, "browserId": client_id }))
}

/// `GET /player/{handle}`
pub fn player(handle: &str) -> HttpRequest {
    HttpRequest::get(format!("/player/{}", enc(handle)))
}

/// `GET /email/{email}`
pub fn email(email: &str) -> HttpRequest {
    HttpRequest::get(format!("/email/{}", enc(email)))
}

/// `PUT /filesystem/{token} {filesystem}`
pub fn put_filesystem(token: &str, filesystem: Value) -> HttpRequest {
    HttpRequest::put(format!("/filesystem/{}", enc(token)))
        .with_token(token)
        .with_body(json!({ "filesystem": filesystem }))
}

/// `GET /filesystem/{token}`
pub fn get_filesystem(token: &str) -> HttpRequest {
    HttpRequest::get(format!("/filesystem/{}", enc(token))).with_token(token)
}

/// `POST /files/{token}` with the change as body.
pub fn write_file(token: &str, change: &FileChange) -> HttpRequest {
    let body = serde_json::to_value(change).unwrap_or_else(|_| json!({ "path": change.path }));
    HttpRequest::post(format!("/files/{}", enc(token)))
        .with_token(token)
        .with_body(body)
}

/// `DELETE /files/{token}/{path}`
pub fn delete_file(token: &str, path: &str) -> HttpRequest {
    HttpRequest::delete(format!("/files/{}/{}", enc(token), enc(path))).with_token(token)
}

/// `POST /dirs/{token} {path}`
pub fn create_directory(token: &str, path: &str) -> HttpRequest {
    HttpRequest::post(format!("/dirs/{}", enc(token)))
        .with_token(token)
        .with_body(json!({ "path": path }))
}

/// `DELETE /dirs/{token}/{path}`
pub fn remove_directory(token: &str, path: &str) -> HttpRequest {
    HttpRequest::delete(format!("/dirs/{}/{}", enc(token), enc(path))).with_token(token)
}

/// `GET /versions/{token}/{path}`
pub fn versions(token: &str, path: &str) -> HttpRequest {
    HttpRequest::get(format!("/versions/{}/{}", enc(token), enc(path))).with_token(token)
}

/// `POST /versions/{token}/{path}/restore/{version}`
pub fn restore(token: &str, path: &str, version: u64) -> HttpRequest {
    HttpRequest::post(format!(
        "/versions/{}/{}/restore/{}",
        enc(token),
        enc(path),
        version
    ))
    .with_token(token)
}

/// Body of `/register` and `/recover` responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountResponse {
    pub success: bool,
    pub handle: String,
    pub email: String,
    pub recovery_code: String,
    pub session_token: String,
    pub error: Option<String>,
}

/// Body shape used by failed calls.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Reason code for a failed call: the backend's `error` (or `message`)
/// field when present, else `request_failed`.
pub fn failure_reason(response: &HttpResponse) -> String {
    let body: ErrorBody = response.json_or_default();
    body.error
        .or(body.message)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| reason::REQUEST_FAILED.to_string())
}

/// Interprets a registration or recovery call.
///
/// Success requires status 200, `success: true`, and a non-empty token.
/// Returns the parsed body and the raw payload.
pub fn interpret_account(
    result: &HttpResult<HttpResponse>,
) -> Result<(AccountResponse, Value), String> {
    let response = match result {
        Ok(r) => r,
        Err(_) => return Err(reason::REQUEST_FAILED.to_string()),
    };
    if !response.is_ok() {
        return Err(failure_reason(response));
    }
    let account: AccountResponse = response.json_or_default();
    if !account.success || account.session_token.is_empty() {
        return Err(account
            .error
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| reason::REQUEST_FAILED.to_string()));
    }
    let payload = response.json_value().unwrap_or(Value::Null);
    Ok((account, payload))
}

/// Interprets a handle or contact availability check.
///
/// 404 means available; any other status means taken.
pub fn interpret_availability(result: &HttpResult<HttpResponse>) -> (bool, Option<String>) {
    match result {
        Ok(r) if r.status == 404 => (true, None),
        Ok(_) => (false, Some(reason::TAKEN.to_string())),
        Err(_) => (false, Some(reason::REQUEST_FAILED.to_string())),
    }
}

/// Interprets a call whose only outcome is success or a reason.
pub fn interpret_ack(result: &HttpResult<HttpResponse>) -> Result<(), String> {
    match result {
        Ok(r) if r.is_ok() => Ok(()),
        Ok(r) => Err(failure_reason(r)),
        Err(_) => Err(reason::REQUEST_FAILED.to_string()),
    }
}

/// Interprets a version history fetch.
///
/// A 200 with an unreadable body yields an empty history for `path`.
pub fn interpret_versions(
    result: &HttpResult<HttpResponse>,
    path: &str,
) -> Result<VersionHistory, String> {
    interpret_ack(result)?;
    let mut history: VersionHistory = match result {
        Ok(r) => r.json_or_default(),
        Err(_) => VersionHistory::default(),
    };
    if history.path.is_empty() {
        history.path = path.to_string();
    }
    Ok(history)
}

/// Interprets a full filesystem fetch, returning the `filesystem` field
/// (or the whole body if it has no such field).
pub fn interpret_filesystem(result: &HttpResult<HttpResponse>) -> Result<Value, String> {
    interpret_ack(result)?;
    let body = match result {
        Ok(r) => r.json_value().unwrap_or(Value::Null),
        Err(_) => Value::Null,
    };
    match body {
        Value::Object(mut map) if map.contains_key("filesystem") => {
            Ok(map.remove("filesystem").unwrap_or(Value::Null))
        }
        Value::Null => Err(reason::REQUEST_FAILED.to_string()),
        other => Ok(other),
    }
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
