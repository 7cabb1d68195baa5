use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    extract::{Path as UrlPath, Request, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::warn;

use crate::{error::FileError, AppState};

/// Join `requested` onto `root` without ever climbing above it.
///
/// Works lexically, so it also rejects paths to files that do not exist yet.
pub fn resolve_within(root: &Path, requested: &str) -> Result<PathBuf, FileError> {
    let mut relative = PathBuf::new();
    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !relative.pop() {
                    return Err(FileError::AccessDenied);
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(FileError::AccessDenied),
        }
    }
    Ok(root.join(relative))
}

/// Resolve an artifact to a real file inside the output directory. Symlinks
/// pointing outside the directory are denied like `..` segments.
pub async fn locate_artifact(root: &Path, requested: &str) -> Result<PathBuf, FileError> {
    let candidate = resolve_within(root, requested).map_err(|e| {
        warn!("Path traversal attempt: {:?}", requested);
        e
    })?;

    let canonical_root = tokio::fs::canonicalize(root)
        .await
        .map_err(|_| FileError::NotFound)?;
    let canonical = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(|_| FileError::NotFound)?;
    if !canonical.starts_with(&canonical_root) {
        warn!("Artifact {:?} resolves outside the output directory", requested);
        return Err(FileError::AccessDenied);
    }

    let is_file = tokio::fs::metadata(&canonical)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(FileError::NotFound);
    }
    Ok(canonical)
}

async fn serve(path: PathBuf, request: Request) -> Response {
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new).into_response(),
        Err(never) => match never {},
    }
}

#[utoipa::path(
    get,
    path = "/output/{file}",
    params(("file" = String, Path, description = "Artifact file name")),
    responses(
        (status = 200, description = "Artifact contents"),
        (status = 403, description = "Path escapes the output directory"),
        (status = 404, description = "No such artifact")
    ),
    tag = "files"
)]
pub async fn serve_output(
    State(state): State<AppState>,
    UrlPath(file): UrlPath<String>,
    request: Request,
) -> Result<Response, FileError> {
    let path = locate_artifact(&state.config.output.dir, &file).await?;
    Ok(serve(path, request).await)
}

#[utoipa::path(
    get,
    path = "/download/{file}",
    params(("file" = String, Path, description = "Artifact file name")),
    responses(
        (status = 200, description = "Artifact sent as an attachment"),
        (status = 403, description = "Path escapes the output directory"),
        (status = 404, description = "No such artifact")
    ),
    tag = "files"
)]
pub async fn download(
    State(state): State<AppState>,
    UrlPath(file): UrlPath<String>,
    request: Request,
) -> Result<Response, FileError> {
    let path = locate_artifact(&state.config.output.dir, &file).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().replace('"', ""))
        .unwrap_or_else(|| "download".to_string());

    let mut response = serve(path, request).await;
    if response.status().is_success() {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{name}\"")) {
            response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}
