use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::admin::{AccessGate, AdminSessions, AuthError};
use super::domain::{
    ApplicationId, ApplicationStatus, Claim, ClaimCategory, DocumentSlot, FormPatch,
    UnknownVariant,
};
use super::drafts::{DraftId, DraftNotFound, DraftRegistry, DraftSubmitError};
use super::export::{ExportDocument, ExportFormat};
use super::filter::ApplicationFilter;
use super::repository::{
    ApplicationRepository, BlobStore, NotifyError, RepositoryError, StatusNotifier,
};
use super::service::{NominationService, ServiceError};
use super::uploads::{FileUpload, UploadError, MAX_UPLOAD_BYTES};
use super::wizard::WizardError;

/// Header carrying the form access code when one is configured.
pub const ACCESS_CODE_HEADER: &str = "x-access-code";

/// Shared handles behind every portal route.
pub struct PortalState<R, B: BlobStore, N> {
    pub service: Arc<NominationService<R, B, N>>,
    pub drafts: Arc<DraftRegistry<B>>,
    pub sessions: Arc<AdminSessions>,
    pub gate: Arc<AccessGate>,
}

impl<R, B: BlobStore, N> Clone for PortalState<R, B, N> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            drafts: self.drafts.clone(),
            sessions: self.sessions.clone(),
            gate: self.gate.clone(),
        }
    }
}

/// Router builder exposing the applicant, status, and admin endpoints.
pub fn portal_router<R, B, N>(state: PortalState<R, B, N>) -> Router
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let uploads = Router::new()
        .route(
            "/api/v1/drafts/:draft_id/documents/:slot",
            put(upload_document_handler::<R, B, N>).delete(clear_document_handler::<R, B, N>),
        )
        .route(
            "/api/v1/drafts/:draft_id/certificates/:category",
            post(upload_certificate_handler::<R, B, N>),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES * 2));

    Router::new()
        .route("/api/status", get(status_lookup_handler::<R, B, N>))
        .route("/api/v1/drafts", post(open_draft_handler::<R, B, N>))
        .route(
            "/api/v1/drafts/:draft_id",
            get(draft_handler::<R, B, N>).delete(abandon_draft_handler::<R, B, N>),
        )
        .route(
            "/api/v1/drafts/:draft_id/form",
            axum::routing::patch(patch_form_handler::<R, B, N>),
        )
        .route("/api/v1/drafts/:draft_id/next", post(next_step_handler::<R, B, N>))
        .route("/api/v1/drafts/:draft_id/prev", post(prev_step_handler::<R, B, N>))
        .route(
            "/api/v1/drafts/:draft_id/claims/:category",
            post(add_claim_handler::<R, B, N>),
        )
        .route(
            "/api/v1/drafts/:draft_id/claims/:category/:index",
            axum::routing::delete(remove_claim_handler::<R, B, N>),
        )
        .route("/api/v1/drafts/:draft_id/submit", post(submit_handler::<R, B, N>))
        .merge(uploads)
        .route("/api/v1/admin/login", post(login_handler::<R, B, N>))
        .route("/api/v1/admin/logout", post(logout_handler::<R, B, N>))
        .route(
            "/api/v1/admin/applications",
            get(list_applications_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/options",
            get(filter_options_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/:application_id",
            get(application_handler::<R, B, N>).delete(delete_application_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/status",
            put(update_status_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/comments",
            get(comments_handler::<R, B, N>).post(add_comment_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/email",
            post(send_email_handler::<R, B, N>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/export",
            get(export_applicant_handler::<R, B, N>),
        )
        .route("/api/v1/admin/exports/:format", get(export_handler::<R, B, N>))
        .route("/api/v1/admin/files", get(files_handler::<R, B, N>))
        .with_state(state)
}

/// JSON error body with the status code it maps to.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    payload: Value,
}

impl ApiError {
    fn new(status: StatusCode, message: impl std::fmt::Display) -> Self {
        Self {
            status,
            payload: json!({ "error": message.to_string() }),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.payload)).into_response()
    }
}

impl From<WizardError> for ApiError {
    fn from(error: WizardError) -> Self {
        let status = match &error {
            WizardError::ClaimLimitReached { .. } => StatusCode::CONFLICT,
            WizardError::ClaimNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let mut api = ApiError::new(status, &error);
        if let WizardError::Step { step, missing } = &error {
            api.payload["step"] = json!(step);
            api.payload["missing"] = json!(missing);
        }
        api
    }
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Rejected(rejected) => {
                ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, rejected)
            }
            storage @ UploadError::Storage(_) => ApiError::new(StatusCode::BAD_GATEWAY, storage),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Submission(err) => ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err),
            ServiceError::Repository(RepositoryError::NotFound) => {
                ApiError::new(StatusCode::NOT_FOUND, "application not found")
            }
            ServiceError::Repository(RepositoryError::Conflict) => {
                ApiError::new(StatusCode::CONFLICT, "application already exists")
            }
            ServiceError::Storage(err) => ApiError::new(StatusCode::BAD_GATEWAY, err),
            ServiceError::Notification(NotifyError::NotConfigured) => ApiError::new(
                StatusCode::BAD_GATEWAY,
                "Email service not configured. Please contact administrator.",
            ),
            ServiceError::Notification(err) => ApiError::new(StatusCode::BAD_GATEWAY, err),
            ServiceError::MissingToken => ApiError::new(StatusCode::BAD_REQUEST, error),
            ServiceError::UnknownToken => ApiError::new(StatusCode::NOT_FOUND, error),
            ServiceError::EmptyComment => ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, error),
            ServiceError::IncompleteDelete(ref report) => {
                let mut api = ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, &error);
                api.payload["report"] = json!(report);
                api
            }
            other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::new(StatusCode::UNAUTHORIZED, error)
    }
}

impl From<DraftNotFound> for ApiError {
    fn from(error: DraftNotFound) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, error)
    }
}

impl From<DraftSubmitError> for ApiError {
    fn from(error: DraftSubmitError) -> Self {
        match error {
            DraftSubmitError::NotFound(err) => err.into(),
            DraftSubmitError::AlreadySubmitted => ApiError::new(StatusCode::CONFLICT, error),
            DraftSubmitError::Wizard(err) => err.into(),
            DraftSubmitError::Service(err) => err.into(),
        }
    }
}

impl From<UnknownVariant> for ApiError {
    fn from(error: UnknownVariant) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, error)
    }
}

type ApiResult = Result<Response, ApiError>;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn require_admin<R, B: BlobStore, N>(
    state: &PortalState<R, B, N>,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    state.sessions.verify(bearer_token(headers))?;
    Ok(())
}

fn attachment(document: ExportDocument) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", document.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.body,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusQuery {
    pub(crate) token: Option<String>,
}

pub(crate) async fn status_lookup_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let token = query.token.unwrap_or_default();
    let view = state.service.lookup_status(&token)?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn open_draft_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let code = headers
        .get(ACCESS_CODE_HEADER)
        .and_then(|value| value.to_str().ok());
    state.gate.verify_access_code(code)?;

    let id = state.drafts.open(state.service.upload_tracker());
    let view = state.drafts.with_draft(&id, |draft| draft.view(&id))?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

pub(crate) async fn draft_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path(draft_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let id = DraftId(draft_id);
    let view = state.drafts.with_draft(&id, |draft| draft.view(&id))?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn patch_form_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path(draft_id): Path<String>,
    Json(patch): Json<FormPatch>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let id = DraftId(draft_id);
    let view = state.drafts.with_draft(&id, |draft| {
        draft.wizard_mut().form_mut().apply_patch(patch);
        draft.view(&id)
    })?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn next_step_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path(draft_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let id = DraftId(draft_id);
    let view = state.drafts.with_draft(&id, |draft| {
        draft.wizard_mut().next().map(|_| draft.view(&id))
    })??;
    Ok((StatusCode::OK, Json(view)).into_response())
}

pub(crate) async fn prev_step_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path(draft_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let id = DraftId(draft_id);
    let view = state.drafts.with_draft(&id, |draft| {
        draft.wizard_mut().prev();
        draft.view(&id)
    })?;
    Ok((StatusCode::OK, Json(view)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadQuery {
    file_name: Option<String>,
}

fn file_upload(headers: &HeaderMap, query: UploadQuery, body: Bytes) -> FileUpload {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");
    FileUpload::new(
        query.file_name.unwrap_or_default(),
        content_type,
        body.to_vec(),
    )
}

pub(crate) async fn upload_document_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path((draft_id, slot)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let slot: DocumentSlot = slot.parse()?;
    let upload = file_upload(&headers, query, body);
    let id = DraftId(draft_id);
    let (url, view) = state.drafts.with_draft(&id, |draft| {
        draft
            .upload_document(slot, upload)
            .map(|url| (url, draft.view(&id)))
    })??;
    Ok((StatusCode::OK, Json(json!({ "url": url, "draft": view }))).into_response())
}

pub(crate) async fn clear_document_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path((draft_id, slot)): Path<(String, String)>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let slot: DocumentSlot = slot.parse()?;
    let id = DraftId(draft_id);
    let (removed, view) = state.drafts.with_draft(&id, |draft| {
        let removed = draft.clear_document(slot);
        (removed, draft.view(&id))
    })?;
    Ok((
        StatusCode::OK,
        Json(json!({ "file_deleted": removed, "draft": view })),
    )
        .into_response())
}

pub(crate) async fn upload_certificate_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path((draft_id, category)): Path<(String, String)>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let category: ClaimCategory = category.parse()?;
    let upload = file_upload(&headers, query, body);
    let id = DraftId(draft_id);
    let url = state
        .drafts
        .with_draft(&id, |draft| draft.upload_certificate(category, upload))??;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))).into_response())
}

pub(crate) async fn add_claim_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path((draft_id, category)): Path<(String, String)>,
    Json(claim): Json<Claim>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let category: ClaimCategory = category.parse()?;
    let id = DraftId(draft_id);
    let (count, view) = state.drafts.with_draft(&id, |draft| {
        draft
            .add_claim(category, claim)
            .map(|count| (count, draft.view(&id)))
    })??;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "count": count, "draft": view })),
    )
        .into_response())
}

pub(crate) async fn remove_claim_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path((draft_id, category, index)): Path<(String, String, usize)>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let category: ClaimCategory = category.parse()?;
    let id = DraftId(draft_id);
    let (removed, view) = state.drafts.with_draft(&id, |draft| {
        draft
            .remove_claim(category, index)
            .map(|removed| (removed, draft.view(&id)))
    })??;
    Ok((
        StatusCode::OK,
        Json(json!({ "removed": removed, "draft": view })),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SubmitRequest {
    confirmed: bool,
}

pub(crate) async fn submit_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path(draft_id): Path<String>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let receipt = state
        .drafts
        .submit(&DraftId(draft_id), &state.service, request.confirmed)?;
    Ok((StatusCode::CREATED, Json(receipt)).into_response())
}

pub(crate) async fn abandon_draft_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Path(draft_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let report = state.drafts.abandon(&DraftId(draft_id))?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    password: String,
}

pub(crate) async fn login_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let token = state.sessions.login(&state.gate, &request.password)?;
    Ok((StatusCode::OK, Json(json!({ "token": token }))).into_response())
}

pub(crate) async fn logout_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    let token = bearer_token(&headers).ok_or(AuthError::MissingSession)?;
    state.sessions.logout(token);
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn list_applications_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Query(filter): Query<ApplicationFilter>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let total = state.service.list(&ApplicationFilter::default())?.len();
    let applications = state.service.list(&filter)?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "total": total,
            "showing": applications.len(),
            "applications": applications,
        })),
    )
        .into_response())
}

pub(crate) async fn filter_options_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let options = state.service.filter_options()?;
    Ok((StatusCode::OK, Json(options)).into_response())
}

pub(crate) async fn application_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let record = state.service.get(&ApplicationId(application_id))?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn delete_application_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let report = state
        .service
        .delete_application(&ApplicationId(application_id))?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdate {
    status: ApplicationStatus,
}

pub(crate) async fn update_status_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let record = state
        .service
        .update_status(&ApplicationId(application_id), update.status)?;
    Ok((StatusCode::OK, Json(record)).into_response())
}

pub(crate) async fn comments_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let comments = state.service.comments(&ApplicationId(application_id))?;
    Ok((StatusCode::OK, Json(comments)).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewComment {
    comment_text: String,
    #[serde(default)]
    is_internal: bool,
    #[serde(default)]
    created_by: String,
}

pub(crate) async fn add_comment_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(comment): Json<NewComment>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let stored = state.service.add_comment(
        &ApplicationId(application_id),
        &comment.comment_text,
        comment.is_internal,
        &comment.created_by,
    )?;
    Ok((StatusCode::CREATED, Json(stored)).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EmailRequest {
    comment: Option<String>,
}

pub(crate) async fn send_email_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Json(request): Json<EmailRequest>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let message = state
        .service
        .send_status_email(&ApplicationId(application_id), request.comment.as_deref())?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "to": message.to,
            "subject": message.subject,
        })),
    )
        .into_response())
}

pub(crate) async fn export_applicant_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let document = state
        .service
        .export_applicant(&ApplicationId(application_id), Utc::now().date_naive())?;
    Ok(attachment(document))
}

pub(crate) async fn export_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
    Path(format): Path<String>,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let format: ExportFormat = format.parse()?;
    let document = state.service.export(format, Utc::now().date_naive())?;
    Ok(attachment(document))
}

pub(crate) async fn files_handler<R, B, N>(
    State(state): State<PortalState<R, B, N>>,
    headers: HeaderMap,
) -> ApiResult
where
    R: ApplicationRepository + 'static,
    B: BlobStore + 'static,
    N: StatusNotifier + 'static,
{
    require_admin(&state, &headers)?;
    let files = state.service.uploaded_files()?;
    Ok((StatusCode::OK, Json(files)).into_response())
}
