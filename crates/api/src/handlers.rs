use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use ner::{Aggregator, EntitySummary, Pipeline, RowEntities, RowsReport, SUMMARY_FILENAME};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

pub struct AppState {
    /// None when the configured model failed to load
    pipeline: Option<Pipeline>,
    backend: String,
    metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(pipeline: Option<Pipeline>, backend: impl Into<String>) -> Self {
        Self {
            pipeline,
            backend: backend.into(),
            metrics: Metrics::new(),
        }
    }

    fn pipeline(&self) -> Result<&Pipeline, ApiError> {
        self.pipeline.as_ref().ok_or(ApiError::ModelUnavailable)
    }

    fn model_status(&self) -> ModelStatus {
        ModelStatus {
            backend: self.backend.clone(),
            loaded: self.pipeline.is_some(),
        }
    }

    /// Count the request, pass the result through
    fn track<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        self.metrics.record_request(result.is_ok());
        result
    }
}

#[derive(Serialize)]
struct ModelStatus {
    backend: String,
    loaded: bool,
}

#[derive(Serialize)]
struct RouteInfo {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    model: ModelStatus,
    routes: Vec<RouteInfo>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: ModelStatus,
}

#[derive(Deserialize)]
struct NerRequest {
    /// Anything other than a JSON string is treated as empty text
    #[serde(default)]
    text: serde_json::Value,
}

const ROUTES: [(&str, &str, &str); 6] = [
    ("GET", "/", "This route listing"),
    ("POST", "/ner", "Extract entities from {\"text\": ...}"),
    ("POST", "/upload-csv", "Extract entities from every row of a CSV file's 'text' column"),
    ("POST", "/download-summary-txt", "Download a plain-text entity summary of a CSV file"),
    ("GET", "/health", "Model status"),
    ("GET", "/stats", "Request and extraction counters"),
];

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        .route("/ner", post(perform_ner))
        .route("/upload-csv", post(upload_csv))
        .route("/download-summary-txt", post(download_summary_txt))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn service_info(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    let routes = ROUTES
        .iter()
        .map(|&(method, path, description)| RouteInfo {
            method,
            path,
            description,
        })
        .collect();

    Json(ServiceInfo {
        service: "Named Entity Recognition API",
        version: env!("CARGO_PKG_VERSION"),
        model: state.model_status(),
        routes,
    })
}

async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let model = state.model_status();
    let (code, status) = if model.loaded {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable")
    };

    (code, Json(HealthResponse { status, model }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn perform_ner(
    State(state): State<Arc<AppState>>,
    req: Result<Json<NerRequest>, JsonRejection>,
) -> Result<Json<EntitySummary>, ApiError> {
    let result = match req {
        Ok(Json(req)) => analyze_text(&state, &req.text).await,
        Err(rejection) => Err(rejection.into()),
    };
    state.track(result).map(Json)
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn upload_csv(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RowsReport>, ApiError> {
    let result = extract_rows(&state, multipart).await;
    state
        .track(result)
        .map(|rows| Json(RowsReport { result: rows }))
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
async fn download_summary_txt(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let result = extract_rows(&state, multipart).await;
    state.track(result).map(|rows| summary_attachment(&rows))
}

async fn analyze_text(
    state: &AppState,
    text: &serde_json::Value,
) -> Result<EntitySummary, ApiError> {
    let pipeline = state.pipeline()?;
    let timer = TimedOperation::start();

    let cleaned = ner::normalize_value(text);
    let entities = pipeline
        .analyze_normalized(&cleaned)
        .await
        .map_err(ApiError::Extraction)?;

    let mut aggregator = Aggregator::new();
    aggregator.record(&entities);
    let summary = aggregator.finish();

    state.metrics.record_extract(timer.elapsed(), 1, entities.len());
    tracing::info!(entities = entities.len(), labels = summary.labels().len(), "Processed text");

    Ok(EntitySummary::new(&summary, entities))
}

/// Plain-text report over every row, served as a download.
fn summary_attachment(rows: &[RowEntities]) -> Response {
    let mut aggregator = Aggregator::new();
    for row in rows {
        aggregator.record(&row.entities);
    }
    let report = ner::render_text(&aggregator.finish());

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", SUMMARY_FILENAME),
        ),
    ];
    (headers, report).into_response()
}

/// Shared CSV path: model check, upload, parse, extract per row.
async fn extract_rows(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Vec<RowEntities>, ApiError> {
    let pipeline = state.pipeline()?;
    let (file_name, bytes) = read_upload(multipart?).await?;

    let text_rows = ingest::CsvReader::read_text_column(&bytes)?;
    let timer = TimedOperation::start();

    let mut rows = Vec::with_capacity(text_rows.len());
    for text_row in text_rows {
        let row = pipeline
            .analyze_row(text_row.row, text_row.text)
            .await
            .map_err(ApiError::Extraction)?;
        rows.push(row);
    }

    let entities: usize = rows.iter().map(|r| r.entities.len()).sum();
    state.metrics.record_extract(timer.elapsed(), rows.len(), entities);
    tracing::info!(file = %file_name, rows = rows.len(), entities, "Processed CSV upload");

    Ok(rows)
}

/// Find the `file` field. Its name is checked before the body is read.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        ingest::validate_file_name(&file_name)?;

        let bytes = field.bytes().await?;
        return Ok((file_name, bytes));
    }

    Err(ApiError::MissingUpload)
}
