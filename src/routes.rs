use std::sync::Arc;

use actix_web::http::header::{self, ContentType};
use actix_web::{web, HttpResponse};
use chrono::Local;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::models::{Sighting, SortOrder, SubmitTimestamp};
use crate::report::{FullScanReport, MonthlyReport};
use crate::repo::{RepoResult, SightingRepo};
use crate::views::stats::{self, StatsQuery};
use crate::views::submit::{self, SightingForm, RECENT_LIMIT};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("invalid submission: {err}")).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(format!("invalid selection: {err}")).into()),
    )
    .service(web::resource("/").route(web::get().to(index)))
    .service(
        web::resource("/submit")
            .route(web::get().to(submit_page))
            .route(web::post().to(submit_sighting)),
    )
    .service(web::resource("/stats").route(web::get().to(stats_page)));

    #[cfg(feature = "embed-assets")]
    cfg.route("/static/{file:.*}", web::get().to(crate::assets::serve));
}

/// Shared handles, built once at startup and cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn SightingRepo>,
    pub report: Arc<dyn MonthlyReport>,
}

impl AppState {
    /// Uses the full-scan monthly report over `repo`.
    pub fn new(repo: Arc<dyn SightingRepo>) -> Self {
        let report = Arc::new(FullScanReport::new(repo.clone()));
        Self { repo, report }
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

pub async fn index() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/submit"))
        .finish()
}

async fn recent(data: &AppState) -> RepoResult<Vec<Sighting>> {
    let rows = data.repo.select_recent(SortOrder::newest_first(), RECENT_LIMIT).await;
    if let Err(e) = &rows {
        warn!(error = %e, "could not load recent sightings");
    }
    rows
}

pub async fn submit_page(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = recent(&data).await;
    Ok(html(submit::render(Local::now().naive_local(), None, &rows)))
}

pub async fn submit_sighting(
    data: web::Data<AppState>,
    form: web::Form<SightingForm>,
) -> Result<HttpResponse, ApiError> {
    let record = form.into_inner().into_new_sighting(SubmitTimestamp::now());
    let stamp = record.submit_date_time;
    let result = data.repo.insert(record).await;
    match &result {
        Ok(rows) if !rows.is_empty() => info!(submitted_at = %stamp, "sighting stored"),
        Ok(_) => warn!(submitted_at = %stamp, "store acknowledged insert with no rows"),
        Err(e) => error!(submitted_at = %stamp, error = %e, "sighting insert failed"),
    }
    let notice = submit::insert_notice(&result);

    // The recent list is read regardless of how the insert went.
    let rows = recent(&data).await;
    Ok(html(submit::render(Local::now().naive_local(), Some(&notice), &rows)))
}

pub async fn stats_page(
    data: web::Data<AppState>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = Local::now().date_naive();
    let month = query.into_inner().resolve(today).map_err(ApiError::BadRequest)?;
    let rows = data.report.sightings_for_month(month).await;
    if let Err(e) = &rows {
        warn!(error = %e, year = month.year, month = month.month, "could not load monthly sightings");
    }
    Ok(html(stats::render(today, month, &rows)))
}
