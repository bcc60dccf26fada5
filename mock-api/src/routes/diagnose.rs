use actix_web::{HttpResponse, get, web};
use payloads::ReportId;

use crate::Store;

use super::APIError;

/// Each call moves generation forward, so polling clients see progress.
#[tracing::instrument(skip(store))]
#[get("/diagnose/reports/{id}/status")]
pub async fn report_status(
    id: web::Path<String>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let status = store.report_status(&ReportId(id.into_inner()))?;
    tracing::debug!(progress = status.progress);
    Ok(HttpResponse::Ok().json(status))
}

#[tracing::instrument(skip(store))]
#[get("/diagnose/reports/{id}/detail")]
pub async fn report_detail(
    id: web::Path<String>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let html = store.report_detail(&ReportId(id.into_inner()))?;
    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}
