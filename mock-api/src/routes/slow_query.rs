use actix_web::{HttpResponse, get, web};
use payloads::requests;

use crate::Store;

use super::APIError;

#[tracing::instrument(skip(store))]
#[get("/slow_query/list")]
pub async fn list(
    query: web::Query<requests::SlowQueryList>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let queries = store.slow_query_list(&query)?;
    tracing::debug!(count = queries.len(), "listed slow queries");
    Ok(HttpResponse::Ok().json(queries))
}
