use actix_web::{HttpResponse, get, post, web};
use payloads::requests;

use crate::Store;

use super::APIError;

#[tracing::instrument(skip(store))]
#[get("/continuous_profiling/group_profiles")]
pub async fn group_profiles(
    query: web::Query<requests::GroupProfiles>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    let profiles = store.group_profiles(&query)?;
    Ok(HttpResponse::Ok().json(profiles))
}

#[tracing::instrument(skip(store))]
#[get("/continuous_profiling/config")]
pub async fn get_config(
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    Ok(HttpResponse::Ok().json(store.config()?))
}

#[tracing::instrument(skip(store), ret)]
#[post("/continuous_profiling/config")]
pub async fn update_config(
    details: web::Json<requests::UpdateNgMonitoringConfig>,
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    store.update_config(&details)?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(store))]
#[get("/continuous_profiling/estimate_size")]
pub async fn estimate_size(
    store: web::Data<Store>,
) -> Result<HttpResponse, APIError> {
    Ok(HttpResponse::Ok().json(store.estimate_size()?))
}
