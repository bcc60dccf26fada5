pub mod conprof;
pub mod diagnose;
pub mod slow_query;

use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, http::StatusCode, web,
};
use payloads::responses::ErrorBody;

use crate::store::{InjectedFailure, StoreError};

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(health_check)
        .service(slow_query::list)
        .service(conprof::group_profiles)
        .service(conprof::get_config)
        .service(conprof::update_config)
        .service(conprof::estimate_size)
        .service(diagnose::report_status)
        .service(diagnose::report_detail)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("Bad request")]
    BadRequest(#[source] anyhow::Error),
    #[error("Not found")]
    NotFound(#[source] anyhow::Error),
    #[error("{}", .0.body.message)]
    Injected(InjectedFailure),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl APIError {
    fn code(&self) -> &str {
        match self {
            Self::BadRequest(_) => "common.bad_request",
            Self::NotFound(_) => "common.not_found",
            Self::Injected(failure) => &failure.body.code,
            Self::UnexpectedError(_) => "common.unknown",
        }
    }
}

impl ResponseError for APIError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Injected(failure) => StatusCode::from_u16(failure.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let message = match self {
            Self::BadRequest(e) | Self::NotFound(e) => format!("{self}: {e}"),
            _ => self.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            code: self.code().to_string(),
            error: true,
            message,
        })
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Injected(failure) => APIError::Injected(failure),
            StoreError::ReportNotFound(_) => APIError::NotFound(e.into()),
            StoreError::InvalidTimeRange | StoreError::ReportNotReady(_) => {
                APIError::BadRequest(e.into())
            }
        }
    }
}
