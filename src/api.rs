use crate::services::config_store::ConfigStore;
use actix_web::{HttpResponse, Responder, web};
use log::{debug, error};

/// HTTP handlers of the device configuration service
#[derive(Clone)]
pub struct Api {
    pub store: ConfigStore,
}

impl Api {
    pub fn new(store: ConfigStore) -> Self {
        Api { store }
    }

    /// Register all routes of the service
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/api/config", web::get().to(Api::config))
            .route("/version", web::get().to(Api::version));
    }

    /// `GET /api/config[?field=value&...]`
    ///
    /// Applies the query pairs, if any, and answers with the resulting configuration.
    pub async fn config(
        query: web::Query<Vec<(String, String)>>,
        api: web::Data<Self>,
    ) -> impl Responder {
        debug!("config() called with {:?}", query.as_slice());

        if query.is_empty() {
            return HttpResponse::Ok().json(api.store.snapshot());
        }

        match api.store.apply(&query) {
            Ok(config) => HttpResponse::Ok().json(config),
            Err(e) => {
                error!("config update failed: {e:#}");
                HttpResponse::BadRequest().body(format!("{e:#}"))
            }
        }
    }

    pub async fn version() -> impl Responder {
        HttpResponse::Ok().body(env!("CARGO_PKG_VERSION"))
    }
}
