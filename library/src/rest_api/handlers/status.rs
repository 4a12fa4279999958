use actix_web::HttpResponse;

pub const LIVENESS: &str = "It works!";

/// Liveness probe
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(LIVENESS)
}
