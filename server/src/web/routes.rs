// server/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{adoption_handlers, listing_handlers, order_handlers};

// In a real deployment this might also check store connectivity.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` (and the HTTP tests) to configure services for the
// Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Listing Routes
      .service(
        web::scope("/listings")
          .route("", web::post().to(listing_handlers::create_listing_handler))
          .route("/{listing_id}", web::get().to(listing_handlers::get_listing_handler))
          .route(
            "/{listing_id}/status",
            web::post().to(listing_handlers::change_listing_status_handler),
          )
          .route(
            "/{listing_id}/adoptions",
            web::post().to(adoption_handlers::open_adoption_handler),
          ),
      )
      // Adoption Case Routes
      .service(
        web::scope("/adoptions")
          .route("/{case_id}", web::get().to(adoption_handlers::get_adoption_handler))
          .route(
            "/{case_id}/decision",
            web::post().to(adoption_handlers::decide_adoption_handler),
          )
          .route(
            "/{case_id}/cancel",
            web::post().to(adoption_handlers::cancel_adoption_handler),
          ),
      )
      // Order Routes
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route(
            "/{order_id}/payment-callback",
            web::post().to(order_handlers::payment_callback_handler),
          )
          .route(
            "/{order_id}/fulfillment",
            web::post().to(order_handlers::advance_fulfillment_handler),
          )
          .route(
            "/{order_id}/dead-letters",
            web::get().to(order_handlers::list_dead_letters_handler),
          ),
      ),
  );
}
