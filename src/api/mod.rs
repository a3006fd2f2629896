// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web layer over `OrderLifecycle`. Each route builds one
// `OrderCommand` (or a read) and returns the resulting order as JSON;
// errors map to status codes in `error.rs`.
//
// ============================================================================

mod error;

use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::domain::order::{
    AddressFields, NewOrder, NewOrderItem, OrderCommand, OrderError, OrderLifecycle,
};
use crate::metrics::{self, Metrics};

type Engine = web::Data<Arc<OrderLifecycle>>;

/// Body of `POST /api/v1/orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub total_price: Decimal,
    pub items: Option<Vec<Option<NewOrderItem>>>,
}

/// Register the order routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(list_orders))
            .route("/{order_id}", web::get().to(get_order))
            .route("/{order_id}/addresses", web::post().to(add_delivery_address))
            .route(
                "/{order_id}/addresses/{address_id}",
                web::put().to(update_delivery_address),
            )
            .route("/{order_id}/process", web::put().to(process_order))
            .route("/{order_id}/ship", web::put().to(ship_order))
            .route("/{order_id}/deliver", web::put().to(deliver_order))
            .route("/{order_id}/cancel", web::put().to(cancel_order)),
    );
}

/// Serve the API (plus `/health` and, when enabled, `/metrics`) until shutdown.
pub async fn serve(
    config: &ServerConfig,
    engine: Arc<OrderLifecycle>,
    metrics: Arc<Metrics>,
    metrics_enabled: bool,
) -> std::io::Result<()> {
    tracing::info!("🚀 Order API listening on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(web::Data::new(engine.clone()))
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::PayloadConfig::new(64 * 1024))
            .configure(configure)
            .route("/health", web::get().to(metrics::health_handler));
        if metrics_enabled {
            app = app.route("/metrics", web::get().to(metrics::metrics_handler));
        }
        app
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn create_order(
    engine: Engine,
    body: web::Json<Option<CreateOrderRequest>>,
) -> Result<HttpResponse, OrderError> {
    let (order, items) = match body.into_inner() {
        Some(request) => (
            Some(NewOrder {
                customer_id: request.customer_id,
                total_price: request.total_price,
            }),
            request.items,
        ),
        None => (None, None),
    };

    let order = engine
        .execute(OrderCommand::PlaceOrder { order, items })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn list_orders(engine: Engine) -> Result<HttpResponse, OrderError> {
    Ok(HttpResponse::Ok().json(engine.list().await?))
}

async fn get_order(engine: Engine, path: web::Path<Uuid>) -> Result<HttpResponse, OrderError> {
    Ok(HttpResponse::Ok().json(engine.get(path.into_inner()).await?))
}

async fn add_delivery_address(
    engine: Engine,
    path: web::Path<Uuid>,
    body: web::Json<AddressFields>,
) -> Result<HttpResponse, OrderError> {
    let order = engine
        .execute(OrderCommand::AddDeliveryAddress {
            order_id: path.into_inner(),
            address: body.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn update_delivery_address(
    engine: Engine,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<AddressFields>,
) -> Result<HttpResponse, OrderError> {
    let (order_id, address_id) = path.into_inner();
    let order = engine
        .execute(OrderCommand::UpdateDeliveryAddress {
            order_id,
            address_id,
            address: body.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn process_order(engine: Engine, path: web::Path<Uuid>) -> Result<HttpResponse, OrderError> {
    let order = engine
        .execute(OrderCommand::ProcessPending {
            order_id: path.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn ship_order(engine: Engine, path: web::Path<Uuid>) -> Result<HttpResponse, OrderError> {
    let order = engine
        .execute(OrderCommand::SendOutForDelivery {
            order_id: path.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn deliver_order(engine: Engine, path: web::Path<Uuid>) -> Result<HttpResponse, OrderError> {
    let order = engine
        .execute(OrderCommand::MarkDelivered {
            order_id: path.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

/// The reason is the raw request body.
async fn cancel_order(
    engine: Engine,
    path: web::Path<Uuid>,
    reason: String,
) -> Result<HttpResponse, OrderError> {
    let order = engine
        .execute(OrderCommand::CancelOrder {
            order_id: path.into_inner(),
            reason,
        })
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::testing::FakeInventory;
    use crate::domain::order::{Order, OrderStatus};
    use crate::inventory::InventoryFailure;
    use crate::store::InMemoryOrderStore;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::json;

    fn engine(inventory: Arc<FakeInventory>) -> Arc<OrderLifecycle> {
        Arc::new(OrderLifecycle::new(
            Arc::new(InMemoryOrderStore::new()),
            inventory,
            Arc::new(Metrics::new().unwrap()),
        ))
    }

    fn create_body() -> serde_json::Value {
        json!({
            "customerId": 42,
            "totalPrice": "59.97",
            "items": [
                {"productId": 101, "quantity": 2},
                {"productId": 102, "quantity": 1}
            ]
        })
    }

    #[actix_web::test]
    async fn test_create_then_get_order() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine(Arc::new(FakeInventory::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(create_body())
            .to_request();
        let created: Order = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created.status, OrderStatus::OrderPlaced);
        assert_eq!(created.items.len(), 2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/orders/{}", created.id))
            .to_request();
        let fetched: Order = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched, created);

        let req = test::TestRequest::get().uri("/api/v1/orders").to_request();
        let all: Vec<Order> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.len(), 1);
    }

    #[actix_web::test]
    async fn test_create_without_items_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine(Arc::new(FakeInventory::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(json!({"customerId": 42, "items": []}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Order must contain at least one item.");
    }

    #[actix_web::test]
    async fn test_inventory_unreachable_is_service_unavailable() {
        let inventory = Arc::new(FakeInventory::new());
        inventory.fail_reserve(InventoryFailure::Unavailable("connection refused".to_string()));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine(inventory)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(create_body())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn test_lifecycle_routes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine(Arc::new(FakeInventory::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(create_body())
            .to_request();
        let order: Order = test::call_and_read_body_json(&app, req).await;
        let base = format!("/api/v1/orders/{}", order.id);

        let req = test::TestRequest::post()
            .uri(&format!("{}/addresses", base))
            .set_json(json!({
                "streetName": "Haut str",
                "streetNumber": "10",
                "city": "Berlin",
                "state": "Berlin",
                "zipCode": "10115"
            }))
            .to_request();
        let order: Order = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order.delivery_addresses.len(), 1);
        let address_id = order.delivery_addresses[0].id;

        let req = test::TestRequest::put()
            .uri(&format!("{}/addresses/{}", base, address_id))
            .set_json(json!({
                "streetName": "Alvis str.",
                "streetNumber": "2",
                "city": "Berlin",
                "state": "Berlin",
                "zipCode": "10200"
            }))
            .to_request();
        let order: Order = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order.delivery_addresses[0].fields.zip_code, "10200");

        for (step, expected) in [
            ("process", OrderStatus::PendingToProcessing),
            ("ship", OrderStatus::OutForDelivery),
            ("deliver", OrderStatus::Delivered),
        ] {
            let req = test::TestRequest::put()
                .uri(&format!("{}/{}", base, step))
                .to_request();
            let order: Order = test::call_and_read_body_json(&app, req).await;
            assert_eq!(order.status, expected);
        }

        let req = test::TestRequest::put()
            .uri(&format!("{}/deliver", base))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_cancel_takes_plain_text_reason() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine(Arc::new(FakeInventory::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(create_body())
            .to_request();
        let order: Order = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/orders/{}/cancel", order.id))
            .set_payload("changed mind")
            .to_request();
        let cancelled: Order = test::call_and_read_body_json(&app, req).await;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("changed mind"));
    }

    #[actix_web::test]
    async fn test_unknown_address_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(engine(Arc::new(FakeInventory::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/orders")
            .set_json(create_body())
            .to_request();
        let order: Order = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/orders/{}/addresses/{}", order.id, Uuid::new_v4()))
            .set_json(json!({
                "streetName": "x",
                "streetNumber": "1",
                "city": "c",
                "state": "s",
                "zipCode": "z"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
