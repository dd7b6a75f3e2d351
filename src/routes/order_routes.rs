//! Order endpoints: list, create, lookup and upstream price query.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::metrics::{BusinessEvent, FailureReason};
use crate::models::{Currency, NewOrder, Order, ProductCategory};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// Upper bound on orders returned by the list endpoint.
pub const LIST_LIMIT: usize = 200;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/:id", get(get_order))
        .route("/api/orders/price/:item", get(get_price))
}

#[derive(Deserialize, Debug, Default)]
pub struct CreateOrderRequest {
    pub item: Option<String>,
    pub price: Option<serde_json::Value>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub customer: Option<String>,
}

impl CreateOrderRequest {
    pub fn category(&self) -> ProductCategory {
        ProductCategory::parse(self.category.as_deref())
    }

    /// Checks item and price, returning a message suitable for a 400 body.
    pub fn validate(self) -> Result<NewOrder, &'static str> {
        let category = self.category();
        let item = self
            .item
            .as_deref()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .ok_or("item is required")?
            .to_string();
        let price = self
            .price
            .as_ref()
            .ok_or("price is required")?
            .as_f64()
            .ok_or("price must be a number")?;
        if !price.is_finite() || price < 0.0 {
            return Err("price must be a non-negative number");
        }
        Ok(NewOrder {
            item,
            price,
            currency: Currency::parse(self.currency.as_deref()),
            category,
            customer: self.customer.filter(|c| !c.trim().is_empty()),
        })
    }
}

#[derive(Serialize)]
struct OrderList {
    orders: Vec<Order>,
}

async fn list_orders(State(state): State<AppState>) -> Result<Json<OrderList>, HTTPError> {
    state.simulator.delay().await;
    let orders = state.store.list_orders(LIST_LIMIT).await?;
    Ok(Json(OrderList { orders }))
}

async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), HTTPError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            reject_order(&state, ProductCategory::Other, &rejection.body_text());
            return Err(HTTPError::bad_request("invalid order payload"));
        }
    };

    let category = request.category();
    let new_order = match request.validate() {
        Ok(new_order) => new_order,
        Err(message) => {
            reject_order(&state, category, message);
            return Err(HTTPError::bad_request(message));
        }
    };

    state.simulator.delay().await;
    if state.simulator.should_fail() {
        state.telemetry.record_event(BusinessEvent::OrderFailed {
            reason: FailureReason::Processing,
            category,
        });
        warn!(
            event_name = "order.failed",
            event_domain = "orders",
            reason = FailureReason::Processing.as_str(),
            category = category.as_str(),
            "simulated order processing failure"
        );
        return Err(HTTPError::internal("Order processing failed"));
    }

    let order = Order::create(new_order);
    if let Err(e) = state.store.create_order(&order).await {
        state.telemetry.record_event(BusinessEvent::OrderFailed {
            reason: FailureReason::Store,
            category,
        });
        error!(
            event_name = "order.failed",
            event_domain = "orders",
            reason = FailureReason::Store.as_str(),
            error = %e,
            "failed to persist order"
        );
        return Err(HTTPError::internal("Order processing failed"));
    }

    state.telemetry.record_event(BusinessEvent::OrderCreated {
        category: order.category,
        currency: order.currency,
        value: order.price,
    });
    info!(
        event_name = "order.created",
        event_domain = "orders",
        order_id = order.id.as_str(),
        category = order.category.as_str(),
        currency = order.currency.as_str(),
        value = order.price,
        "order created"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

fn reject_order(state: &AppState, category: ProductCategory, detail: &str) {
    state.telemetry.record_event(BusinessEvent::OrderFailed {
        reason: FailureReason::Validation,
        category,
    });
    warn!(
        event_name = "order.failed",
        event_domain = "orders",
        reason = FailureReason::Validation.as_str(),
        detail,
        "order rejected"
    );
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, HTTPError> {
    state
        .store
        .get_order(&id)
        .await?
        .map(Json)
        .ok_or_else(|| HTTPError::not_found("order not found"))
}

#[derive(Serialize)]
struct PriceQuote {
    item: String,
    price: f64,
}

async fn get_price(
    State(state): State<AppState>,
    Path(item): Path<String>,
) -> Result<Json<PriceQuote>, HTTPError> {
    let upstream_error = || HTTPError::new(StatusCode::BAD_GATEWAY, "upstream_error");

    let Some(prices) = state.prices.as_ref() else {
        warn!("Price lookup requested but no price service is configured");
        return Err(upstream_error());
    };

    match prices.fetch(&item).await {
        Ok(price) => Ok(Json(PriceQuote { item, price })),
        Err(e) => {
            warn!(
                event_name = "price.lookup.failed",
                event_domain = "orders",
                error = %e,
                "price service request failed"
            );
            Err(upstream_error())
        }
    }
}
