//! Business events layered on the same recording path as the HTTP signals.
//!
//! Every label value here comes from a closed enum, never from request text.

use super::labels::{LabelKey, LabelSet};
use super::sample::{Measurement, MetricSample};
use super::table::{
    ORDERS_CREATED_TOTAL, ORDERS_FAILED_TOTAL, ORDER_VALUE, REVENUE_TOTAL, USER_SIGNUPS_TOTAL,
};
use crate::models::{Currency, ProductCategory, SignupMethod, UserType};

/// Why an order attempt did not produce an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The request body was malformed or incomplete.
    Validation,
    /// Simulated processing failure.
    Processing,
    /// The store rejected or could not persist the order.
    Store,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Validation => "validation",
            FailureReason::Processing => "processing",
            FailureReason::Store => "store",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusinessEvent {
    OrderCreated {
        category: ProductCategory,
        currency: Currency,
        value: f64,
    },
    OrderFailed {
        reason: FailureReason,
        category: ProductCategory,
    },
    Signup {
        method: SignupMethod,
        user_type: UserType,
    },
}

impl BusinessEvent {
    pub fn samples(&self) -> Vec<MetricSample> {
        match *self {
            BusinessEvent::OrderCreated {
                category,
                currency,
                value,
            } => {
                let labels = LabelSet::new()
                    .with(LabelKey::Category, category.as_str())
                    .with(LabelKey::Currency, currency.as_str());
                vec![
                    MetricSample::increment(&ORDERS_CREATED_TOTAL, labels.clone()),
                    MetricSample::observe(&ORDER_VALUE, labels.clone(), value),
                    MetricSample::new(&REVENUE_TOTAL, Measurement::Increment(value), labels),
                ]
            }
            BusinessEvent::OrderFailed { reason, category } => {
                let labels = LabelSet::new()
                    .with(LabelKey::Reason, reason.as_str())
                    .with(LabelKey::Category, category.as_str());
                vec![MetricSample::increment(&ORDERS_FAILED_TOTAL, labels)]
            }
            BusinessEvent::Signup { method, user_type } => {
                let labels = LabelSet::new()
                    .with(LabelKey::SignupMethod, method.as_str())
                    .with(LabelKey::UserType, user_type.as_str());
                vec![MetricSample::increment(&USER_SIGNUPS_TOTAL, labels)]
            }
        }
    }
}
