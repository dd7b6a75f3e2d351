pub mod client_report;
pub mod order;
pub mod user;

pub use client_report::{ClientKind, ClientReport, VitalRating, WebVital, WebVitalReport};
pub use order::{Currency, NewOrder, Order, ProductCategory};
pub use user::{normalize_email, NewUser, SignupMethod, User, UserType};
