//! Shared test types and helpers.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    Composite, FieldDescriptor, Interceptor, Loggable, MemorySink, MethodDescriptor, Shape,
    TraceConfig, TypeDescriptor,
};

// =============================================================================
// Domain Types
// =============================================================================

#[derive(Debug, Clone, Loggable)]
#[loggable(rename_all = "camelCase")]
pub struct CustomerDto {
    #[loggable(mask)]
    pub credit_card: String,
    pub amount: f64,
}

impl CustomerDto {
    pub fn sample() -> Self {
        Self {
            credit_card: "4111111111111111".to_string(),
            amount: 10.5,
        }
    }
}

#[derive(Debug, Clone, Loggable)]
pub struct Order {
    pub id: u64,
    pub customer: CustomerDto,
}

/// Redacted at the type level.
#[derive(Debug, Clone, Loggable)]
#[loggable(mask)]
pub struct Pin(pub String);

#[derive(Debug, Clone, Loggable)]
#[loggable(rename_all = "camelCase")]
pub struct RootDto {
    pub root_field: String,
}

#[derive(Debug, Clone, Loggable)]
#[loggable(rename_all = "camelCase")]
pub struct MiddleDto {
    #[loggable(parent)]
    pub base: RootDto,
    pub middle_field: String,
}

#[derive(Debug, Clone, Loggable)]
#[loggable(rename_all = "camelCase")]
pub struct LeafDto {
    #[loggable(parent)]
    pub base: MiddleDto,
    pub leaf_field: String,
}

impl LeafDto {
    pub fn sample() -> Self {
        Self {
            base: MiddleDto {
                base: RootDto {
                    root_field: "root".into(),
                },
                middle_field: "middle".into(),
            },
            leaf_field: "leaf".into(),
        }
    }
}

#[derive(Debug, Clone, Loggable)]
pub struct NamedBase {
    pub name: String,
}

#[derive(Debug, Clone, Loggable)]
pub struct NamedChild {
    #[loggable(parent)]
    pub base: NamedBase,
    pub name: String,
}

#[derive(Debug, Clone, Loggable)]
pub struct Labels {
    pub values: BTreeMap<String, Pin>,
}

#[derive(Debug, Clone, Loggable)]
#[loggable(validation_context)]
pub struct ValidationResult {
    pub violations: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct OrderError(pub String);

/// Declares a field it cannot read.
pub struct Broken;

static BROKEN: TypeDescriptor = TypeDescriptor {
    name: "Broken",
    markers: &[],
    fields: &[FieldDescriptor::new("ghost", &[])],
};

impl Loggable for Broken {
    fn shape(&self) -> Shape<'_> {
        Shape::Composite(self)
    }
}

impl Composite for Broken {
    fn descriptor(&self) -> &'static TypeDescriptor {
        &BROKEN
    }

    fn field(&self, _name: &str) -> Option<&dyn Loggable> {
        None
    }
}

// =============================================================================
// Methods
// =============================================================================

pub fn create_order() -> MethodDescriptor {
    MethodDescriptor::new("shop::orders::OrderService", "create")
        .with_param("customer", "CustomerDto")
        .returning("Order")
        .seeds_correlation()
        .escalates_errors()
}

pub fn plain_method(name: &str) -> MethodDescriptor {
    MethodDescriptor::new("shop::orders::OrderService", name)
        .with_param("customer", "CustomerDto")
        .returning("Order")
}

pub fn seeding_method(name: &str) -> MethodDescriptor {
    plain_method(name).seeds_correlation()
}

/// Interceptor writing to a fresh [`MemorySink`].
pub fn capturing(config: TraceConfig) -> (Interceptor, MemorySink) {
    let sink = MemorySink::new();
    let interceptor = Interceptor::builder()
        .config(config)
        .log_sink(Arc::new(sink.clone()))
        .build()
        .unwrap();
    (interceptor, sink)
}
