//! Exclusion tests - excluded methods leave no trace

use super::fixtures::*;
use crate::correlation::{self, CorrelationId};
use crate::{ExclusionFilter, ExclusionRules, InvocationContext, MethodDescriptor, TraceConfig};

#[test]
fn test_package_fragment_and_method_name_match() {
    let filter = ExclusionFilter::new(
        &ExclusionRules::new()
            .exclude_package("health")
            .exclude_method("ping"),
    );

    assert!(filter.is_excluded(&MethodDescriptor::new("shop::health::Probe", "check")));
    assert!(filter.is_excluded(&MethodDescriptor::new("shop::orders::OrderService", "ping")));
    assert!(filter.should_log(&MethodDescriptor::new("shop::orders::OrderService", "create")));
}

#[test]
fn test_empty_fragment_excludes_nothing() {
    let filter = ExclusionFilter::new(&ExclusionRules::new().exclude_package(""));
    assert!(filter.should_log(&create_order()));
}

#[test]
fn test_excluded_method_produces_no_lines_and_no_correlation() {
    let config = TraceConfig::new()
        .with_exclusions(ExclusionRules::new().exclude_package("orders"))
        .with_escalation(true);
    let (interceptor, sink) = capturing(config);
    let method = create_order();
    let customer = CustomerDto::sample();
    let args: [&dyn crate::Loggable; 1] = [&customer];
    let ctx = InvocationContext::new(&method, &args);

    correlation::sync_scope(None, || {
        interceptor.before_call(&ctx);
        assert_eq!(correlation::current(), None);

        interceptor.after_success(&ctx, &customer);
        let record = interceptor.after_error(&ctx, &OrderError("bad amount".into()));
        assert!(record.is_none());
    });

    assert!(sink.is_empty());
}

#[test]
fn test_excluded_method_keeps_existing_correlation() {
    let config =
        TraceConfig::new().with_exclusions(ExclusionRules::new().exclude_method("create"));
    let (interceptor, sink) = capturing(config);
    let method = create_order();

    correlation::sync_scope(Some(CorrelationId::from_string("upstream")), || {
        let result: Result<u8, OrderError> = interceptor.observe(&method, &[], || Ok(1));
        assert_eq!(result.unwrap(), 1);
        assert_eq!(correlation::current().unwrap().as_str(), "upstream");
    });

    assert!(sink.is_empty());
}
