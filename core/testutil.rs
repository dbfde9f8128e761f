//! Shared fixture for the test suites: a small service-class hierarchy with
//! inheritance, a mixin, private members and one failing method.

use crate::introspect::{ClassDescriptor, InvokeError, ModuleDescriptor, Registry};
use crate::value::Value;
use serde_json::json;

/// `BaseService` <- `ServiceA` (mixes `Configurable`)
/// `BaseService` <- `ServiceB` (mixes `Configurable`)
pub(crate) fn service_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register_module(
        ModuleDescriptor::new("Configurable")
            .constant("MODULE_CONST", "shared setting")
            .method_value("module_only", "from module")
            .method_value("overridable_method", "from module")
            // Lifecycle hooks, expected to be filtered out of comparisons.
            .method_value("included", true)
            .method_value("extended", true)
            .method_value("prepended", true),
    );

    registry.register_class(
        ClassDescriptor::new("BaseService")
            .constant("DEFAULT_TIMEOUT", 30)
            .method_value("overridable_method", "from parent"),
    );

    registry.register_class(
        ClassDescriptor::new("ServiceA")
            .parent("BaseService")
            .with_module("Configurable")
            .constant("NAME", "a")
            .constant("CONFIG", Value::from(json!({"timeout": 30, "ssl": true})))
            .private_constant("SECRET_KEY", "s3cr3t-a")
            .method_value("status", "up")
            .method_value("overridable_method", "own-a")
            .private_method("internal_helper", || Ok(Value::from("helper"))),
    );

    registry.register_class(
        ClassDescriptor::new("ServiceB")
            .parent("BaseService")
            .with_module("Configurable")
            .constant("CONFIG", Value::from(json!({"timeout": 60, "ssl": false, "retries": 3})))
            .constant("RETRIES", 3)
            .method_value("status", "down")
            .method("failing", || Err(InvokeError::new("boom upstream failure"))),
    );

    registry
}
