use crate::introspect::{ClassId, ClassIntrospector};
use crate::scope::{MemberCollector, ScopeConfig};
use crate::value::Value;

/// Where a resolved member actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Own,
    Inherited,
    Module,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberSource {
    pub label: String,
    pub kind: SourceKind,
}

/// A resolved method: invoke `name` on `target` (the ancestor for inherited
/// members, the original class for own/module/unknown members).
#[derive(Debug, Clone, PartialEq)]
pub struct MethodBinding {
    pub source: MemberSource,
    pub target: ClassId,
}

/// A resolved constant and its effective value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantBinding {
    pub source: MemberSource,
    pub value: Value,
}

/// Finds the effective source of a single member. The ordering is
/// load-bearing: own beats inherited beats mixed-in module, with a final
/// "available but unattributed" fallback for methods the full lookup knows
/// about (private members, for instance).
pub struct MemberResolver<'a> {
    introspector: &'a dyn ClassIntrospector,
    scope: ScopeConfig,
}

impl<'a> MemberResolver<'a> {
    pub fn new(introspector: &'a dyn ClassIntrospector, scope: ScopeConfig) -> Self {
        Self {
            introspector,
            scope,
        }
    }

    fn collector(&self) -> MemberCollector<'a> {
        MemberCollector::new(self.introspector, self.scope)
    }

    pub fn resolve_method(&self, class: ClassId, name: &str) -> Option<MethodBinding> {
        if !self.introspector.responds_to(class, name) {
            return None;
        }

        if self.introspector.has_own_method(class, name) {
            return Some(MethodBinding {
                source: MemberSource {
                    label: self.introspector.class_name(class),
                    kind: SourceKind::Own,
                },
                target: class,
            });
        }

        if self.scope.include_inheritance() {
            for ancestor in self.collector().ancestors(class) {
                if self.introspector.has_own_method(ancestor, name) {
                    return Some(MethodBinding {
                        source: MemberSource {
                            label: self.introspector.class_name(ancestor),
                            kind: SourceKind::Inherited,
                        },
                        // Bound to the ancestor, not the original class.
                        target: ancestor,
                    });
                }
            }
        }

        if self.scope.include_modules() {
            let direct = self.introspector.mixed_in_modules(class);
            for module in self.collector().relevant_modules(class) {
                if self.introspector.module_has_method(module, name) {
                    let module_name = self.introspector.module_name(module);
                    let label = if self.scope.include_inheritance() && !direct.contains(&module) {
                        format!("{} (via parent)", module_name)
                    } else {
                        module_name
                    };
                    return Some(MethodBinding {
                        source: MemberSource {
                            label,
                            kind: SourceKind::Module,
                        },
                        // Mixin methods surface on the original class.
                        target: class,
                    });
                }
            }
        }

        log::debug!(
            "Method '{}' on {} is available but unattributed",
            name,
            self.introspector.class_name(class)
        );
        Some(MethodBinding {
            source: MemberSource {
                label: "inherited".to_string(),
                kind: SourceKind::Unknown,
            },
            target: class,
        })
    }

    pub fn resolve_constant(&self, class: ClassId, name: &str) -> Option<ConstantBinding> {
        if let Some(value) = self.introspector.own_constant(class, name) {
            return Some(ConstantBinding {
                source: MemberSource {
                    label: self.introspector.class_name(class),
                    kind: SourceKind::Own,
                },
                value,
            });
        }

        if self.scope.include_inheritance() {
            for ancestor in self.collector().ancestors(class) {
                if let Some(value) = self.introspector.own_constant(ancestor, name) {
                    return Some(ConstantBinding {
                        source: MemberSource {
                            label: self.introspector.class_name(ancestor),
                            kind: SourceKind::Inherited,
                        },
                        value,
                    });
                }
            }
        }

        if self.scope.include_modules() {
            for module in self.collector().relevant_modules(class) {
                if let Some(value) = self.introspector.module_constant(module, name) {
                    return Some(ConstantBinding {
                        source: MemberSource {
                            label: self.introspector.module_name(module),
                            kind: SourceKind::Module,
                        },
                        value,
                    });
                }
            }
        }

        None
    }
}
