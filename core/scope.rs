use crate::introspect::{ClassId, ClassIntrospector, ModuleId};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;

/// Traversal scope for member discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Own directly-declared members only.
    Strict,
    /// Own + inherited + mixed-in-module members.
    #[default]
    Comprehensive,
}

/// Immutable scope configuration; derivable variants return new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeConfig {
    pub scope: Scope,
    pub include_private: bool,
}

impl ScopeConfig {
    pub fn strict(self) -> Self {
        Self {
            scope: Scope::Strict,
            ..self
        }
    }

    pub fn comprehensive(self) -> Self {
        Self {
            scope: Scope::Comprehensive,
            ..self
        }
    }

    pub fn with_private(self) -> Self {
        Self {
            include_private: true,
            ..self
        }
    }

    pub fn include_inheritance(&self) -> bool {
        self.scope == Scope::Comprehensive
    }

    pub fn include_modules(&self) -> bool {
        self.scope == Scope::Comprehensive
    }
}

/// Framework lifecycle hooks that must never be treated as invocable
/// behaviors when harvesting module methods.
const EXCLUDED_HOOKS: [&str; 3] = ["included", "extended", "prepended"];

/// Candidate names probed when looking for private constants. Reflection
/// does not enumerate private constants, so discovery is best-effort: a
/// curated list of common names, checked against "defined but not public".
static PRIVATE_CONSTANT_CANDIDATES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut names: Vec<String> = (b'A'..=b'Z').map(|c| (c as char).to_string()).collect();
    names.extend(
        [
            "VERSION",
            "CONFIG",
            "SECRET_KEY",
            "API_KEY",
            "TOKEN",
            "PRIVATE_KEY",
            "INTERNAL_CONFIG",
            "DEBUG_MODE",
            "DEVELOPMENT_MODE",
            "CACHE_TTL",
            "TIMEOUT",
            "RETRY_COUNT",
            "MAX_RETRIES",
            "DEFAULT_OPTIONS",
            "INTERNAL_OPTIONS",
        ]
        .into_iter()
        .map(String::from),
    );
    names
});

/// Enumerates candidate member names for one class under a scope
/// configuration. Returns sorted, deduplicated sets; filtering and the
/// cross-class union happen one level up.
pub struct MemberCollector<'a> {
    introspector: &'a dyn ClassIntrospector,
    scope: ScopeConfig,
}

impl<'a> MemberCollector<'a> {
    pub fn new(introspector: &'a dyn ClassIntrospector, scope: ScopeConfig) -> Self {
        Self {
            introspector,
            scope,
        }
    }

    pub fn method_names(&self, class: ClassId) -> BTreeSet<String> {
        let mut names: BTreeSet<String> =
            self.introspector.own_method_names(class).into_iter().collect();

        if self.scope.include_inheritance() {
            for ancestor in self.ancestors(class) {
                names.extend(self.introspector.own_method_names(ancestor));
            }
        }

        if self.scope.include_modules() {
            for module in self.relevant_modules(class) {
                names.extend(self.harvest_module_methods(module));
            }
        }

        if self.scope.include_private {
            names.extend(self.private_method_names(class));
        }

        log::trace!(
            "Collected {} method name(s) for {}",
            names.len(),
            self.introspector.class_name(class)
        );
        names
    }

    pub fn constant_names(&self, class: ClassId) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .introspector
            .own_constant_names(class)
            .into_iter()
            .collect();

        if self.scope.include_inheritance() {
            for ancestor in self.ancestors(class) {
                names.extend(self.introspector.own_constant_names(ancestor));
            }
        }

        if self.scope.include_modules() {
            for module in self.relevant_modules(class) {
                names.extend(self.introspector.module_constant_names(module));
            }
        }

        if self.scope.include_private {
            names.extend(self.probe_private_constants(class));
        }

        log::trace!(
            "Collected {} constant name(s) for {}",
            names.len(),
            self.introspector.class_name(class)
        );
        names
    }

    /// Ancestor chain, nearest first, excluding the class itself.
    pub fn ancestors(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = self.introspector.superclass_of(class);
        while let Some(ancestor) = current {
            if chain.contains(&ancestor) || ancestor == class {
                break;
            }
            chain.push(ancestor);
            current = self.introspector.superclass_of(ancestor);
        }
        chain
    }

    /// Modules mixed into the class, followed by the ancestors' modules when
    /// inheritance is in scope. Order matters for resolution.
    pub fn relevant_modules(&self, class: ClassId) -> Vec<ModuleId> {
        let mut modules = self.introspector.mixed_in_modules(class);
        if self.scope.include_inheritance() {
            for ancestor in self.ancestors(class) {
                for module in self.introspector.mixed_in_modules(ancestor) {
                    if !modules.contains(&module) {
                        modules.push(module);
                    }
                }
            }
        }
        modules
    }

    fn harvest_module_methods(&self, module: ModuleId) -> Vec<String> {
        self.introspector
            .module_method_names(module)
            .into_iter()
            .filter(|name| !EXCLUDED_HOOKS.contains(&name.as_str()))
            .collect()
    }

    fn private_method_names(&self, class: ClassId) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .introspector
            .private_method_names(class)
            .into_iter()
            .collect();

        if self.scope.include_inheritance() {
            for ancestor in self.ancestors(class) {
                names.extend(self.introspector.private_method_names(ancestor));
            }
        }

        if self.scope.include_modules() {
            for module in self.relevant_modules(class) {
                names.extend(
                    self.introspector
                        .module_private_method_names(module)
                        .into_iter()
                        .filter(|name| !EXCLUDED_HOOKS.contains(&name.as_str())),
                );
            }
        }

        names
    }

    /// Best-effort private constant discovery via candidate-name probing: a
    /// name counts when it is defined on the class but absent from the
    /// public constant list.
    fn probe_private_constants(&self, class: ClassId) -> Vec<String> {
        let public: BTreeSet<String> = self
            .introspector
            .own_constant_names(class)
            .into_iter()
            .collect();

        let mut candidates: Vec<String> = PRIVATE_CONSTANT_CANDIDATES.clone();
        let stem = upper_snake(&self.introspector.class_name(class));
        for suffix in ["_CONFIG", "_OPTIONS", "_SETTINGS"] {
            candidates.push(format!("{}{}", stem, suffix));
        }

        candidates
            .into_iter()
            .filter(|name| {
                !public.contains(name) && self.introspector.constant_defined(class, name)
            })
            .collect()
    }
}

/// `ServiceA` -> `SERVICE_A`; used to derive class-specific candidate names.
fn upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_uppercase());
    }
    out
}
