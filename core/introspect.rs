use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque handle to a registered class. Valid only for the introspector that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(pub(crate) usize);

/// Opaque handle to a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub(crate) usize);

/// Failure raised by user code behind a class method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvokeError {
    pub message: String,
}

impl InvokeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type MethodFn = Arc<dyn Fn() -> Result<Value, InvokeError> + Send + Sync>;

/// The single reflection seam. Everything above this trait is
/// introspection-agnostic: collectors, resolvers and extractors only ever
/// talk to a `&dyn ClassIntrospector`.
///
/// Contract notes:
/// - `own_constant_names` lists public constants only; `own_constant` also
///   returns private constant values (mirroring const_get semantics).
/// - `constant_defined` covers public and private constants, own scope only.
/// - `responds_to` is the full unscoped lookup (own, inherited, module,
///   private), while `invoke` resolves through public members only and
///   reports a private hit as an `InvokeError`.
pub trait ClassIntrospector {
    fn resolve(&self, name: &str) -> Option<ClassId>;
    fn class_name(&self, class: ClassId) -> String;
    fn superclass_of(&self, class: ClassId) -> Option<ClassId>;
    fn mixed_in_modules(&self, class: ClassId) -> Vec<ModuleId>;
    fn module_name(&self, module: ModuleId) -> String;

    fn own_constant_names(&self, class: ClassId) -> Vec<String>;
    fn own_constant(&self, class: ClassId, name: &str) -> Option<Value>;
    fn constant_defined(&self, class: ClassId, name: &str) -> bool;

    fn own_method_names(&self, class: ClassId) -> Vec<String>;
    fn private_method_names(&self, class: ClassId) -> Vec<String>;
    fn has_own_method(&self, class: ClassId, name: &str) -> bool;
    fn responds_to(&self, class: ClassId, name: &str) -> bool;
    fn invoke(&self, class: ClassId, method: &str) -> Result<Value, InvokeError>;

    fn module_method_names(&self, module: ModuleId) -> Vec<String>;
    fn module_private_method_names(&self, module: ModuleId) -> Vec<String>;
    fn module_has_method(&self, module: ModuleId, name: &str) -> bool;
    fn module_constant_names(&self, module: ModuleId) -> Vec<String>;
    fn module_constant(&self, module: ModuleId, name: &str) -> Option<Value>;
}

/// Describes one class for the [`Registry`] introspector: its constants,
/// class methods and relationships, registered as plain data plus closures.
#[derive(Clone)]
pub struct ClassDescriptor {
    name: String,
    parent: Option<String>,
    modules: Vec<String>,
    constants: IndexMap<String, Value>,
    private_constants: IndexMap<String, Value>,
    methods: IndexMap<String, MethodFn>,
    private_methods: IndexMap<String, MethodFn>,
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("modules", &self.modules)
            .field("constants", &self.constants.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            modules: Vec::new(),
            constants: IndexMap::new(),
            private_constants: IndexMap::new(),
            methods: IndexMap::new(),
            private_methods: IndexMap::new(),
        }
    }

    /// Superclass by name. Resolved lazily, so registration order is free.
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    /// Mixes a module into the class (methods become class methods).
    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.modules.push(name.into());
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    pub fn private_constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.private_constants.insert(name.into(), value.into());
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    /// Convenience for methods that return a fixed value.
    pub fn method_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.method(name, move || Ok(value.clone()))
    }

    pub fn private_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.private_methods.insert(name.into(), Arc::new(f));
        self
    }
}

/// Describes a module: instance methods here surface as class methods on any
/// class that mixes the module in.
#[derive(Clone)]
pub struct ModuleDescriptor {
    name: String,
    methods: IndexMap<String, MethodFn>,
    private_methods: IndexMap<String, MethodFn>,
    constants: IndexMap<String, Value>,
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: IndexMap::new(),
            private_methods: IndexMap::new(),
            constants: IndexMap::new(),
        }
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn method_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.method(name, move || Ok(value.clone()))
    }

    pub fn private_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        self.private_methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }
}

/// Descriptor-table implementation of [`ClassIntrospector`].
#[derive(Debug, Default)]
pub struct Registry {
    classes: Vec<ClassDescriptor>,
    modules: Vec<ModuleDescriptor>,
    class_ids: HashMap<String, usize>,
    module_ids: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_class(&mut self, descriptor: ClassDescriptor) -> ClassId {
        if let Some(&existing) = self.class_ids.get(&descriptor.name) {
            log::warn!("Re-registering class '{}'", descriptor.name);
            self.classes[existing] = descriptor;
            return ClassId(existing);
        }
        let id = self.classes.len();
        self.class_ids.insert(descriptor.name.clone(), id);
        self.classes.push(descriptor);
        ClassId(id)
    }

    pub fn register_module(&mut self, descriptor: ModuleDescriptor) -> ModuleId {
        if let Some(&existing) = self.module_ids.get(&descriptor.name) {
            log::warn!("Re-registering module '{}'", descriptor.name);
            self.modules[existing] = descriptor;
            return ModuleId(existing);
        }
        let id = self.modules.len();
        self.module_ids.insert(descriptor.name.clone(), id);
        self.modules.push(descriptor);
        ModuleId(id)
    }

    fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.0]
    }

    fn module(&self, id: ModuleId) -> &ModuleDescriptor {
        &self.modules[id.0]
    }

    /// The class plus its ancestor chain, nearest first.
    fn lineage(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = vec![class];
        let mut current = class;
        while let Some(parent) = self.superclass_of(current) {
            // Guards against descriptor cycles.
            if chain.contains(&parent) {
                log::warn!(
                    "Inheritance cycle detected at class '{}'",
                    self.class(parent).name
                );
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Locates the nearest public definition of `method` the way a dynamic
    /// dispatch would: own methods, then each ancestor, then mixed-in
    /// modules (own class's first, then the ancestors').
    fn find_method(&self, class: ClassId, method: &str) -> Option<MethodFn> {
        for id in self.lineage(class) {
            if let Some(f) = self.class(id).methods.get(method) {
                return Some(f.clone());
            }
        }
        for id in self.lineage(class) {
            for module in self.mixed_in_modules(id) {
                if let Some(f) = self.module(module).methods.get(method) {
                    return Some(f.clone());
                }
            }
        }
        None
    }

    fn find_private_method(&self, class: ClassId, method: &str) -> bool {
        for id in self.lineage(class) {
            if self.class(id).private_methods.contains_key(method) {
                return true;
            }
        }
        for id in self.lineage(class) {
            for module in self.mixed_in_modules(id) {
                if self.module(module).private_methods.contains_key(method) {
                    return true;
                }
            }
        }
        false
    }
}

impl ClassIntrospector for Registry {
    fn resolve(&self, name: &str) -> Option<ClassId> {
        self.class_ids.get(name).copied().map(ClassId)
    }

    fn class_name(&self, class: ClassId) -> String {
        self.class(class).name.clone()
    }

    fn superclass_of(&self, class: ClassId) -> Option<ClassId> {
        let parent = self.class(class).parent.as_deref()?;
        let resolved = self.class_ids.get(parent).copied().map(ClassId);
        if resolved.is_none() {
            log::warn!(
                "Class '{}' names unknown parent '{}'",
                self.class(class).name,
                parent
            );
        }
        resolved
    }

    fn mixed_in_modules(&self, class: ClassId) -> Vec<ModuleId> {
        self.class(class)
            .modules
            .iter()
            .filter_map(|name| {
                let id = self.module_ids.get(name).copied().map(ModuleId);
                if id.is_none() {
                    log::warn!(
                        "Class '{}' mixes in unknown module '{}'",
                        self.class(class).name,
                        name
                    );
                }
                id
            })
            .collect()
    }

    fn module_name(&self, module: ModuleId) -> String {
        self.module(module).name.clone()
    }

    fn own_constant_names(&self, class: ClassId) -> Vec<String> {
        self.class(class).constants.keys().cloned().collect()
    }

    fn own_constant(&self, class: ClassId, name: &str) -> Option<Value> {
        let descriptor = self.class(class);
        descriptor
            .constants
            .get(name)
            .or_else(|| descriptor.private_constants.get(name))
            .cloned()
    }

    fn constant_defined(&self, class: ClassId, name: &str) -> bool {
        let descriptor = self.class(class);
        descriptor.constants.contains_key(name) || descriptor.private_constants.contains_key(name)
    }

    fn own_method_names(&self, class: ClassId) -> Vec<String> {
        self.class(class).methods.keys().cloned().collect()
    }

    fn private_method_names(&self, class: ClassId) -> Vec<String> {
        self.class(class).private_methods.keys().cloned().collect()
    }

    fn has_own_method(&self, class: ClassId, name: &str) -> bool {
        self.class(class).methods.contains_key(name)
    }

    fn responds_to(&self, class: ClassId, name: &str) -> bool {
        self.find_method(class, name).is_some() || self.find_private_method(class, name)
    }

    fn invoke(&self, class: ClassId, method: &str) -> Result<Value, InvokeError> {
        match self.find_method(class, method) {
            Some(f) => f(),
            None if self.find_private_method(class, method) => Err(InvokeError::new(format!(
                "private method '{}' called for {}",
                method,
                self.class(class).name
            ))),
            None => Err(InvokeError::new(format!(
                "undefined method '{}' for {}",
                method,
                self.class(class).name
            ))),
        }
    }

    fn module_method_names(&self, module: ModuleId) -> Vec<String> {
        self.module(module).methods.keys().cloned().collect()
    }

    fn module_private_method_names(&self, module: ModuleId) -> Vec<String> {
        self.module(module).private_methods.keys().cloned().collect()
    }

    fn module_has_method(&self, module: ModuleId, name: &str) -> bool {
        self.module(module).methods.contains_key(name)
    }

    fn module_constant_names(&self, module: ModuleId) -> Vec<String> {
        self.module(module).constants.keys().cloned().collect()
    }

    fn module_constant(&self, module: ModuleId, name: &str) -> Option<Value> {
        self.module(module).constants.get(name).cloned()
    }
}
