use minijinja::value::{Rest, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Signature of a host-supplied template function.
pub type HelperFn = dyn Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync;

/// Named functions made callable from every rendered template.
#[derive(Clone, Default)]
pub struct TemplateHelpers {
    funcs: BTreeMap<String, Arc<HelperFn>>,
}

impl fmt::Debug for TemplateHelpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.funcs.keys()).finish()
    }
}

impl TemplateHelpers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `func` under `name`, replacing an earlier helper of that name.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, minijinja::Error> + Send + Sync + 'static,
    {
        self.register(name, func);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.funcs.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Wrap every helper as an engine value.
    pub(crate) fn bind(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.funcs.iter().map(|(name, func)| {
            let func = Arc::clone(func);
            let value = Value::from_function(move |args: Rest<Value>| func(&args));
            (name.clone(), value)
        })
    }
}
