//! The `Module` trait and the factory table the registry instantiates from.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bizkit_core::licensing::LicensePayload;

/// What a module sees while booting.
pub struct BootContext<'a> {
    allowed: &'a BTreeSet<String>,
    license: &'a LicensePayload,
}

impl<'a> BootContext<'a> {
    pub fn new(allowed: &'a BTreeSet<String>, license: &'a LicensePayload) -> Self {
        Self { allowed, license }
    }

    /// Every module allowed in this pass, booted or not.
    pub fn allowed_slugs(&self) -> &BTreeSet<String> {
        self.allowed
    }

    pub fn is_allowed(&self, slug: &str) -> bool {
        self.allowed.contains(slug)
    }

    pub fn license(&self) -> &LicensePayload {
        self.license
    }
}

/// A bootable business module.
///
/// `boot` is infallible: a module that cannot start must degrade on its own
/// instead of failing the whole pass.
pub trait Module: Send {
    fn slug(&self) -> &str;

    fn boot(&mut self, ctx: &BootContext<'_>);
}

pub type ModuleFactory = Box<dyn Fn() -> Box<dyn Module> + Send + Sync>;

/// Slug → constructor. Modules are only ever built through this table, and
/// only for allowed slugs.
#[derive(Default)]
pub struct ModuleFactories {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor, replacing any previous one for `slug`.
    pub fn register<F, M>(&mut self, slug: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Module + 'static,
    {
        self.factories
            .insert(slug.into(), Box::new(move || Box::new(factory()) as Box<dyn Module>));
        self
    }

    pub fn with<F, M>(mut self, slug: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> M + Send + Sync + 'static,
        M: Module + 'static,
    {
        self.register(slug, factory);
        self
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.factories.contains_key(slug)
    }

    pub fn create(&self, slug: &str) -> Option<Box<dyn Module>> {
        self.factories.get(slug).map(|factory| factory())
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ModuleFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
