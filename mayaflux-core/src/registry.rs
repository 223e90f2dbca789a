//! Process-wide backend service registry. Opaque, thread-safe service
//! discovery so the core never depends on a concrete backend.
//!
//! Grounded on the shared-lock-guarded map idiom `graal::context::Context`
//! uses for its resource tables (one lock acquired per call rather than per
//! field), applied here to a `TypeId -> Box<dyn Any>` service table instead
//! of a resource table.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

/// A process-wide mapping from service trait/type to a registered instance.
///
/// Services are expected to outlive their consumers; the registry holds an
/// `Arc` and does not otherwise manage lifetimes.
#[derive(Default)]
pub struct BackendRegistry {
    services: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Register a service instance for type `T`, replacing any prior
    /// registration.
    pub fn register_service<T: Send + Sync + 'static>(&self, service: T) {
        let mut guard = self.services.write();
        guard.insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// Look up a previously registered service.
    pub fn get_service<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let guard = self.services.read();
        guard
            .get(&TypeId::of::<T>())
            .and_then(|svc| svc.clone().downcast::<T>().ok())
    }

    pub fn has_service<T: Send + Sync + 'static>(&self) -> bool {
        self.services.read().contains_key(&TypeId::of::<T>())
    }

    pub fn unregister_service<T: Send + Sync + 'static>(&self) {
        self.services.write().remove(&TypeId::of::<T>());
    }

    pub fn clear_all_services(&self) {
        self.services.write().clear();
    }
}

/// A thin global accessor for embedding simplicity. Nothing inside
/// `mayaflux-core` or its sibling crates reads this implicitly — every
/// internal API takes a `&BackendRegistry` explicitly. This exists only so a
/// host application can reach the registry from contexts that don't have one
/// threaded through (see Design Notes: "provide a thin global for embedding
/// simplicity but avoid relying on static-lifetime side effects").
static GLOBAL_REGISTRY: OnceCell<BackendRegistry> = OnceCell::new();

pub fn global() -> &'static BackendRegistry {
    GLOBAL_REGISTRY.get_or_init(BackendRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct DummyService(u32);

    #[test]
    fn register_then_get_roundtrips() {
        let reg = BackendRegistry::new();
        assert!(!reg.has_service::<DummyService>());
        reg.register_service(DummyService(42));
        assert!(reg.has_service::<DummyService>());
        let svc = reg.get_service::<DummyService>().unwrap();
        assert_eq!(svc.0, 42);
    }

    #[test]
    fn unregister_removes_service() {
        let reg = BackendRegistry::new();
        reg.register_service(DummyService(1));
        reg.unregister_service::<DummyService>();
        assert!(!reg.has_service::<DummyService>());
    }

    #[test]
    fn clear_all_services_empties_table() {
        let reg = BackendRegistry::new();
        reg.register_service(DummyService(1));
        reg.register_service(7u32);
        reg.clear_all_services();
        assert!(!reg.has_service::<DummyService>());
        assert!(!reg.has_service::<u32>());
    }

    #[test]
    fn replacing_a_registration_overwrites() {
        let reg = BackendRegistry::new();
        reg.register_service(DummyService(1));
        reg.register_service(DummyService(2));
        assert_eq!(reg.get_service::<DummyService>().unwrap().0, 2);
    }
}
