use std::sync::{Arc, RwLock};

/// Entity Reference - newtype to express entity boundaries.
///
/// Layer and topic nodes are shared between their parent's ordered
/// collection, the map's id registry and any command holding on to them.
pub struct ERef<T: ?Sized>(Arc<RwLock<T>>);

impl<T: ?Sized> Clone for ERef<T> {
    fn clone(&self) -> Self {
        ERef(self.0.clone())
    }
}

impl<T> ERef<T> {
    pub fn new(element: T) -> Self {
        Self(Arc::new(RwLock::new(element)))
    }
}

impl<T: ?Sized> ERef<T> {
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, T> {
        self.0.read().unwrap()
    }

    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, T> {
        self.0.write().unwrap()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ERef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ERef").field(&*self.read()).finish()
    }
}
