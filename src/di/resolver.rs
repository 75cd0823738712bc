use crate::error::{EnsembleError, Result};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Read side of the injection boundary.
///
/// Implementations only deal in type-erased values; the typed helpers live on
/// `dyn Resolver` so that invoke targets and `#[derive(Injectable)]` code can
/// ask for concrete types.
pub trait Resolver: Send + Sync {
    /// Look up the value registered for `type_id`, optionally under `name`.
    fn lookup(&self, type_id: TypeId, name: Option<&str>) -> Option<Arc<dyn Any + Send + Sync>>;

    /// All values of `type_id` registered in `group`, in registration order.
    fn lookup_group(&self, type_id: TypeId, group: &str) -> Vec<Arc<dyn Any + Send + Sync>>;
}

impl dyn Resolver + '_ {
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.resolve_tagged::<T>(None)
    }

    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.resolve_tagged::<T>(Some(name))
    }

    /// Resolve a trait object that was provided as an `Arc<dyn Trait>` value.
    ///
    /// ```rust,ignore
    /// let repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new());
    /// let value = InjectValue::new(repo);
    /// // later, from an invoke target:
    /// let repo = resolver.resolve_dyn::<dyn UserRepository>()?;
    /// ```
    pub fn resolve_dyn<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let wrapper = self
            .resolve_tagged::<Arc<T>>(None)
            .map_err(|_| EnsembleError::dependency_not_found::<T>())?;
        Ok(wrapper.as_ref().clone())
    }

    pub fn resolve_group<T: Send + Sync + 'static>(&self, group: &str) -> Result<Vec<Arc<T>>> {
        self.lookup_group(TypeId::of::<T>(), group)
            .into_iter()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map_err(|_| EnsembleError::DowncastFailed {
                        type_name: std::any::type_name::<T>().to_string(),
                    })
            })
            .collect()
    }

    fn resolve_tagged<T: Send + Sync + 'static>(&self, name: Option<&str>) -> Result<Arc<T>> {
        let instance = self.lookup(TypeId::of::<T>(), name).ok_or_else(|| {
            EnsembleError::DependencyNotFound {
                type_name: match name {
                    Some(name) => format!("{} (name: {})", std::any::type_name::<T>(), name),
                    None => std::any::type_name::<T>().to_string(),
                },
            }
        })?;
        instance
            .downcast::<T>()
            .map_err(|_| EnsembleError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }
}
