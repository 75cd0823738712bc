use crate::di::Resolver;
use crate::error::Result;

/// Trait for types that can be built from values held by the injector
///
/// This trait is typically implemented automatically via the `#[derive(Injectable)]` macro.
///
/// # Example
/// ```rust,ignore
/// use ensemble::prelude::*;
///
/// trait UserRepository: Send + Sync {}
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     // Resolved from a provided `Arc<dyn UserRepository>` value
///     repository: Arc<dyn UserRepository>,
///     #[inject(name = "primary")]
///     database: Arc<Database>,
///     #[inject(group = "listeners")]
///     listeners: Vec<Arc<Listener>>,
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Create an instance by resolving dependencies from the resolver
    ///
    /// # Errors
    /// Returns an error if any required dependency was not provided.
    fn inject(resolver: &dyn Resolver) -> Result<Self>;
}
