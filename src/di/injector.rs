use super::{InjectValue, Resolver};
use crate::error::Result;

/// A function called during the invoke phase with access to every provided value.
pub type InvokeFn = Box<dyn FnOnce(&dyn Resolver) -> Result<()> + Send>;

/// The injection boundary driven by the engine.
///
/// The engine calls [`Injector::provide`] once with every injected value and
/// then [`Injector::invoke`] once with the caller's targets (possibly none).
/// Any error from either call aborts startup.
pub trait Injector: Resolver {
    /// Register values for later resolution.
    fn provide(&self, values: &[InjectValue]) -> Result<()>;

    /// Call each target with arguments resolved from provided values.
    fn invoke(&self, targets: Vec<InvokeFn>) -> Result<()>;
}

/// Box a closure as an invoke target.
pub fn invoke_fn<F>(target: F) -> InvokeFn
where
    F: FnOnce(&dyn Resolver) -> Result<()> + Send + 'static,
{
    Box::new(target)
}
