use proc_macro::TokenStream;

mod injectable;

/// Derive macro for building a struct from values held by the injector
///
/// Fields are resolved as follows:
/// - `Arc<T>`: the value of type `T`
/// - `Arc<dyn Trait>`: a value provided as `Arc<dyn Trait>`
/// - `#[inject(name = "primary")] Arc<T>`: the value of type `T` named `primary`
/// - `#[inject(group = "workers")] Vec<Arc<T>>`: every `T` in group `workers`
/// - `#[inject(default)]`: `Default::default()`, not resolved
///
/// # Example
/// ```ignore
/// use ensemble::prelude::*;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
///     #[inject(name = "primary")]
///     database: Arc<Database>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}
