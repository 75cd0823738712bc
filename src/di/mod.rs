mod container;
mod injectable;
mod injector;
mod resolver;
mod value;

pub use container::Container;
pub use injectable::Injectable;
pub use injector::{Injector, InvokeFn, invoke_fn};
pub use resolver::Resolver;
pub use value::InjectValue;
