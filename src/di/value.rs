use crate::lifecycle::Component;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A value handed to the injector, optionally tagged with a name or group.
///
/// Values are reference counted, so cloning an `InjectValue` shares the
/// underlying object. Values created through [`InjectValue::component`] also
/// expose their lifecycle hooks to the engine.
#[derive(Clone)]
pub struct InjectValue {
    instance: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
    component: Option<Arc<dyn Component>>,
    name: Option<String>,
    group: Option<String>,
}

impl InjectValue {
    /// Wrap a plain value with no lifecycle hooks.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::shared(Arc::new(value))
    }

    /// Wrap an already shared value, keeping its identity.
    pub fn shared<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            instance: value,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            component: None,
            name: None,
            group: None,
        }
    }

    /// Wrap a value whose lifecycle hooks the engine should drive.
    pub fn component<T: Component>(value: T) -> Self {
        Self::shared_component(Arc::new(value))
    }

    pub fn shared_component<T: Component>(value: Arc<T>) -> Self {
        let component: Arc<dyn Component> = value.clone();
        Self {
            component: Some(component),
            ..Self::shared(value)
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn grouped(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn instance(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.instance
    }

    pub fn as_component(&self) -> Option<&Arc<dyn Component>> {
        self.component.as_ref()
    }

    /// Name used in logs and errors: the tag if set, the type name otherwise.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.type_name),
            None => self.type_name.to_string(),
        }
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for InjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectValue")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("group", &self.group)
            .field("component", &self.component.is_some())
            .finish()
    }
}
