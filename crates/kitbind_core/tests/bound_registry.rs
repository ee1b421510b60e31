use kitbind_core::{
    BoundInterfaceExtension, BoundObject, ExampleBoundObject, Extension, HostContext,
    NamedRegistry, ObjectRegistry, UpdateDispatcher,
};
use std::sync::Arc;

const REGISTERED_OBJECT_ID: &str = "example_bound_object";

/// Started extension with one object registered, deregistered on drop.
struct RegistryFixture {
    extension: BoundInterfaceExtension<ExampleBoundObject>,
    interface: Arc<dyn NamedRegistry<ExampleBoundObject>>,
    object: Arc<ExampleBoundObject>,
}

impl RegistryFixture {
    fn new() -> Self {
        let mut extension = BoundInterfaceExtension::new(
            BoundInterfaceExtension::<ExampleBoundObject>::default_descriptor(),
        );
        extension
            .on_startup(
                "example.bound.plugin-dev",
                &HostContext::new(Arc::new(UpdateDispatcher::new())),
            )
            .expect("startup");
        let interface = extension.interface().expect("interface while started");
        let object = Arc::new(ExampleBoundObject::new(REGISTERED_OBJECT_ID));
        interface.register(object.clone());
        Self {
            extension,
            interface,
            object,
        }
    }
}

impl Drop for RegistryFixture {
    fn drop(&mut self) {
        self.interface.deregister(&self.object);
        let _ = self.extension.on_shutdown();
    }
}

#[test]
fn find_registered_object_returns_same_object() {
    let fixture = RegistryFixture::new();
    let found = fixture
        .interface
        .find(REGISTERED_OBJECT_ID)
        .expect("registered object");
    assert!(Arc::ptr_eq(&found, &fixture.object));
    assert_eq!(found.snapshot(), fixture.object.snapshot());
}

#[test]
fn find_unregistered_object_returns_none() {
    let fixture = RegistryFixture::new();
    assert!(fixture.interface.find("unregistered_object_id").is_none());
}

#[test]
fn find_after_deregister_returns_none() {
    let fixture = RegistryFixture::new();
    fixture.interface.deregister(&fixture.object);
    assert!(fixture.interface.find(REGISTERED_OBJECT_ID).is_none());
}

#[test]
fn find_before_any_register_returns_none() {
    let registry = ObjectRegistry::<ExampleBoundObject>::new();
    for id in ["", "a", REGISTERED_OBJECT_ID] {
        assert!(registry.find(id).is_none());
    }
}

#[test]
fn deregister_twice_is_same_as_once() {
    let registry = ObjectRegistry::<ExampleBoundObject>::new();
    let object = Arc::new(ExampleBoundObject::new("twice"));
    let other = Arc::new(ExampleBoundObject::new("other"));
    registry.register(object.clone());
    registry.register(other.clone());

    registry.deregister(&object);
    let after_once = registry.ids();
    registry.deregister(&object);
    assert_eq!(registry.ids(), after_once);
    assert_eq!(after_once, vec!["other".to_string()]);
}

#[test]
fn later_register_overwrites_same_id() {
    let registry = ObjectRegistry::<ExampleBoundObject>::new();
    let first = Arc::new(ExampleBoundObject::new("dup"));
    let second = Arc::new(ExampleBoundObject::new("dup"));
    second.set_property_int(2);

    registry.register(first.clone());
    registry.register(second.clone());

    let found = registry.find("dup").expect("dup registered");
    assert!(Arc::ptr_eq(&found, &second));
    assert!(!Arc::ptr_eq(&found, &first));
    assert_eq!(registry.len(), 1);
    assert_eq!(Arc::strong_count(&first), 1);
}

#[test]
fn deregister_matches_by_id_not_identity() {
    // Known sharp edge: a stale handle with the same id removes the live entry.
    let registry = ObjectRegistry::<ExampleBoundObject>::new();
    let live = Arc::new(ExampleBoundObject::new("shared_id"));
    let stale = ExampleBoundObject::new("shared_id");
    registry.register(live.clone());

    registry.deregister(&stale);
    assert!(registry.find("shared_id").is_none());

    registry.register(live.clone());
    assert!(!registry.deregister_exact(&Arc::new(stale)));
    assert!(registry.find("shared_id").is_some());
}

#[test]
fn found_object_shares_mutations_with_holder() {
    let fixture = RegistryFixture::new();
    fixture.object.set_property_int(9);
    fixture.object.set_property_bool(true);
    fixture.object.set_property_string("Ninety-Nine");

    let found = fixture
        .interface
        .find(REGISTERED_OBJECT_ID)
        .expect("registered object");
    found.multiply_int_property(9);
    assert_eq!(fixture.object.property_int(), 81);
    assert!(!found.toggle_bool_property());
    assert!(!fixture.object.property_bool());
    assert_eq!(
        found.append_string_property(" Red Balloons"),
        "Ninety-Nine Red Balloons"
    );
    assert_eq!(fixture.object.id(), REGISTERED_OBJECT_ID);
}

#[test]
fn zero_int_property_stays_zero_after_multiply() {
    let object = ExampleBoundObject::new("zero");
    for factor in [i64::MIN, -1, 0, 1, 100] {
        object.multiply_int_property(factor);
    }
    assert_eq!(object.property_int(), 0);
}
