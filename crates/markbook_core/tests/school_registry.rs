use markbook_core::store::keys;
use markbook_core::{
    ChangeBus, ChangeEvent, MemoryKvBackend, NamespacedStore, RegistryError, School,
    SchoolRegistry,
};
use std::cell::RefCell;
use std::rc::Rc;

fn setup() -> (Rc<ChangeBus>, Rc<NamespacedStore>, SchoolRegistry) {
    let bus = Rc::new(ChangeBus::new());
    let store = Rc::new(NamespacedStore::new(
        Box::new(MemoryKvBackend::new()),
        Rc::clone(&bus),
    ));
    let registry = SchoolRegistry::new(Rc::clone(&store), Rc::clone(&bus));
    (bus, store, registry)
}

#[test]
fn empty_registry_materializes_the_default_school() {
    let (_bus, _store, registry) = setup();

    let active = registry.active_id().unwrap();
    assert!(active.is_default());

    let schools = registry.list().unwrap();
    assert_eq!(schools.len(), 1);
    assert_eq!(schools[0].id, active);
}

#[test]
fn active_id_always_resolves_to_a_listed_school() {
    let (_bus, _store, registry) = setup();

    let greenwood = registry.create("Greenwood", "GW", "12 Elm Road").unwrap();
    registry.switch_active(&greenwood.id).unwrap();
    let hillcrest = registry.create("Hillcrest", "HC", "").unwrap();
    registry.switch_active(&hillcrest.id).unwrap();
    registry.delete(&greenwood.id).unwrap();

    let active = registry.active_id().unwrap();
    let schools = registry.list().unwrap();
    assert!(schools.iter().any(|s| s.id == active));
}

#[test]
fn dangling_pointer_repairs_to_first_school_in_list_order() {
    let (_bus, store, registry) = setup();

    registry.create("Greenwood", "GW", "").unwrap();
    store
        .set_global(
            &keys::ACTIVE_SCHOOL_ID,
            &markbook_core::SchoolId::new("sch_gone"),
        )
        .unwrap();

    let active = registry.active_id().unwrap();
    let schools = registry.list().unwrap();
    assert_eq!(active, schools[0].id);
}

#[test]
fn missing_pointer_adopts_the_legacy_active_school_config() {
    let (_bus, store, registry) = setup();

    let greenwood = registry.create("Greenwood", "GW", "").unwrap();
    // Simulate the previous single-school scheme: only the legacy config
    // records which school was in use.
    store
        .set_global(&keys::ACTIVE_SCHOOL_CONFIG, &greenwood)
        .unwrap();
    store.remove_global(&keys::ACTIVE_SCHOOL_ID).unwrap();

    assert_eq!(registry.active_id().unwrap(), greenwood.id);
}

#[test]
fn create_rejects_case_insensitive_duplicate_codes() {
    let (_bus, _store, registry) = setup();

    registry.create("Greenwood", "GW", "").unwrap();
    let err = registry.create("Greenwood Annex", "gw", "").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateCode(_)));
    assert!(err.to_string().contains("already in use"));
}

#[test]
fn create_rejects_blank_name_and_code() {
    let (_bus, _store, registry) = setup();

    assert!(matches!(
        registry.create("   ", "GW", "").unwrap_err(),
        RegistryError::BlankName
    ));
    assert!(matches!(
        registry.create("Greenwood", "  ", "").unwrap_err(),
        RegistryError::BlankCode
    ));
}

#[test]
fn deleting_the_last_school_is_rejected() {
    let (_bus, _store, registry) = setup();

    let schools = registry.list().unwrap();
    let err = registry.delete(&schools[0].id).unwrap_err();
    assert!(matches!(err, RegistryError::LastSchool));
}

#[test]
fn deleting_the_active_school_is_rejected_until_switched_away() {
    let (_bus, _store, registry) = setup();

    // Materialize the default school first so a switch target exists.
    registry.active_id().unwrap();
    let greenwood = registry.create("Greenwood", "GW", "").unwrap();
    registry.switch_active(&greenwood.id).unwrap();

    let err = registry.delete(&greenwood.id).unwrap_err();
    assert!(matches!(err, RegistryError::ActiveSchool(_)));

    registry
        .switch_active(&markbook_core::SchoolId::default_school())
        .unwrap();
    registry.delete(&greenwood.id).unwrap();
    assert_eq!(registry.list().unwrap().len(), 1);
}

#[test]
fn switch_active_rejects_unknown_school() {
    let (_bus, _store, registry) = setup();

    let err = registry
        .switch_active(&markbook_core::SchoolId::new("sch_missing"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(_)));
}

#[test]
fn switch_active_emits_primary_and_legacy_alias_events() {
    let (bus, _store, registry) = setup();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let primary = Rc::clone(&seen);
    bus.on("schoolChanged", move |event| {
        if let ChangeEvent::SchoolChanged { school_id } = event {
            primary.borrow_mut().push(format!("primary:{school_id}"));
        }
    });
    let alias = Rc::clone(&seen);
    bus.on("school-changed", move |event| {
        if let ChangeEvent::SchoolChangedLegacy { school_id } = event {
            alias.borrow_mut().push(format!("legacy:{school_id}"));
        }
    });

    let greenwood = registry.create("Greenwood", "GW", "").unwrap();
    registry.switch_active(&greenwood.id).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            format!("primary:{}", greenwood.id),
            format!("legacy:{}", greenwood.id)
        ]
    );
}

#[test]
fn ensure_is_idempotent_once_the_invariant_holds() {
    let (_bus, store, registry) = setup();

    let first = registry.active_id().unwrap();
    let schools_snapshot: Vec<School> =
        store.get_global(&keys::SCHOOL_LIST, Vec::new()).unwrap();

    let second = registry.active_id().unwrap();
    let schools_after: Vec<School> =
        store.get_global(&keys::SCHOOL_LIST, Vec::new()).unwrap();

    assert_eq!(first, second);
    assert_eq!(schools_snapshot, schools_after);
}

#[test]
fn active_returns_the_full_school_record() {
    let (_bus, _store, registry) = setup();

    let greenwood = registry
        .create("Greenwood", "GW", "12 Elm Road")
        .unwrap();
    registry.switch_active(&greenwood.id).unwrap();

    let active = registry.active().unwrap();
    assert_eq!(active, greenwood);
}
