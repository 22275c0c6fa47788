use markbook_core::store::keys;
use markbook_core::{
    AcademicYearCatalog, CatalogPatch, ChangeBus, ChangeEvent, ExamCatalog, ExamError,
    ExamTypeCatalog, MemoryKvBackend, NamespacedStore, ResultStore, SchoolRegistry, TypeId,
    YearId,
};
use std::cell::RefCell;
use std::rc::Rc;

struct Harness {
    bus: Rc<ChangeBus>,
    store: Rc<NamespacedStore>,
    years: AcademicYearCatalog,
    types: ExamTypeCatalog,
    exams: ExamCatalog,
}

fn setup() -> Harness {
    let bus = Rc::new(ChangeBus::new());
    let store = Rc::new(NamespacedStore::new(
        Box::new(MemoryKvBackend::new()),
        Rc::clone(&bus),
    ));
    Harness {
        years: AcademicYearCatalog::academic_years(Rc::clone(&store), Rc::clone(&bus)),
        types: ExamTypeCatalog::exam_types(Rc::clone(&store), Rc::clone(&bus)),
        exams: ExamCatalog::new(Rc::clone(&store), Rc::clone(&bus)),
        bus,
        store,
    }
}

#[test]
fn greenwood_scenario_creates_one_exam_with_denormalized_labels() {
    let h = setup();
    let registry = SchoolRegistry::new(Rc::clone(&h.store), Rc::clone(&h.bus));

    let greenwood = registry.create("Greenwood", "GW", "").unwrap();
    registry.switch_active(&greenwood.id).unwrap();

    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();
    h.exams
        .create(&year.id, &final_type.id, "Math Final", "")
        .unwrap();

    let all = h.exams.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Math Final");
    assert_eq!(all[0].year_label, "2025-26");
    assert_eq!(all[0].type_label, "Final");

    let hillcrest = registry.create("Hillcrest", "HC", "").unwrap();
    registry.switch_active(&hillcrest.id).unwrap();
    assert!(h.exams.get_all().unwrap().is_empty());
}

#[test]
fn create_requires_resolvable_year_and_type() {
    let h = setup();
    let year = h.years.create("2025-26").unwrap();

    let err = h
        .exams
        .create(&year.id, &TypeId::new("et_missing"), "Math Final", "")
        .unwrap_err();
    assert!(matches!(err, ExamError::UnknownExamType(_)));

    let final_type = h.types.create("Final").unwrap();
    let err = h
        .exams
        .create(&YearId::new("yr_missing"), &final_type.id, "Math Final", "")
        .unwrap_err();
    assert!(matches!(err, ExamError::UnknownAcademicYear(_)));
}

#[test]
fn create_rejects_blank_name() {
    let h = setup();
    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();

    let err = h
        .exams
        .create(&year.id, &final_type.id, "   ", "")
        .unwrap_err();
    assert!(matches!(err, ExamError::MissingField("name")));
}

#[test]
fn duplicate_triple_is_rejected_case_insensitively() {
    let h = setup();
    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();

    h.exams
        .create(&year.id, &final_type.id, "Math Final", "")
        .unwrap();
    let err = h
        .exams
        .create(&year.id, &final_type.id, "  MATH FINAL ", "")
        .unwrap_err();
    assert!(matches!(err, ExamError::DuplicateExam { .. }));

    // Same name under a different type is a distinct exam.
    let half_yearly = h.types.create("Half Yearly").unwrap();
    h.exams
        .create(&year.id, &half_yearly.id, "Math Final", "")
        .unwrap();
    assert_eq!(h.exams.get_all().unwrap().len(), 2);
}

#[test]
fn labels_are_snapshots_immune_to_later_catalog_edits() {
    let h = setup();
    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();
    let exam = h
        .exams
        .create(&year.id, &final_type.id, "Math Final", "")
        .unwrap();

    h.years
        .update(
            &year.id,
            CatalogPatch {
                name: Some("2026-27".to_string()),
                active: None,
            },
        )
        .unwrap();
    h.types.delete(&final_type.id).unwrap();

    let reloaded = h.exams.get_all().unwrap();
    assert_eq!(reloaded[0].id, exam.id);
    assert_eq!(reloaded[0].year_label, "2025-26");
    assert_eq!(reloaded[0].type_label, "Final");
    assert_eq!(reloaded[0].display_label(), "Math Final (Final - 2025-26)");
}

#[test]
fn mutations_rebuild_the_selector_metadata_wholesale() {
    let h = setup();
    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();

    let math = h
        .exams
        .create(&year.id, &final_type.id, "Math Final", "")
        .unwrap();
    let science = h
        .exams
        .create(&year.id, &final_type.id, "Science Final", "")
        .unwrap();

    let metas = h.store.get(&keys::EXAM_META, Vec::new()).unwrap();
    assert_eq!(metas.len(), 2);

    // Deactivated exams drop out of the derived list entirely.
    h.exams.toggle_active(&math.id).unwrap();
    let active = h.exams.get_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, science.id);

    let metas = h.store.get(&keys::EXAM_META, Vec::new()).unwrap();
    assert_eq!(metas.len(), 1);
    assert_eq!(metas[0].exam_id, science.id);
    assert_eq!(
        metas[0].display_label,
        "Science Final (Final - 2025-26)"
    );
}

#[test]
fn refresh_dependents_forwards_the_auto_select_hint() {
    let h = setup();
    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();
    let exam = h
        .exams
        .create(&year.id, &final_type.id, "Math Final", "")
        .unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    h.bus.on("examSelectionRefreshed", move |event| {
        if let ChangeEvent::ExamSelectionRefreshed { auto_select } = event {
            sink.borrow_mut().push(auto_select.clone());
        }
    });

    h.exams.refresh_dependents(Some(&exam.id)).unwrap();
    assert_eq!(*seen.borrow(), vec![Some(exam.id)]);
}

#[test]
fn delete_keeps_the_result_set_addressable_by_raw_id() {
    let h = setup();
    let results = ResultStore::new(Rc::clone(&h.store));

    let year = h.years.create("2025-26").unwrap();
    let final_type = h.types.create("Final").unwrap();
    let exam = h
        .exams
        .create(&year.id, &final_type.id, "Math Final", "")
        .unwrap();

    results.set_result_set(&exam.id, Vec::new()).unwrap();
    h.exams.delete(&exam.id).unwrap();

    assert!(h.exams.get_all().unwrap().is_empty());
    assert_eq!(results.exam_ids().unwrap(), vec![exam.id.clone()]);
    assert!(results.result_set(&exam.id).unwrap().is_some());
}

#[test]
fn deleting_an_unknown_exam_is_reported() {
    let h = setup();
    let err = h
        .exams
        .delete(&markbook_core::ExamId::new("ex_missing"))
        .unwrap_err();
    assert!(matches!(err, ExamError::NotFound(_)));
}
