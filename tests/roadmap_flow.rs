use roadmapper_lib::payload::{self, PayloadDecode};
use roadmapper_lib::render::render_view;
use roadmapper_lib::roadmap::{parse, parse_roadmap};
use roadmapper_lib::store::{FileStore, KeyValueStore, MemoryStore, DEFAULT_STORAGE_KEY};
use roadmapper_lib::{make_item_id, PersistState, StateStore, StorageKey, Tracker};

const MODEL_OUTPUT: &str = "Here is a roadmap for Web Development.\n\n\
**Phase 1: Foundations**\n\
* **Step 1.1: Markup** Learn semantic HTML\n\
* **Step 1.2: Styling** Learn CSS layout\n\
\n\
Some commentary the model added.\n\
\n\
**Phase 2: JavaScript**\n\
* **Step 2.1: Language** ES6 syntax\n\
* **Step 2.2: Async** Promises and async/await\n\
* DOM manipulation\n\
\n\
**Phase 3: Wrap-up**\n\
Good luck!\n";

#[test]
fn model_output_parses_into_phases() {
    let phases = parse(MODEL_OUTPUT);
    let titles: Vec<&str> = phases.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["Foundations", "JavaScript"]);
    assert_eq!(phases[0].content, ["Learn semantic HTML", "Learn CSS layout"]);
    assert_eq!(
        phases[1].content,
        ["ES6 syntax", "Promises and async/await", "DOM manipulation"]
    );
}

#[test]
fn payload_to_checklist_with_file_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let encoded = payload::encode_payload(MODEL_OUTPUT);
    let PayloadDecode::Valid(raw) = payload::decode_payload(Some(&encoded)) else {
        panic!("payload should decode");
    };

    let store = || StateStore::new(FileStore::new(dir.path()), StorageKey::default());
    let mut tracker = Tracker::open(&raw, store());
    assert_eq!(tracker.progress().total_items(), 5);
    assert_eq!(tracker.progress().progress_percent(), 0);

    tracker.toggle_item("Foundations", "Learn semantic HTML");
    tracker.toggle_item("Foundations", "Learn CSS layout");
    tracker.toggle_item("JavaScript", "ES6 syntax");
    tracker.toggle_phase_expanded("Foundations");

    let reopened = Tracker::open(&raw, store());
    let progress = reopened.progress();
    assert_eq!(progress.completed_count(), 3);
    assert_eq!(progress.progress_percent(), 60);
    assert!(!progress.is_phase_expanded("Foundations"));
    assert!(progress.is_phase_expanded("JavaScript"));
    assert!(progress
        .phase_completion_counts(&reopened.phases()[0])
        .is_complete());

    let text = render_view(&reopened.view("async"));
    assert!(text.contains("Promises and async/await"));
    assert!(!text.contains("ES6 syntax"));
}

#[test]
fn stored_document_uses_the_documented_shape() {
    let backend = MemoryStore::new();
    let mut tracker = Tracker::open(
        "**Phase 1: Basics**\n* HTML",
        StateStore::new(backend.clone(), StorageKey::default()),
    );
    tracker.toggle_item("Basics", "HTML");
    tracker.toggle_phase_expanded("Basics");

    let stored = backend.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(json["completed"]["basics::html"], true);
    assert_eq!(json["expanded"]["Basics"], false);
}

#[test]
fn shared_key_bleeds_between_roadmaps_but_namespaced_keys_do_not() {
    let first = "**Phase 1: Basics**\n* HTML\n* CSS";
    let second = "**Phase 1: Basics**\n* HTML\n* Accessibility";

    let backend = MemoryStore::new();
    let mut a = Tracker::open(first, StateStore::new(backend.clone(), StorageKey::default()));
    a.toggle_item("Basics", "HTML");
    let b = Tracker::open(second, StateStore::new(backend.clone(), StorageKey::default()));
    assert_eq!(b.progress().completed_count(), 1);

    let backend = MemoryStore::new();
    let mut a = Tracker::open(
        first,
        StateStore::new(backend.clone(), StorageKey::for_roadmap(first)),
    );
    a.toggle_item("Basics", "HTML");
    let b = Tracker::open(
        second,
        StateStore::new(backend, StorageKey::for_roadmap(second)),
    );
    assert_eq!(b.progress().completed_count(), 0);
}

#[test]
fn corrupt_file_recovers_and_is_overwritten_on_next_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = FileStore::new(dir.path());
    files.set(DEFAULT_STORAGE_KEY, "{\"completed\": tru").unwrap();

    let mut tracker = Tracker::open(
        "**Phase 1: Basics**\n* HTML",
        StateStore::new(files.clone(), StorageKey::default()),
    );
    assert_eq!(tracker.state(), &PersistState::default());

    tracker.toggle_item("Basics", "HTML");
    let stored = files.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(stored.contains(&make_item_id("Basics", "HTML")));
}

#[test]
fn malformed_expanded_field_keeps_completions_from_every_roadmap() {
    let backend = MemoryStore::new();
    let mut seed = backend.clone();
    seed.set(
        DEFAULT_STORAGE_KEY,
        r#"{"completed":{"basics::html":true,"other::x":true},"expanded":false}"#,
    )
    .unwrap();

    let mut tracker = Tracker::open(
        "**Phase 1: Basics**\n* HTML\n* CSS",
        StateStore::new(backend.clone(), StorageKey::default()),
    );
    assert_eq!(tracker.progress().completed_count(), 1);

    tracker.toggle_item("Basics", "CSS");
    let stored = backend.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(json["completed"]["basics::html"], true);
    assert_eq!(json["completed"]["basics::css"], true);
    assert_eq!(json["completed"]["other::x"], true);
}

#[test]
fn degenerate_inputs_never_fail() {
    let inputs = [
        "",
        "\n\n\n",
        "no structure at all",
        "**Phase 1: Lonely heading**",
        "**Phase 1: A**\n*\n* \n*   ",
        "* only\n* bullets",
        "**Phase x: Bad number**\n* item",
        "**Phase 1: A**\n* **Step 1.1: Label only**",
    ];
    for input in inputs {
        let phases = parse_roadmap(Some(input));
        let tracker = Tracker::from_phases(phases.clone(), StateStore::unavailable());
        let progress = tracker.progress();
        assert!(progress.completed_count() <= progress.total_items(), "{input:?}");
        assert!(progress.progress_percent() <= 100, "{input:?}");
        assert_eq!(
            progress.total_items(),
            phases.iter().map(|p| p.content.len()).sum::<usize>()
        );
    }
}

#[test]
fn invalid_payloads_report_user_messages() {
    assert_eq!(
        payload::decode_input("https://example.test/roadmap/output?theme=dark").message(),
        Some(payload::NO_DATA)
    );
    assert_eq!(
        payload::decode_input("%7Bnot json").message(),
        Some(payload::INVALID_JSON)
    );
    assert_eq!(
        payload::decode_input("{\"topic\":\"rust\"}").message(),
        Some(payload::INVALID_SHAPE)
    );
}
