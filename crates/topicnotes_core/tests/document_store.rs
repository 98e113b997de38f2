use std::fs;
use std::sync::Arc;
use std::thread;
use topicnotes_core::{DocumentStore, Note};

#[test]
fn reload_returns_identical_notes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.xml");

    let saved = vec![
        ("Rust", Note::new("ownership", "moves & borrows <T>", "01/01/2024 10:00:00")),
        ("Rust", Note::new("traits", "\"quoted\" text", "02/01/2024 11:30:00")),
        ("Go", Note::new("channels", "CSP style", "03/01/2024 12:45:59")),
    ];
    let before = {
        let store = DocumentStore::load(&path).unwrap();
        for (topic, note) in &saved {
            store.append_note(topic, note.clone()).unwrap();
        }
        store.snapshot()
    };

    let reloaded = DocumentStore::load(&path).unwrap();
    assert_eq!(reloaded.snapshot(), before);
    assert_eq!(
        reloaded.list_topics(),
        vec!["Rust".to_string(), "Go".to_string()]
    );
    assert_eq!(
        reloaded.list_notes("Rust").unwrap(),
        vec![saved[0].1.clone(), saved[1].1.clone()]
    );
    assert_eq!(reloaded.list_notes("Go").unwrap(), vec![saved[2].1.clone()]);
}

#[test]
fn persisted_file_has_topic_and_note_elements() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.xml");
    let store = DocumentStore::load(&path).unwrap();

    store
        .append_note("Rust", Note::new("n1", "body", "01/01/2024 10:00:00"))
        .unwrap();

    let xml = fs::read_to_string(&path).unwrap();
    assert!(xml.contains(r#"<topic name="Rust">"#));
    assert!(xml.contains(r#"<note name="n1">"#));
    assert!(xml.contains("<text>body</text>"));
    assert!(xml.contains("<timestamp>01/01/2024 10:00:00</timestamp>"));
}

#[test]
fn find_topic_and_list_notes_report_unknown_topics() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::load(dir.path().join("database.xml")).unwrap();

    assert!(store.find_topic("missing").is_none());
    assert!(store.list_notes("missing").is_none());

    store.upsert_topic("present").unwrap();
    let topic = store.find_topic("present").unwrap();
    assert_eq!(topic.name(), "present");
    assert!(topic.notes().is_empty());
    assert_eq!(store.list_notes("present").unwrap(), Vec::<Note>::new());
}

#[test]
fn concurrent_appends_under_one_topic_lose_nothing() {
    const WORKERS: usize = 32;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.xml");
    let store = Arc::new(DocumentStore::load(&path).unwrap());

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .append_note(
                        "shared",
                        Note::new(format!("note-{worker}"), "text", "01/01/2024 00:00:00"),
                    )
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.list_topics(), vec!["shared".to_string()]);
    assert_eq!(store.list_notes("shared").unwrap().len(), WORKERS);

    let reloaded = DocumentStore::load(&path).unwrap();
    assert_eq!(reloaded.list_topics(), vec!["shared".to_string()]);
    let mut names: Vec<String> = reloaded
        .list_notes("shared")
        .unwrap()
        .into_iter()
        .map(|note| note.name)
        .collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), WORKERS);
}

#[test]
fn concurrent_appends_across_topics_create_each_topic_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DocumentStore::load(dir.path().join("database.xml")).unwrap());

    thread::scope(|scope| {
        for worker in 0..24 {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                let topic = format!("topic-{}", worker % 4);
                store
                    .append_note(&topic, Note::new("n", "t", "01/01/2024 00:00:00"))
                    .unwrap();
            });
        }
    });

    let mut topics = store.list_topics();
    topics.sort();
    assert_eq!(topics, vec!["topic-0", "topic-1", "topic-2", "topic-3"]);
    for topic in &topics {
        assert_eq!(store.list_notes(topic).unwrap().len(), 6);
    }
}
