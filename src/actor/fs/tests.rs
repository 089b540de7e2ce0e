use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use super::debouncer::{Debouncer, Edit};
use super::process_changes;
use crate::actor::messages::RebuildMsg;
use crate::plugin::ChangeSet;

const SETTLE: Duration = Duration::from_millis(300);

fn make_event(paths: Vec<&str>, kind: notify::EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Data(
        notify::event::DataChange::Any,
    ))
}

fn metadata_kind() -> notify::EventKind {
    notify::EventKind::Modify(notify::event::ModifyKind::Metadata(
        notify::event::MetadataKind::WriteTime,
    ))
}

fn create_kind() -> notify::EventKind {
    notify::EventKind::Create(notify::event::CreateKind::File)
}

fn remove_kind() -> notify::EventKind {
    notify::EventKind::Remove(notify::event::RemoveKind::File)
}

#[test]
fn test_debouncer_empty() {
    let debouncer = Debouncer::new(SETTLE);
    assert!(!debouncer.is_ready());
}

#[test]
fn test_event_routing_by_kind() {
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/src/foo/a.ts"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/src/foo/b.ts"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/src/foo/c.ts"], remove_kind()));

    assert_eq!(debouncer.changes.len(), 3);
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/src/foo/a.ts")],
        Edit::Created
    );
    assert_eq!(
        debouncer.changes[&PathBuf::from("/tmp/src/foo/c.ts")],
        Edit::Removed
    );
}

#[test]
fn test_metadata_and_temp_files_ignored() {
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/src/foo/a.ts"], metadata_kind()));
    assert!(debouncer.last_event.is_none());

    debouncer.add_event(&make_event(vec!["/tmp/src/foo/a.ts"], modify_kind()));
    let first_time = debouncer.last_event.unwrap();
    std::thread::sleep(Duration::from_millis(5));

    debouncer.add_event(&make_event(
        vec!["/tmp/src/foo/.a.ts.swp", "/tmp/src/foo/a.ts~"],
        modify_kind(),
    ));
    assert_eq!(debouncer.last_event.unwrap(), first_time);
    assert_eq!(debouncer.changes.len(), 1);
}

#[test]
fn test_dedup_first_event_wins() {
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], modify_kind()));

    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.ts")], Edit::Created);
}

#[test]
fn test_remove_then_create_restores() {
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], remove_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], create_kind()));
    assert_eq!(debouncer.changes.len(), 1);
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.ts")], Edit::Created);
}

#[test]
fn test_create_then_remove_discards() {
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], create_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], remove_kind()));
    assert!(debouncer.changes.is_empty(), "created+removed should discard");
}

#[test]
fn test_modify_then_remove_upgrades() {
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], remove_kind()));
    assert_eq!(debouncer.changes[&PathBuf::from("/tmp/a.ts")], Edit::Removed);
}

#[test]
fn test_sleep_duration_no_events() {
    let debouncer = Debouncer::new(SETTLE);
    assert!(debouncer.sleep_duration() >= Duration::from_secs(3600));
}

#[test]
fn test_sleep_duration_after_event() {
    let mut debouncer = Debouncer::new(SETTLE);
    debouncer.last_event = Some(Instant::now());

    let dur = debouncer.sleep_duration();
    assert!(dur >= SETTLE - Duration::from_millis(10));
    assert!(dur <= SETTLE);
}

#[test]
fn test_not_ready_until_settled() {
    let mut debouncer = Debouncer::new(SETTLE);
    debouncer.add_event(&make_event(vec!["/tmp/a.ts"], modify_kind()));
    assert!(debouncer.take_if_ready().is_none());

    debouncer.last_event = Some(Instant::now() - SETTLE);
    let changes = debouncer.take_if_ready().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(debouncer.changes.is_empty());
    assert!(debouncer.last_event.is_none());
}

#[tokio::test]
async fn test_settled_events_become_one_change_set() {
    let (tx, mut rx) = mpsc::channel(4);
    let mut debouncer = Debouncer::new(SETTLE);

    debouncer.add_event(&make_event(vec!["/tmp/src/bar/a.ts"], modify_kind()));
    debouncer.add_event(&make_event(vec!["/tmp/src/bar/b.ts"], create_kind()));
    debouncer.last_event = Some(Instant::now() - SETTLE);

    process_changes(&mut debouncer, &tx).await.unwrap();
    match rx.try_recv().unwrap() {
        RebuildMsg::Change(ChangeSet::Paths(paths)) => {
            let paths: Vec<_> = paths.into_iter().collect();
            assert_eq!(
                paths,
                vec![PathBuf::from("/tmp/src/bar/a.ts"), PathBuf::from("/tmp/src/bar/b.ts")]
            );
        }
        other => panic!("unexpected message: {other:?}"),
    }

    // Nothing pending, nothing sent
    process_changes(&mut debouncer, &tx).await.unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_edit_display() {
    assert_eq!(Edit::Created.to_string(), "created");
    assert_eq!(Edit::Removed.to_string(), "removed");
}
