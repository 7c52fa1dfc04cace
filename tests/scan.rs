// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

use std::fs;
use std::path::Path;

use pixcull::files::absolute;
use pixcull::scanner::TAG_MARK;
use pixcull::{ScanEvent, ScanOptions, ScanView, Scanner, TagColor, TagFilter, TagIndex};

fn fixture(root: &Path) {
    fs::write(root.join("a.jpg"), vec![0u8; 10]).unwrap();
    fs::write(root.join("b.txt"), b"not an image").unwrap();
    fs::write(root.join("c.PNG"), vec![0u8; 2048]).unwrap();
}

fn scanner(tags: Option<TagIndex>) -> Scanner {
    Scanner::new(ScanOptions::default().with_workers(2).with_batch_size(4), tags)
}

#[tokio::test]
async fn test_scan_filters_and_terminates_once() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());

    let events = scanner(None).start_scan(dir.path()).collect().await;
    assert_eq!(events.len(), 3);
    assert_eq!(events.iter().filter(|e| e.is_finished()).count(), 1);
    assert_eq!(events.last(), Some(&ScanEvent::Finished { found: 2 }));

    let mut found: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Found(result) => Some(result.clone()),
            ScanEvent::Finished { .. } => None,
        })
        .collect();
    found.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    assert_eq!(found[0].file_name, "a.jpg");
    assert_eq!(found[0].size_display, "10.00 B");
    assert_eq!(found[1].file_name, "c.PNG");
    assert_eq!(found[1].size_display, "2.00 KB");
    assert!(found.iter().all(|r| r.total == 3 && !r.is_tagged()));
}

#[tokio::test]
async fn test_scan_ordinals_are_monotonic() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..40 {
        let sub = dir.path().join(format!("d{}", i % 4));
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join(format!("img{}.jpeg", i)), b"x").unwrap();
    }

    let events = scanner(None).start_scan(dir.path()).collect().await;
    let ordinals: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Found(result) => Some(result.ordinal),
            ScanEvent::Finished { .. } => None,
        })
        .collect();

    assert_eq!(ordinals, (1..=40).collect::<Vec<_>>());
    assert_eq!(events.last(), Some(&ScanEvent::Finished { found: 40 }));
}

#[tokio::test]
async fn test_missing_root_yields_only_marker() {
    let dir = tempfile::tempdir().unwrap();
    let events = scanner(None)
        .start_scan(dir.path().join("does-not-exist"))
        .collect()
        .await;
    assert_eq!(events, vec![ScanEvent::Finished { found: 0 }]);
}

#[tokio::test]
async fn test_tagged_files_are_marked() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let tags = TagIndex::open(dir.path().join("db").join("tags.db")).unwrap();
    tags.set_tag(dir.path().join("a.jpg"), TagColor::Green).unwrap();

    let mut stream = scanner(Some(tags.clone())).start_scan(dir.path());
    let mut view = ScanView::new();
    view.begin();
    let summary = view.drain(&mut stream).await;

    assert!(summary.completed);
    assert_eq!(summary.found, 2);
    assert_eq!(summary.tagged, 1);
    assert!(view.is_marked(&dir.path().join("a.jpg")));

    let a = view
        .results()
        .iter()
        .find(|r| r.file_name == "a.jpg")
        .unwrap();
    assert_eq!(a.tag_mark, TAG_MARK);
    assert!(view.can_delete());
    assert_eq!(view.status_line(), "Scan complete, found 2 image files");
}

#[test]
fn test_blocking_drain_outside_runtime() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());

    let mut stream = scanner(None).start_scan(dir.path());
    let mut view = ScanView::new();
    let summary = view.blocking_drain(&mut stream);

    assert!(summary.completed);
    assert_eq!(summary.found, 2);
    assert_eq!(view.discovered().len(), 2);
    assert!(view.selected().is_some());
    assert!(view.can_start_scan());
}

#[test]
fn test_rescan_replaces_previous_results() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let scanner = scanner(None);
    let mut view = ScanView::new();

    let first = tokio_test::block_on(view.drain(&mut scanner.start_scan(dir.path())));
    assert_eq!(first.found, 2);

    fs::remove_file(dir.path().join("a.jpg")).unwrap();
    view.begin();
    assert!(view.is_scanning());
    assert!(!view.can_delete());

    let second = tokio_test::block_on(view.drain(&mut scanner.start_scan(dir.path())));
    assert_eq!(second.found, 1);
    assert_eq!(view.results().len(), 1);
    assert_eq!(view.results()[0].file_name, "c.PNG");
}

#[tokio::test]
async fn test_relative_root_matches_relative_tag() {
    let dir = tempfile::tempdir().unwrap();
    let photos = dir.path().join("photos");
    fs::create_dir(&photos).unwrap();
    fixture(&photos);
    let tags = TagIndex::open(dir.path().join("tags.db")).unwrap();

    // the only test in this binary that depends on the working directory
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();
    tags.set_tag(absolute(Path::new("photos/a.jpg")), TagColor::Red).unwrap();
    let events = scanner(Some(tags.clone())).start_scan("./photos").collect().await;
    std::env::set_current_dir(previous).unwrap();

    let a = events
        .iter()
        .find_map(|e| match e {
            ScanEvent::Found(result) if result.file_name == "a.jpg" => Some(result.clone()),
            _ => None,
        })
        .unwrap();
    assert!(a.is_tagged());
    assert!(!a.path.to_string_lossy().contains("/./"));
    assert_eq!(tags.get_tag(&a.path).unwrap().unwrap().tag_key, "1");
}

#[tokio::test]
async fn test_dotted_root_matches_plain_tag() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let tags = TagIndex::open(dir.path().join("tags.db")).unwrap();
    tags.set_tag(dir.path().join("c.PNG"), TagColor::Blue).unwrap();

    let dotted = dir.path().join(".").join("nested").join("..");
    fs::create_dir(dir.path().join("nested")).unwrap();
    let events = scanner(Some(tags)).start_scan(&dotted).collect().await;

    let tagged: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Found(result) if result.is_tagged() => Some(result.file_name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(tagged, vec!["c.PNG"]);
}

#[tokio::test]
async fn test_scan_does_not_modify_tags() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let tags = TagIndex::open(dir.path().join("tags.db")).unwrap();
    tags.set_tag(dir.path().join("a.jpg"), TagColor::Yellow).unwrap();
    tags.set_tag(dir.path().join("gone.jpg"), TagColor::Gray).unwrap();
    let before = tags.list_files_by_tag(&TagFilter::All).unwrap();

    let events = scanner(Some(tags.clone())).start_scan(dir.path()).collect().await;
    assert_eq!(events.last(), Some(&ScanEvent::Finished { found: 2 }));

    assert_eq!(tags.count().unwrap(), 2);
    assert_eq!(tags.list_files_by_tag(&TagFilter::All).unwrap(), before);
    let record = tags.get_tag(dir.path().join("a.jpg")).unwrap().unwrap();
    assert_eq!(record.color(), Some(TagColor::Yellow));
}

#[tokio::test]
async fn test_mark_and_unmark_after_scan() {
    let dir = tempfile::tempdir().unwrap();
    fixture(dir.path());
    let a = dir.path().join("a.jpg");
    let c = dir.path().join("c.PNG");

    let mut view = ScanView::new();
    view.drain(&mut scanner(None).start_scan(dir.path())).await;
    assert!(view.marked().is_empty());

    view.mark(&a);
    view.mark(&a);
    view.mark(&c);
    assert_eq!(view.marked().len(), 2);
    assert!(view.is_marked(&a));

    view.unmark(&a);
    view.unmark(&a);
    assert!(!view.is_marked(&a));
    assert!(view.is_marked(&c));

    view.remove_paths(&[c.clone()]);
    assert!(view.marked().is_empty());
    assert_eq!(view.results().len(), 1);
}
