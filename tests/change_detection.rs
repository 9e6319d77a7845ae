// tests/change_detection.rs

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wavebuild::change::{
    ChangeDetector, ChangeGate, ContentHashDetector, Marker, SourceFiles, SourceFilter,
};
use wavebuild::fs::mock::MockFileSystem;
use wavebuild::fs::{FileSystem, RealFileSystem};
use wavebuild::types::ChangeStrategy;
use wavebuild_test_utils::{init_tracing, with_timeout};

const MARKER: &str = "/markers/app.stamp";

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn detector(fs: &MockFileSystem) -> ChangeDetector {
    ChangeDetector::new(Arc::new(fs.clone()), SourceFilter::standard().unwrap())
}

fn hasher(fs: &MockFileSystem) -> ContentHashDetector {
    ContentHashDetector::new(Arc::new(fs.clone()), SourceFilter::standard().unwrap())
}

fn marker() -> Marker {
    Marker::new(MARKER)
}

#[test]
fn missing_marker_means_changed() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "fn main() {}", at(100));

    assert!(detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn older_sources_mean_unchanged() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "fn main() {}", at(100));
    fs.add_file_at("/repo/app/nested/lib.rs", "", at(150));
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn one_newer_source_means_changed() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "fn main() {}", at(100));
    fs.add_file_at("/repo/app/deep/er/lib.rs", "", at(300));
    fs.add_file_at(MARKER, "", at(200));

    assert!(detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn equal_timestamps_are_not_a_change() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "", at(200));
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn output_directories_are_ignored() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/bin/Debug/app.json", "{}", at(300));
    fs.add_file_at("/repo/app/obj/project.assets.json", "{}", at(300));
    fs.add_file_at("/repo/app/nested/target/debug/build.rs", "", at(300));
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn excluded_directory_names_ignore_case() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/Bin/gen.cs", "", at(300));
    fs.add_file_at("/repo/app/OBJ/gen.cs", "", at(300));
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn files_outside_the_allow_list_are_ignored() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/README.md", "# docs", at(300));
    fs.add_file_at("/repo/app/notes.txt", "", at(300));
    fs.add_file_at("/repo/app/main.rs", "", at(100));
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));

    fs.add_file_at("/repo/app/Makefile", "all:", at(300));
    assert!(detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn unreadable_directory_contributes_no_files() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "", at(100));
    fs.make_unreadable("/repo/app/locked");
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn unreadable_root_is_unchanged_once_marked() {
    let fs = MockFileSystem::new();
    fs.make_unreadable("/repo/app");
    fs.add_file_at(MARKER, "", at(200));

    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn mark_up_to_date_then_no_changes() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "", at(100));
    let detector = detector(&fs);

    assert!(detector.has_changes(Path::new("/repo/app"), &marker()));
    detector.mark_up_to_date(&marker()).unwrap();
    assert!(!detector.has_changes(Path::new("/repo/app"), &marker()));

    // A later edit is picked up again.
    fs.set_modified("/repo/app/main.rs", SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    assert!(detector.has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn mark_up_to_date_creates_missing_parent_directories() {
    let fs = MockFileSystem::new();
    let nested = Marker::new("/state/deep/er/app.stamp");

    detector(&fs).mark_up_to_date(&nested).unwrap();

    assert!(fs.is_file(nested.path()));
    assert!(fs.is_dir(Path::new("/state/deep/er")));
}

#[test]
fn marker_names_are_lowercased_and_sanitized() {
    let marker = Marker::for_unit(Path::new("/markers"), "My App/Core");
    assert_eq!(marker.path().parent(), Some(Path::new("/markers")));

    let file_name = marker.path().file_name().unwrap().to_str().unwrap();
    assert!(file_name.starts_with("my_app_core-"), "{file_name}");
    assert!(file_name.ends_with(".stamp"), "{file_name}");

    let same = Marker::for_unit(Path::new("/markers"), "MY APP/CORE");
    assert_eq!(marker, same);
}

#[test]
fn names_with_the_same_sanitized_stem_get_distinct_markers() {
    let dir = Path::new("/markers");
    let markers: Vec<Marker> = ["web app", "web/app", "web_app", "é", "ü"]
        .into_iter()
        .map(|name| Marker::for_unit(dir, name))
        .collect();

    for i in 0..markers.len() {
        for j in (i + 1)..markers.len() {
            assert_ne!(markers[i], markers[j]);
        }
    }
}

#[test]
fn stamping_one_unit_leaves_a_similarly_named_unit_unbuilt() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/a/main.rs", "", at(100));
    fs.add_file_at("/repo/b/main.rs", "", at(100));
    let detector = detector(&fs);

    let first = Marker::for_unit(Path::new("/markers"), "web app");
    let second = Marker::for_unit(Path::new("/markers"), "web_app");
    detector.mark_up_to_date(&first).unwrap();

    assert!(!detector.has_changes(Path::new("/repo/a"), &first));
    assert!(detector.has_changes(Path::new("/repo/b"), &second));
}

#[test]
fn symlinked_directories_are_not_followed() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "", at(100));
    fs.add_symlink("/repo/app/l1", ".");
    fs.add_symlink("/repo/app/l2", ".");
    fs.add_file_at("/repo/shared/lib.rs", "", at(300));
    fs.add_symlink("/repo/app/shared", "../shared");
    fs.add_file_at(MARKER, "", at(200));
    let filter = SourceFilter::standard().unwrap();

    assert!(fs.is_dir(Path::new("/repo/app/shared")));
    assert!(fs.is_symlink(Path::new("/repo/app/shared")));

    let files: Vec<_> = SourceFiles::new(&fs, &filter, Path::new("/repo/app")).collect();
    assert_eq!(files, vec![Path::new("/repo/app/main.rs").to_path_buf()]);
    assert!(!detector(&fs).has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn source_walk_yields_only_allowed_files() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/app/main.rs", "");
    fs.add_file("/repo/app/src/lib.rs", "");
    fs.add_file("/repo/app/src/README.md", "");
    fs.add_file("/repo/app/target/out.rs", "");
    let filter = SourceFilter::standard().unwrap();

    let mut files: Vec<_> = SourceFiles::new(&fs, &filter, Path::new("/repo/app")).collect();
    files.sort();

    assert_eq!(
        files,
        vec![
            Path::new("/repo/app/main.rs").to_path_buf(),
            Path::new("/repo/app/src/lib.rs").to_path_buf(),
        ]
    );
}

#[test]
fn custom_filter_replaces_the_defaults() {
    let filter = SourceFilter::new(["*.md"], ["docs-out"]).unwrap();

    assert!(filter.is_source_file(Path::new("/r/README.MD")));
    assert!(!filter.is_source_file(Path::new("/r/main.rs")));
    assert!(filter.is_excluded_dir(Path::new("/r/Docs-Out")));
    assert!(!filter.is_excluded_dir(Path::new("/r/bin")));
}

#[test]
fn invalid_include_glob_is_rejected() {
    assert!(SourceFilter::new(["src/[a-"], ["bin"]).is_err());
}

#[test]
fn hash_strategy_ignores_timestamps() {
    let fs = MockFileSystem::new();
    fs.add_file_at("/repo/app/main.rs", "fn main() {}", at(100));
    let hasher = hasher(&fs);

    assert!(hasher.has_changes(Path::new("/repo/app"), &marker()));
    hasher.mark_up_to_date(Path::new("/repo/app"), &marker()).unwrap();
    assert!(!hasher.has_changes(Path::new("/repo/app"), &marker()));

    fs.set_modified("/repo/app/main.rs", at(10_000)).unwrap();
    assert!(!hasher.has_changes(Path::new("/repo/app"), &marker()));

    fs.add_file_at("/repo/app/main.rs", "fn main() { todo!() }", at(100));
    assert!(hasher.has_changes(Path::new("/repo/app"), &marker()));
}

#[test]
fn hash_strategy_sees_added_and_renamed_files() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/app/a.rs", "same");
    let hasher = hasher(&fs);
    let before = hasher.fingerprint(Path::new("/repo/app"));

    fs.add_file("/repo/app/b.rs", "");
    let added = hasher.fingerprint(Path::new("/repo/app"));
    assert_ne!(before, added);

    let other = MockFileSystem::new();
    other.add_file("/repo/app/c.rs", "same");
    let renamed = self::hasher(&other).fingerprint(Path::new("/repo/app"));
    assert_ne!(before, renamed);
}

#[test]
fn hash_fingerprint_ignores_output_directories() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/app/main.rs", "fn main() {}");
    let hasher = hasher(&fs);
    let before = hasher.fingerprint(Path::new("/repo/app"));

    fs.add_file("/repo/app/target/debug/gen.rs", "generated");
    assert_eq!(before, hasher.fingerprint(Path::new("/repo/app")));
}

#[test]
fn change_gate_dispatches_on_strategy() {
    let fs = MockFileSystem::new();
    fs.add_file("/repo/app/main.rs", "fn main() {}");

    for strategy in [ChangeStrategy::Timestamp, ChangeStrategy::Hash] {
        let marker = Marker::new(format!("/markers/{strategy:?}.stamp"));
        let gate = ChangeGate::new(strategy, Arc::new(fs.clone()), SourceFilter::standard().unwrap());
        assert_eq!(gate.strategy(), strategy);

        assert!(gate.has_changes(Path::new("/repo/app"), &marker));
        gate.mark_up_to_date(Path::new("/repo/app"), &marker).unwrap();
        assert!(!gate.has_changes(Path::new("/repo/app"), &marker));
    }
}

#[test]
fn real_filesystem_detects_newer_sources() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("app");
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::create_dir_all(root.join("bin")).unwrap();
    std::fs::write(root.join("src/lib.rs"), "pub fn f() {}").unwrap();

    let old = filetime::FileTime::from_unix_time(1_000_000, 0);
    filetime::set_file_mtime(root.join("src/lib.rs"), old).unwrap();

    let marker = Marker::for_unit(&dir.path().join(".wavebuild/markers"), "app");
    let detector = ChangeDetector::new(Arc::new(RealFileSystem), SourceFilter::standard().unwrap());

    assert!(detector.has_changes(&root, &marker));
    detector.mark_up_to_date(&marker).unwrap();
    assert!(marker.path().is_file());
    assert!(!detector.has_changes(&root, &marker));

    // Fresh build output under bin/ does not count.
    std::fs::write(root.join("bin/app.json"), "{}").unwrap();
    let future = filetime::FileTime::from_unix_time(4_000_000_000, 0);
    filetime::set_file_mtime(root.join("bin/app.json"), future).unwrap();
    assert!(!detector.has_changes(&root, &marker));

    filetime::set_file_mtime(root.join("src/lib.rs"), future).unwrap();
    assert!(detector.has_changes(&root, &marker));
}

#[test]
fn missing_root_on_real_filesystem_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let marker = Marker::new(dir.path().join("m.stamp"));
    let detector = ChangeDetector::new(Arc::new(RealFileSystem), SourceFilter::standard().unwrap());

    detector.mark_up_to_date(&marker).unwrap();
    assert!(!detector.has_changes(&dir.path().join("does-not-exist"), &marker));
}

#[cfg(unix)]
#[tokio::test]
async fn self_referential_links_on_real_filesystem_terminate() {
    use std::os::unix::fs::symlink;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("app");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("main.rs"), "fn main() {}").unwrap();
    filetime::set_file_mtime(root.join("main.rs"), filetime::FileTime::from_unix_time(1_000_000, 0))
        .unwrap();
    symlink(".", root.join("l1")).unwrap();
    symlink(".", root.join("l2")).unwrap();

    let marker = Marker::new(dir.path().join("markers/app.stamp"));
    let detector = ChangeDetector::new(Arc::new(RealFileSystem), SourceFilter::standard().unwrap());
    let hasher = ContentHashDetector::new(Arc::new(RealFileSystem), SourceFilter::standard().unwrap());
    detector.mark_up_to_date(&marker).unwrap();

    let changed = with_timeout(tokio::task::spawn_blocking({
        let root = root.clone();
        move || detector.has_changes(&root, &marker)
    }))
    .await
    .unwrap();
    assert!(!changed);

    let fingerprint = with_timeout(tokio::task::spawn_blocking(move || hasher.fingerprint(&root)))
        .await
        .unwrap();
    assert!(!fingerprint.is_empty());
}
