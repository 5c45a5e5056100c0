/*!
 * Filesystem Operation Tests
 * End-to-end coverage of the public operation set
 */

use pretty_assertions::assert_eq;
use std::time::{Duration, SystemTime};

use memfs::{ErrorKind, MemFs, OpenFlags};

/// Route engine logs through the env-filtered subscriber when a test run
/// sets RUST_LOG
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[test]
fn test_mkdir_then_stat() {
    init_tracing();
    let fs = MemFs::new();

    fs.mkdir("/tmp", 0o755).unwrap();
    let meta = fs.stat("/tmp").unwrap();
    assert!(meta.is_dir());
    assert_eq!(meta.perm(), 0o755);
    assert_eq!(meta.name, "tmp");
}

#[test]
fn test_mkdir_missing_parent() {
    let fs = MemFs::new();
    let err = fs.mkdir("/no/such/parent", 0o755).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_mkdir_existing_fails() {
    let fs = MemFs::new();
    fs.mkdir("/d", 0o755).unwrap();
    let err = fs.mkdir("/d", 0o755).unwrap_err();
    assert!(err.is_already_exists());
}

#[test]
fn test_mkdir_all_idempotent() {
    let fs = MemFs::new();

    fs.mkdir_all("/a/b/c", 0o755).unwrap();
    fs.mkdir_all("/a/b/c", 0o755).unwrap();

    assert!(fs.stat("/a/b/c").unwrap().is_dir());

    // Exactly one /a/b/c: /a/b holds a single entry
    let mut dir = fs.open("/a/b").unwrap();
    assert_eq!(dir.readdirnames(None).unwrap(), ["c"]);
}

#[test]
fn test_mkdir_all_through_file_fails() {
    let fs = MemFs::new();
    fs.write_bytes("/a", 0o644, b"content".to_vec()).unwrap();
    let err = fs.mkdir_all("/a/b", 0o755).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotADirectory);
}

#[test]
fn test_create_write_read_remove() {
    let fs = MemFs::new();

    fs.mkdir("/tmp", 0o755).unwrap();
    let mut f = fs.create("/tmp/x").unwrap();
    f.write_str("hello").unwrap();
    f.close().unwrap();

    let mut f = fs.open("/tmp/x").unwrap();
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
    assert_eq!(buf, b"hello");
    f.close().unwrap();

    fs.remove("/tmp/x").unwrap();
    let err = fs.open("/tmp/x").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_remove_non_empty_directory() {
    let fs = MemFs::new();

    fs.mkdir("/d", 0o755).unwrap();
    fs.mkdir("/d/e", 0o755).unwrap();

    let err = fs.remove("/d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEmpty);

    fs.remove_all("/d").unwrap();
    assert!(!fs.exists("/d"));
    assert!(!fs.exists("/d/e"));
}

#[test]
fn test_remove_all_missing_target_is_success() {
    let fs = MemFs::new();
    fs.remove_all("/never/existed").unwrap();
    fs.remove_all("/gone").unwrap();
}

#[test]
fn test_rename_moves_node() {
    let fs = MemFs::new();

    fs.mkdir("/b", 0o755).unwrap();
    fs.write_bytes("/a", 0o640, b"payload".to_vec()).unwrap();
    let before = fs.stat("/a").unwrap();

    fs.rename("/a", "/b/a").unwrap();

    assert!(fs.stat("/a").unwrap_err().is_not_found());
    let after = fs.stat("/b/a").unwrap();
    assert_eq!(before, after);

    let mut f = fs.open("/b/a").unwrap();
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
    assert_eq!(buf, b"payload");
}

#[test]
fn test_rename_existing_destination_fails() {
    let fs = MemFs::new();

    fs.write_bytes("/a", 0o644, b"aaa".to_vec()).unwrap();
    fs.write_bytes("/b", 0o644, b"bbb".to_vec()).unwrap();

    let err = fs.rename("/a", "/b").unwrap_err();
    assert!(err.is_already_exists());
    assert_eq!(err.to_string(), "rename /a /b: file already exists");

    // Both sides untouched
    assert_eq!(fs.stat("/a").unwrap().size, 3);
    assert_eq!(fs.stat("/b").unwrap().size, 3);
}

#[test]
fn test_rename_into_own_subtree_fails() {
    let fs = MemFs::new();
    fs.mkdir_all("/a/b", 0o755).unwrap();
    let err = fs.rename("/a", "/a/b/a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    // Source still in place
    assert!(fs.stat("/a/b").unwrap().is_dir());
}

#[test]
fn test_rename_directory_keeps_contents() {
    let fs = MemFs::new();
    fs.mkdir_all("/src/inner", 0o755).unwrap();
    fs.write_bytes("/src/inner/f", 0o644, b"x".to_vec()).unwrap();

    fs.rename("/src", "/dst").unwrap();
    assert_eq!(fs.stat("/dst/inner/f").unwrap().size, 1);
    assert!(!fs.exists("/src"));
}

#[test]
fn test_readonly_file_rejects_write_open() {
    let fs = MemFs::new();
    fs.write_bytes("/f", 0o444, b"frozen".to_vec()).unwrap();

    let err = fs
        .open_file("/f", OpenFlags::write_only(), 0o644)
        .unwrap_err();
    assert!(err.is_permission_denied());

    // Reading is still fine
    assert!(fs.open("/f").is_ok());
}

#[test]
fn test_unreadable_directory() {
    let fs = MemFs::new();
    fs.mkdir("/locked", 0o000).unwrap();

    // Listing requires read permission
    let err = fs.open("/locked").unwrap_err();
    assert!(err.is_permission_denied());

    // Traversal through it requires execute permission
    let err = fs.stat("/locked/anything").unwrap_err();
    assert!(err.is_permission_denied());
}

#[test]
fn test_truncate_by_path() {
    let fs = MemFs::new();
    fs.write_bytes("/f", 0o644, b"0123456789".to_vec()).unwrap();

    fs.truncate("/f", 4).unwrap();
    let mut f = fs.open("/f").unwrap();
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
    assert_eq!(buf, b"0123");

    fs.truncate("/f", 6).unwrap();
    let mut f = fs.open("/f").unwrap();
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
    assert_eq!(buf, b"0123\0\0");
}

#[test]
fn test_truncate_directory_fails() {
    let fs = MemFs::new();
    fs.mkdir("/d", 0o755).unwrap();
    let err = fs.truncate("/d", 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IsADirectory);
}

#[test]
fn test_chmod() {
    let fs = MemFs::new();
    fs.write_bytes("/f", 0o644, b"data".to_vec()).unwrap();

    fs.chmod("/f", 0o400).unwrap();
    let meta = fs.stat("/f").unwrap();
    assert_eq!(meta.perm(), 0o400);
    // Type bits survive
    assert!(meta.is_file());

    let err = fs
        .open_file("/f", OpenFlags::write_only(), 0o644)
        .unwrap_err();
    assert!(err.is_permission_denied());
}

#[test]
fn test_chtimes() {
    let fs = MemFs::new();
    fs.write_bytes("/f", 0o644, b"data".to_vec()).unwrap();

    let then = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
    fs.chtimes("/f", SystemTime::now(), then).unwrap();
    assert_eq!(fs.stat("/f").unwrap().modified, then);
}

#[test]
fn test_chown_unsupported() {
    let fs = MemFs::new();
    fs.write_bytes("/f", 0o644, b"data".to_vec()).unwrap();
    let err = fs.chown("/f", 0, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_chdir_and_getwd() {
    let fs = MemFs::new();
    fs.mkdir_all("/a/b", 0o755).unwrap();

    assert_eq!(fs.getwd(), "/");

    fs.chdir("/a").unwrap();
    assert_eq!(fs.getwd(), "/a");

    // Relative change from the new cwd
    fs.chdir("b").unwrap();
    assert_eq!(fs.getwd(), "/a/b");

    fs.chdir("..").unwrap();
    assert_eq!(fs.getwd(), "/a");

    // Ascending above the root is clamped, not an error
    fs.chdir("../../../..").unwrap();
    assert_eq!(fs.getwd(), "/");
}

#[test]
fn test_chdir_to_file_fails() {
    let fs = MemFs::new();
    fs.write_bytes("/f", 0o644, b"data".to_vec()).unwrap();
    let err = fs.chdir("/f").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotADirectory);
}

#[test]
fn test_relative_paths_use_cwd() {
    let fs = MemFs::new();
    fs.mkdir_all("/work/sub", 0o755).unwrap();
    fs.chdir("/work").unwrap();

    fs.write_bytes("sub/f", 0o644, b"rel".to_vec()).unwrap();
    assert_eq!(fs.stat("/work/sub/f").unwrap().size, 3);

    let mut f = fs.open("./sub/f").unwrap();
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
    assert_eq!(buf, b"rel");
}

#[test]
fn test_hard_links_share_content() {
    let fs = MemFs::new();
    fs.write_bytes("/orig", 0o644, b"v1".to_vec()).unwrap();

    fs.link("/orig", "/alias").unwrap();

    // Writing through one name is visible through the other
    let mut f = fs
        .open_file("/alias", OpenFlags::read_write(), 0o644)
        .unwrap();
    f.write(b"v2").unwrap();
    f.close().unwrap();

    let mut f = fs.open("/orig").unwrap();
    let mut buf = Vec::new();
    std::io::Read::read_to_end(&mut f, &mut buf).unwrap();
    assert_eq!(buf, b"v2");

    // Removing one entry leaves the other readable
    fs.remove("/orig").unwrap();
    assert_eq!(fs.stat("/alias").unwrap().size, 2);
}

#[test]
fn test_link_to_directory_fails() {
    let fs = MemFs::new();
    fs.mkdir("/d", 0o755).unwrap();
    let err = fs.link("/d", "/d2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IsADirectory);
}

#[test]
fn test_capacity_limit() {
    let fs = MemFs::with_capacity(10);

    fs.write_bytes("/small", 0o644, b"hello".to_vec()).unwrap();
    assert_eq!(fs.used_bytes(), 5);

    let err = fs
        .write_bytes("/large", 0o644, b"hello world".to_vec())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfSpace);

    // Removal frees capacity
    fs.remove("/small").unwrap();
    fs.write_bytes("/large", 0o644, b"exactly 10".to_vec())
        .unwrap();
    assert_eq!(fs.used_bytes(), 10);
}

#[test]
fn test_error_message_format() {
    let fs = MemFs::new();
    let err = fs.open("/missing").unwrap_err();
    assert_eq!(err.to_string(), "open /missing: file does not exist");

    let err = fs.mkdir("/no/parent", 0o755).unwrap_err();
    assert_eq!(err.to_string(), "mkdir /no/parent: file does not exist");
}

#[test]
fn test_seed_overwrites_and_creates_parents() {
    let fs = MemFs::new();

    fs.write_str("/etc/conf/app.toml", "v = 1").unwrap();
    assert!(fs.stat("/etc/conf").unwrap().is_dir());
    assert_eq!(fs.stat("/etc/conf/app.toml").unwrap().perm(), 0o444);

    // Replacement swaps content and mode
    fs.write_bytes("/etc/conf/app.toml", 0o644, b"v = 2".to_vec())
        .unwrap();
    assert_eq!(fs.stat("/etc/conf/app.toml").unwrap().perm(), 0o644);

    // A directory at the target is not replaced
    fs.mkdir("/etc/conf/d", 0o755).unwrap();
    fs.write_bytes("/etc/conf/d/x", 0o644, b"x".to_vec()).unwrap();
    let err = fs
        .write_bytes("/etc/conf/d", 0o644, b"nope".to_vec())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotEmpty);
}
