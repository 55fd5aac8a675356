use std::fs;

use ustar::{EntryType, Error, FileAttrs, Header, OctalWidths};

#[test]
fn default_ustar() {
    let h = Header::new();
    assert!(h.is_ustar());
    assert!(!h.is_footer());
    assert_eq!(&h.as_ustar().magic, b"ustar\0");
    assert_eq!(&h.as_ustar().version, b"00");
    assert_eq!(h.entry_type(), EntryType::Regular);
    assert_eq!(h.size(), 0);
    assert_eq!(h.path(), "");
    assert!(h.link_name().is_none());

    let zero = Header::from_bytes(&[0; 512]);
    assert!(zero.is_footer());
    assert!(!zero.is_ustar());
    assert_eq!(zero.username(), None);
}

#[test]
fn link_name() {
    let mut h = Header::new();
    t!(h.set_link_name("foo"));
    assert_eq!(h.link_name().unwrap(), "foo");
    t!(h.set_link_name("foo/bar"));
    assert_eq!(h.link_name_bytes(), Some(&b"foo/bar"[..]));
    t!(h.set_link_name("/abs/../not/resolved"));
    assert_eq!(h.link_name().unwrap(), "/abs/../not/resolved");

    assert!(h.set_link_name("\0").is_err());
    assert!(h.set_link_name(&"l".repeat(101)).is_err());
    t!(h.set_link_name(&"l".repeat(100)));
    assert_eq!(h.link_name().unwrap().len(), 100);
}

#[test]
fn user_and_group_name() {
    let mut h = Header::new();
    t!(h.set_username("foo"));
    t!(h.set_groupname("bar"));
    assert_eq!(h.username(), Some("foo"));
    assert_eq!(h.groupname(), Some("bar"));

    assert!(matches!(
        h.set_username(&"u".repeat(33)),
        Err(Error::PropertyOverflow("uname"))
    ));
    t!(h.set_groupname(&"g".repeat(32)));
    assert_eq!(h.groupname_bytes().unwrap().len(), 32);

    h.as_ustar_mut().uname[0] = 0xff;
    assert_eq!(h.username(), None);
    assert_eq!(h.username_bytes(), Some(&[0xff, b'o', b'o'][..]));
}

#[test]
fn dev_major_minor() {
    let mut h = Header::new();
    t!(h.set_device_major("8"));
    t!(h.set_device_minor("0000001"));
    assert_eq!(h.device_major(), b"8");
    assert_eq!(h.device_minor(), b"0000001");
    assert!(h.set_device_major("123456789").is_err());
}

#[test]
fn set_path() {
    let mut h = Header::new();
    t!(h.set_path("foo"));
    assert_eq!(h.path(), "foo");
    t!(h.set_path("foo/bar"));
    assert_eq!(h.path(), "foo/bar");
    assert!(text(&h.as_ustar().prefix).is_empty());

    let exact = "n".repeat(100);
    t!(h.set_path(&exact));
    assert_eq!(h.path(), exact);
    assert!(text(&h.as_ustar().prefix).is_empty());

    let long_name = "foo".repeat(100);
    let medium1 = "foo".repeat(52);
    let medium2 = "fo/".repeat(52);

    assert!(matches!(h.set_path(&long_name), Err(Error::NameTooLong(_))));
    assert!(matches!(h.set_path(&medium1), Err(Error::NameTooLong(_))));
    assert!(h.set_path("\0").is_err());

    t!(h.set_path(&medium2));
    assert_eq!(h.path(), medium2);
    let prefix = text(&h.as_ustar().prefix).to_vec();
    let name = text(&h.as_ustar().name).to_vec();
    assert!(!prefix.is_empty());
    assert!(name.len() <= 100);
    assert_eq!(
        format!("{}/{}", String::from_utf8_lossy(&prefix), String::from_utf8_lossy(&name)),
        medium2
    );

    // the prefix can't hold everything in front of the last segment
    let deep = format!("{}/file", "p".repeat(160));
    assert!(matches!(h.set_path(&deep), Err(Error::NameTooLong(_))));
}

#[test]
fn set_path_picks_first_fitting_split() {
    let mut h = Header::new();
    let path = vec!["abcdefghij"; 20].join("/");
    t!(h.set_path(&path));
    assert_eq!(text(&h.as_ustar().prefix), vec!["abcdefghij"; 11].join("/").as_bytes());
    assert_eq!(text(&h.as_ustar().name), vec!["abcdefghij"; 9].join("/").as_bytes());
    assert_eq!(h.path(), path);
}

#[test]
fn mode_bits() {
    let mut h = Header::new();
    t!(h.set_mode(0o4755));
    assert_eq!(h.permissions(), 0o4755);
    assert_eq!(h.mode(), 0o104755);

    // sticky and type bits are not stored
    t!(h.set_mode(0o041777));
    assert_eq!(h.permissions(), 0o0777);
    assert_eq!(&h.as_ustar().mode, b"0000777\0");

    h.set_entry_type(EntryType::Directory);
    assert_eq!(h.mode(), 0o040777);
    assert!(h.is_dir());
    h.set_entry_type(EntryType::Link);
    assert_eq!(h.mode(), 0o777);
    h.set_entry_type(EntryType::new(b'x'));
    assert_eq!(h.entry_type(), EntryType::Other(b'x'));
    assert_eq!(h.mode(), 0o777);
}

#[test]
fn numeric_fields() {
    let mut h = Header::new();
    t!(h.set_uid(1000));
    t!(h.set_gid(0o7777777));
    assert_eq!(h.uid(), 1000);
    assert_eq!(h.gid(), 0o7777777);
    assert_eq!(&h.as_ustar().uid, b"0001750\0");
    assert!(matches!(
        h.set_uid(0o100000000),
        Err(Error::PropertyOverflow("uid"))
    ));

    t!(h.set_mtime(1_000_000_000));
    assert_eq!(h.mtime(), 1_000_000_000);
    assert_eq!(&h.as_ustar().mtime, b"07346545000\0");
    t!(h.set_mtime(-5));
    assert_eq!(h.mtime(), 0);

    t!(h.set_size(13));
    assert_eq!(&h.as_ustar().size, b"0000015\0\0\0\0\0");
    assert_eq!(h.content_blocks(), 1);
}

#[test]
fn custom_widths() {
    let widths = OctalWidths {
        mode: 6,
        mtime: 12,
        ..OctalWidths::default()
    };
    let mut h = Header::with_widths(widths);
    assert_eq!(h.widths(), widths);
    t!(h.set_mode(0o644));
    t!(h.set_mtime(1));
    assert_eq!(&h.as_ustar().mode, b"000644\0\0");
    assert_eq!(&h.as_ustar().mtime, b"000000000001");
    assert_eq!(h.mtime(), 1);
}

#[test]
fn content_blocks_follow_type() {
    let mut h = Header::new();
    t!(h.set_size(1025));
    assert_eq!(h.content_blocks(), 3);
    h.set_entry_type(EntryType::Continuous);
    assert_eq!(h.content_blocks(), 3);
    for ty in [
        EntryType::RegularArchived,
        EntryType::Directory,
        EntryType::Symlink,
        EntryType::Link,
        EntryType::Char,
        EntryType::Block,
        EntryType::Fifo,
    ] {
        h.set_entry_type(ty);
        assert_eq!(h.content_blocks(), 0, "{}", ty);
    }
}

#[test]
fn checksum() {
    let mut h = Header::new();
    t!(h.set_path("foobar"));
    t!(h.set_mode(0o644));
    t!(h.set_uid(0));
    t!(h.set_gid(0));
    t!(h.set_mtime(0));
    t!(h.set_size(13));
    assert!(!h.validate());
    t!(h.set_cksum());
    assert!(h.validate());
    t!(h.verify());
    assert_eq!(h.cksum(), h.calculate_cksum());
    assert_eq!(h.cksum().0, 0o6634);
    assert_eq!(&h.as_ustar().cksum, b"0006634\0");

    // the checksum field itself does not contribute
    h.as_ustar_mut().cksum = *b"0006634 ";
    assert!(h.validate());

    h.as_ustar_mut().name[0] = b'g';
    match h.verify() {
        Err(Error::ChecksumMismatch { stored, computed }) => {
            assert_eq!(stored, 0o6634);
            assert_eq!(computed, 0o6635);
        }
        other => panic!("expected a mismatch, got {:?}", other),
    }
}

#[test]
fn attrs() {
    let mut h = Header::new();
    let attrs = FileAttrs {
        mode: 0o120777,
        mtime: 42,
        uid: 7,
        gid: 8,
        username: "alice".to_string(),
        groupname: "staff".to_string(),
    };
    t!(h.set_attrs(&attrs));
    assert_eq!(h.entry_type(), EntryType::Symlink);
    assert_eq!(h.mode(), 0o120777);
    assert_eq!(h.mtime(), 42);
    assert_eq!((h.uid(), h.gid()), (7, 8));
    assert_eq!(h.username(), Some("alice"));
    assert_eq!(h.groupname(), Some("staff"));
}

#[test]
fn set_metadata() {
    let td = t!(tempfile::tempdir());
    let path = td.path().join("f");
    t!(fs::write(&path, b"contents"));

    let mut h = Header::new();
    t!(h.set_metadata(&t!(fs::metadata(&path))));
    assert_eq!(h.entry_type(), EntryType::Regular);
    assert_eq!(h.size(), 0);
    assert!(h.mtime() > 0);

    t!(h.set_metadata(&t!(fs::metadata(td.path()))));
    assert!(h.is_dir());
}

#[test]
fn debug_shows_fields() {
    let mut h = Header::new();
    t!(h.set_path("dbg"));
    let s = format!("{:?}", h);
    assert!(s.contains("\"dbg\""));
    assert!(s.contains("100000"));
}

fn text(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    &field[..end]
}
