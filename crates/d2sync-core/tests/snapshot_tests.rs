use d2sync_core::{AccountProfile, Settings, SnapshotBuilder};
use d2sync_test_utils::TestSteam;

const ACCOUNT: &str = "11111111";

fn profile(steam: &TestSteam) -> AccountProfile {
    AccountProfile {
        id: ACCOUNT.to_string(),
        root: steam.profile_root(ACCOUNT),
        steam_root: steam.userdata(),
    }
}

fn paths(steam: &TestSteam) -> Vec<String> {
    SnapshotBuilder::from_settings(&Settings::default())
        .unwrap()
        .build(&profile(steam))
        .unwrap()
        .records()
        .map(|r| r.path.to_string())
        .collect()
}

#[test]
fn default_ignores_drop_locks_caches_and_state() {
    let steam = TestSteam::new();
    steam.write_all(
        ACCOUNT,
        &[
            ("remote/cfg/autoexec.cfg", "a"),
            ("remote/cfg/config.lock", "l"),
            ("local/cache/shaders.bin", "c"),
            ("remote/cfg/.DS_Store", "d"),
            (".dota2-sync/baseline.toml", "b"),
            (".dota2-sync/backups/x/remote/cfg/autoexec.cfg", "old"),
            ("remote/cfg/.video.txt.abc.d2s-tmp", "partial"),
        ],
    );

    assert_eq!(paths(&steam), vec!["remote/cfg/autoexec.cfg"]);
}

#[test]
fn custom_ignore_patterns_apply() {
    let steam = TestSteam::new();
    steam.write_all(ACCOUNT, &[("remote/cfg/video.txt", "v"), ("remote/cfg/autoexec.cfg", "a")]);

    let settings = Settings {
        ignore: vec!["**/video.txt".to_string()],
        ..Settings::default()
    };
    let snapshot = SnapshotBuilder::from_settings(&settings)
        .unwrap()
        .build(&profile(&steam))
        .unwrap();

    let names: Vec<_> = snapshot.records().map(|r| r.path.to_string()).collect();
    assert_eq!(names, vec!["remote/cfg/autoexec.cfg"]);
}

#[cfg(unix)]
#[test]
fn symlink_cycles_are_not_reentered() {
    let steam = TestSteam::new();
    steam.write_all(ACCOUNT, &[("remote/cfg/autoexec.cfg", "a")]);
    let root = steam.profile_root(ACCOUNT);
    // Points back at an ancestor.
    std::os::unix::fs::symlink(&root, root.join("remote").join("loop")).unwrap();

    assert_eq!(paths(&steam), vec!["remote/cfg/autoexec.cfg"]);
}

#[cfg(unix)]
#[test]
fn linked_directory_is_walked_once() {
    let steam = TestSteam::new();
    steam.write_all(ACCOUNT, &[("remote/cfg/autoexec.cfg", "a")]);
    let root = steam.profile_root(ACCOUNT);
    // "a-link" sorts before "remote", so the real directory is the duplicate.
    std::os::unix::fs::symlink(root.join("remote"), root.join("a-link")).unwrap();

    assert_eq!(paths(&steam), vec!["a-link/cfg/autoexec.cfg"]);
}

#[cfg(unix)]
#[test]
fn symlinked_file_is_followed() {
    let steam = TestSteam::new();
    steam.write_all(ACCOUNT, &[("remote/cfg/autoexec.cfg", "a")]);
    let shared = steam.scratch().join("shared.cfg");
    std::fs::write(&shared, "shared").unwrap();
    std::os::unix::fs::symlink(&shared, steam.profile_root(ACCOUNT).join("remote/cfg/shared.cfg"))
        .unwrap();

    let snapshot = SnapshotBuilder::from_settings(&Settings::default())
        .unwrap()
        .build(&profile(&steam))
        .unwrap();
    let shared_record = snapshot.records().find(|r| r.path.as_str() == "remote/cfg/shared.cfg");
    assert_eq!(shared_record.map(|r| r.size), Some(6));
}
