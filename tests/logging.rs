use std::{fs, thread::sleep, time::Duration};

use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("hover.log");

    hover_translate::logging::init(true, Some(path.clone()));
    tracing::info!("lookup pipeline ready");
    hover_translate::logging::init(false, None);
    tracing::info!("second init is ignored");

    sleep(Duration::from_millis(100));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("lookup pipeline ready"));
    assert!(contents.contains("second init is ignored"));
}
