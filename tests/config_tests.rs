mod common;
use common::Sandbox;
use predicates::str::contains;

#[test]
fn test_theme_defaults_to_light() {
    let sb = Sandbox::new();
    sb.bt()
        .arg("theme")
        .assert()
        .success()
        .stdout(contains("Theme: light"));
}

#[test]
fn test_theme_toggle_persists() {
    let sb = Sandbox::new();
    sb.bt().args(["theme", "--toggle"]).assert().success();

    let prefs = std::fs::read_to_string(sb.path(".baytracker/preferences.json")).unwrap();
    assert!(prefs.contains("\"dark_mode\": true"));

    sb.bt()
        .arg("theme")
        .assert()
        .success()
        .stdout(contains("Theme: dark"));

    sb.bt().args(["theme", "--light"]).assert().success();
    sb.bt()
        .arg("theme")
        .assert()
        .success()
        .stdout(contains("Theme: light"));
}

#[test]
fn test_config_print_shows_defaults() {
    let sb = Sandbox::new();
    sb.bt()
        .args(["config", "--print"])
        .assert()
        .success()
        .stdout(contains("num_bays: 7"))
        .stdout(contains("warning_seconds: 2700"));
}

#[test]
fn test_configured_bay_count_limits_ids() {
    let sb = Sandbox::new();
    let conf = sb.path(".baytracker/baytracker.conf");
    std::fs::create_dir_all(conf.parent().unwrap()).unwrap();
    std::fs::write(&conf, "num_bays: 3\n").unwrap();

    sb.bt().args(["start", "bay4", "X"]).assert().failure();
    sb.bt().args(["start", "bay3", "X"]).assert().success();
    assert_eq!(sb.board().len(), 3);
}

#[test]
fn test_broken_config_fails_cleanly() {
    let sb = Sandbox::new();
    let conf = sb.path(".baytracker/baytracker.conf");
    std::fs::create_dir_all(conf.parent().unwrap()).unwrap();
    std::fs::write(&conf, "num_bays: [").unwrap();

    sb.bt().arg("status").assert().failure();
}
