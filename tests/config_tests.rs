use std::path::PathBuf;

use zoom_screensaver::config::Configuration;
use zoom_screensaver::error::Error;

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
photo-library-path: "/photos"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/photos"));
    assert!((cfg.animation.zoom_out_limit - 1.0).abs() < f32::EPSILON);
    assert!((cfg.animation.zoom_in_limit - 1.2).abs() < f32::EPSILON);
    assert_eq!(cfg.animation.dwell_ms, 5000);
    assert_eq!(cfg.animation.fade_ms, 1000);
}

#[test]
fn parse_with_startup_shuffle_seed() {
    let yaml = r#"
photo-library-path: "/p"
startup-shuffle-seed: 7
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(cfg.startup_shuffle_seed, Some(7));
}

#[test]
fn parse_animation_overrides() {
    let yaml = r#"
photo-library-path: "/photos"
animation:
  zoom-in-limit: 1.5
  zoom-speed: 0.02
  pan-speed: 48.0
  pan-speed-jitter: [0.8, 1.2]
  dwell-ms: 8000
  fade-ms: 500
  max-frame-step-ms: 100
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let a = &cfg.animation;
    assert!((a.zoom_in_limit - 1.5).abs() < f32::EPSILON);
    assert!((a.zoom_speed - 0.02).abs() < f32::EPSILON);
    assert!((a.pan_speed - 48.0).abs() < f32::EPSILON);
    assert_eq!(a.pan_speed_jitter, [0.8, 1.2]);
    assert_eq!(a.dwell_ms, 8000);
    assert_eq!(a.fade_ms, 500);
    assert_eq!(a.max_frame_step_ms, 100);
    // untouched fields keep their defaults
    assert!((a.zoom_out_limit - 1.0).abs() < f32::EPSILON);
}

#[test]
fn fade_rate_derives_from_fade_ms() {
    let yaml = r#"
photo-library-path: "/photos"
animation:
  fade-ms: 500
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!((cfg.animation.fade_rate_per_sec() - 2.0).abs() < f32::EPSILON);
}

#[test]
fn validation_rejects_missing_library_path() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn validation_rejects_inverted_zoom_limits() {
    let yaml = r#"
photo-library-path: "/photos"
animation:
  zoom-out-limit: 1.4
  zoom-in-limit: 1.2
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn validation_rejects_zero_dwell() {
    let yaml = r#"
photo-library-path: "/photos"
animation:
  dwell-ms: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn validation_rejects_bad_jitter_range() {
    let yaml = r#"
photo-library-path: "/photos"
animation:
  pan-speed-jitter: [1.5, 0.5]
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn load_from_yaml_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "photo-library-path: \"/photos\"\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap().validated().unwrap();
    assert_eq!(cfg.photo_library_path, PathBuf::from("/photos"));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("nope.yaml");
    assert!(matches!(
        Configuration::from_yaml_file(&missing),
        Err(Error::Io(_))
    ));
}

#[test]
fn malformed_yaml_is_a_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.yaml");
    std::fs::write(&path, "photo-library-path: [\n").unwrap();
    assert!(matches!(
        Configuration::from_yaml_file(&path),
        Err(Error::Config(_))
    ));
}
