use scroll_sequence::config::{Configuration, ScriptStep};
use scroll_sequence::motion::MotionMode;
use scroll_sequence::render::renderer::RenderMode;
use std::path::Path;
use std::time::Duration;

#[test]
fn empty_config_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.frames.count, 40);
    assert_eq!(cfg.frames.pattern, "./assets/frames/frame-001 ({index}).jpg");
    assert_eq!(cfg.preload.timeout, Duration::from_millis(3000));
    assert_eq!(cfg.preload.settle_delay, Duration::from_millis(500));
    assert_eq!(cfg.motion.mode, RenderMode::Continuous);
    assert_eq!(cfg.motion_mode(), MotionMode::Continuous { smoothing: 0.15 });
    assert_eq!(cfg.motion.tick_interval, Duration::from_millis(16));
    assert!(cfg.scroll_script.is_empty());
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
frames:
  count: 12
  pattern: "/srv/frames/{index}.png"
preload:
  timeout: 5s
  settle-delay: 0ms
  max-concurrent-fetches: 2
motion:
  mode: discrete
viewport:
  width: 800
  height: 600
page:
  scroll-height: 4000
linger: 250ms
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.frames.count, 12);
    assert_eq!(cfg.preload.timeout, Duration::from_secs(5));
    assert_eq!(cfg.preload.settle_delay, Duration::ZERO);
    assert_eq!(cfg.preload.max_concurrent_fetches, 2);
    assert_eq!(cfg.motion_mode(), MotionMode::Discrete);
    assert_eq!((cfg.viewport().width, cfg.viewport().height), (800, 600));
    assert!((cfg.page.scroll_height - 4000.0).abs() < f64::EPSILON);
    assert_eq!(cfg.linger, Duration::from_millis(250));

    let seq = cfg.frame_sequence().unwrap();
    assert_eq!(seq.len(), 12);
    assert_eq!(seq.get(11).unwrap().locator(), Path::new("/srv/frames/12.png"));
}

#[test]
fn parse_scroll_script() {
    let yaml = r#"
scroll-script:
  - action: scroll
    after: 200ms
    to: 1200
  - action: resize
    after: 1s
    width: 640
    height: 480
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        cfg.scroll_script,
        vec![
            ScriptStep::Scroll {
                after: Duration::from_millis(200),
                to: 1200.0
            },
            ScriptStep::Resize {
                after: Duration::from_secs(1),
                width: 640,
                height: 480
            },
        ]
    );
    assert_eq!(cfg.scroll_script[1].after(), Duration::from_secs(1));
}

#[test]
fn unknown_mode_is_rejected() {
    let yaml = r#"
motion:
  mode: keyframed
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn validation_rejects_bad_values() {
    let cases = [
        "frames: { count: 0 }",
        "frames: { pattern: \"frames/frame.jpg\" }",
        "preload: { timeout: 0s }",
        "preload: { max-concurrent-fetches: 0 }",
        "motion: { smoothing: 0.0 }",
        "motion: { smoothing: 1.5 }",
        "motion: { tick-interval: 0ms }",
        "viewport: { width: 0 }",
        "page: { scroll-height: -10 }",
        "scroll-script: [ { action: resize, after: 0s, width: 0, height: 10 } ]",
    ];
    for yaml in cases {
        let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert!(cfg.validated().is_err(), "expected rejection for {yaml}");
    }
}

#[test]
fn loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "frames:\n  count: 3\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.frames.count, 3);
    assert!(Configuration::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}
