// tests/pipeline_config.rs
use africa_green_data::config::{load_config_default, load_config_from, PipelineConfig};
use std::{env, fs};

#[serial_test::serial]
#[test]
fn shipped_config_parses_and_matches_defaults() {
    let cfg = load_config_from(std::path::Path::new("config/pipeline.toml")).unwrap();
    let def = PipelineConfig::default();
    assert_eq!(cfg.sources, def.sources);
    assert_eq!(cfg.indicator, def.indicator);
    assert_eq!(cfg.publish.path, "africa_green_data.json");
    assert_eq!(cfg.publish.credential_env, "MY_GITHUB_TOKEN");
}

#[test]
fn invalid_files_are_rejected_with_context() {
    let dir = tempfile::tempdir().unwrap();

    let p = dir.path().join("broken.toml");
    fs::write(&p, "news_per_source = \"five\"").unwrap();
    let err = load_config_from(&p).unwrap_err();
    assert!(format!("{err:#}").contains("parsing pipeline config"));

    let p2 = dir.path().join("empty_branch.toml");
    fs::write(&p2, "[publish]\nbranch = \"\"\n").unwrap();
    let err = load_config_from(&p2).unwrap_err();
    assert!(format!("{err:#}").contains("publish.branch"));

    let p3 = dir.path().join("too_many.toml");
    fs::write(&p3, "news_per_source = 20\n").unwrap();
    let err = load_config_from(&p3).unwrap_err();
    assert!(format!("{err:#}").contains("news_per_source must be between 1 and 5"));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Keep the repo's own config/ out of the way
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("PIPELINE_CONFIG_PATH");

    // 1) Nothing on disk -> built-in defaults
    let v = load_config_default().unwrap();
    assert_eq!(v, PipelineConfig::default());

    // 2) Fallback ./config/pipeline.toml
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/pipeline.toml"),
        "news_per_source = 2\n",
    )
    .unwrap();
    assert_eq!(load_config_default().unwrap().news_per_source, 2);

    // 3) Env var wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "news_per_source = 3\n").unwrap();
    env::set_var("PIPELINE_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_config_default().unwrap().news_per_source, 3);

    // 4) Env var pointing nowhere is an error
    env::set_var("PIPELINE_CONFIG_PATH", tmp.path().join("missing.toml"));
    assert!(load_config_default().is_err());
    env::remove_var("PIPELINE_CONFIG_PATH");

    env::set_current_dir(&old).unwrap();
}
