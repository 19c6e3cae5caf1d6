use std::io::Write;
use std::time::Duration;

use reply_guard::config::validate_min_human_score;
use reply_guard::{AppConfig, Error, Record, ReplyFilter, Ruleset, DEFAULT_MIN_HUMAN_SCORE};

#[test]
fn default_ruleset_has_builtin_libraries() {
    let rules = Ruleset::default();
    assert_eq!(rules.promotional.keywords.len(), 54);
    assert_eq!(rules.promotional.patterns.len(), 6);
    assert_eq!(rules.bot.patterns.len(), 7);
    assert_eq!(rules.bot.generic_replies.len(), 7);
    assert_eq!(rules.human.indicators.len(), 53);
    assert_eq!(rules.human.patterns.len(), 6);
    assert_eq!(rules.human.casual_markers.len(), 8);
    assert_eq!(rules.worthiness.indicators.len(), 31);
    assert!(rules.validate().is_ok());
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let rules = Ruleset::from_toml_str(
        r#"
        [promotional]
        max_hashtags = 1

        [human.weights]
        base = 0.5
        "#,
    )
    .unwrap();

    assert_eq!(rules.promotional.max_hashtags, 1);
    assert_eq!(rules.promotional.keywords, Ruleset::default().promotional.keywords);
    assert_eq!(rules.human.weights.base, 0.5);
    assert_eq!(rules.human.weights.indicator, 0.1);

    let filter = ReplyFilter::new(rules).unwrap();
    assert!(filter.is_promotional(&Record::new(1, "loving #rust and #tokio lately")));
    assert!((filter.human_score("") - 0.5).abs() < 1e-9);
}

#[test]
fn empty_keyword_list_disables_keyword_rejection() {
    let text = "Enter the giveaway and tag friends";
    assert!(ReplyFilter::builtin().is_promotional(&Record::new(1, text)));

    let rules = Ruleset::from_toml_str("[promotional]\nkeywords = []\n").unwrap();
    let filter = ReplyFilter::new(rules).unwrap();
    assert!(!filter.is_promotional(&Record::new(1, text)));
}

#[test]
fn custom_pattern_is_case_insensitive() {
    let rules = Ruleset::from_toml_str(
        r#"
        [bot]
        patterns = ['^beep boop$']
        "#,
    )
    .unwrap();
    let filter = ReplyFilter::new(rules).unwrap();
    assert!(filter.is_bot_content(&Record::new(1, "BEEP BOOP")));
    // The replaced list no longer carries the greeting pattern.
    assert!(!filter.is_bot_content(&Record::new(2, "gm")));
}

#[test]
fn invalid_pattern_is_reported() {
    let mut rules = Ruleset::default();
    rules.human.patterns.push("(unclosed".to_string());
    match ReplyFilter::new(rules) {
        Err(Error::Pattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
        other => panic!("expected pattern error, got {other:?}"),
    }
}

#[test]
fn negative_weight_is_rejected() {
    let err = Ruleset::from_toml_str("[human.weights]\nquestion = -0.05\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
    assert!(err.to_string().contains("question"));
}

#[test]
fn infinite_weight_is_rejected() {
    let err = Ruleset::from_toml_str("[human.weights]\nindicator = inf\n").unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got {err:?}");
    assert!(err.to_string().contains("indicator"));

    let mut rules = Ruleset::default();
    rules.human.weights.pronoun_cap = f64::INFINITY;
    assert!(matches!(rules.validate(), Err(Error::Config(_))));

    rules = Ruleset::default();
    rules.human.weights.base = f64::NAN;
    assert!(matches!(rules.validate(), Err(Error::Config(_))));
}

#[test]
fn out_of_range_ratio_is_rejected() {
    let mut rules = Ruleset::default();
    rules.bot.min_unique_word_ratio = 0.0;
    assert!(matches!(rules.validate(), Err(Error::Config(_))));
}

#[test]
fn ruleset_survives_toml_round_trip() {
    let rules = Ruleset::default();
    let toml = rules.to_toml_string().unwrap();
    assert!(toml.contains("[promotional]"));
    assert_eq!(Ruleset::from_toml_str(&toml).unwrap(), rules);
}

#[test]
fn ruleset_loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[worthiness]\nmin_chars = 40\nindicators = []").unwrap();

    let rules = Ruleset::from_file(file.path()).unwrap();
    assert_eq!(rules.worthiness.min_chars, 40);
    assert!(rules.worthiness.indicators.is_empty());
}

#[test]
fn app_config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.filter.min_human_score, DEFAULT_MIN_HUMAN_SCORE);
    assert!(config.filter.rules.is_none());

    let policy = config.fetch.retry_policy();
    assert_eq!(policy.max_attempts, 2);
    assert_eq!(policy.backoff, Duration::from_secs(900));
}

#[test]
fn app_config_loads_from_file_with_ruleset() {
    let dir = tempfile::tempdir().unwrap();
    let rules_path = dir.path().join("rules.toml");
    std::fs::write(&rules_path, "[promotional]\nmax_emoji = 0\n").unwrap();

    let config_path = dir.path().join("reply-guard.toml");
    std::fs::write(
        &config_path,
        format!(
            "[logging]\nlevel = \"debug\"\n\n[filter]\nmin_human_score = 0.5\nrules = {:?}\n\n[fetch]\nrate_limit_backoff_secs = 1\n",
            rules_path.display().to_string()
        ),
    )
    .unwrap();

    let config = AppConfig::load(Some(&config_path)).unwrap();
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.filter.min_human_score, 0.5);
    assert_eq!(config.fetch.max_results, 20);
    assert_eq!(config.fetch.retry_policy().backoff, Duration::from_secs(1));

    let rules = config.ruleset().unwrap();
    assert_eq!(rules.promotional.max_emoji, 0);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn non_finite_threshold_in_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    for value in ["nan", "inf", "1.5", "-0.1"] {
        let path = dir.path().join("reply-guard.toml");
        std::fs::write(&path, format!("[filter]\nmin_human_score = {value}\n")).unwrap();
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(
            err.to_string().contains("min_human_score"),
            "{value}: got {err:?}"
        );
    }

    assert!(validate_min_human_score(0.0).is_ok());
    assert!(validate_min_human_score(1.0).is_ok());
    assert!(validate_min_human_score(f64::NAN).is_err());
}
