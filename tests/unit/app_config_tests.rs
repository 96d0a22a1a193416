/*!
 * Tests for configuration loading and validation
 */

use chapterwise::app_config::{Config, TranslationProvider};

use crate::common;

#[test]
fn test_defaultConfig_shouldValidate() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_defaultConfig_shouldCarryBothProviders() {
    let config = Config::default();
    assert!(config.get_provider_config(&TranslationProvider::Gemini).is_some());
    assert!(config.get_provider_config(&TranslationProvider::OpenAI).is_some());
    assert_eq!(config.translation.provider, TranslationProvider::Gemini);
}

#[test]
fn test_validate_withEmptyTargetLanguage_shouldFail() {
    let mut config = Config::default();
    config.target_language = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withInvalidEndpoint_shouldFail() {
    let mut config = Config::default();
    config.translation.available_providers[0].endpoint = "not a url".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroSafetyFactor_shouldFail() {
    let mut config = Config::default();
    config.chunking.safety_factor = 0.0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withZeroRetryAttempts_shouldFail() {
    let mut config = Config::default();
    config.retry.max_attempts = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_fromFile_withMinimalJson_shouldApplyDefaults() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(
        &path,
        r#"{
            "source_language": "English",
            "target_language": "Vietnamese",
            "translation": {
                "provider": "gemini",
                "available_providers": [
                    {"type": "gemini", "model": "gemini-2.5-flash-lite"}
                ]
            }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.chunking.expansion_ratio, 1.8);
    assert_eq!(config.chunking.safety_factor, 0.9);
    assert_eq!(config.context.max_context_chunks, 2);
    assert_eq!(config.retry.max_attempts, 5);
    assert!(config.editor.enabled);
}

#[test]
fn test_fromFile_withUnparseableJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    std::fs::write(&path, "{broken").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_writeExample_shouldRoundTripThroughFromFile() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("example.json");
    Config::write_example(&path).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert!(config.validate().is_ok());
}

#[test]
fn test_resolveStateDir_withExplicitDir_shouldUseIt() {
    let mut config = Config::default();
    config.state_dir = Some("/tmp/custom-state".into());
    assert_eq!(config.resolve_state_dir(), std::path::PathBuf::from("/tmp/custom-state"));
}

#[test]
fn test_resolveApiKey_withEnvVarName_shouldReadEnvironment() {
    // SAFETY: tests in this binary do not read the environment concurrently
    unsafe {
        std::env::set_var("CHAPTERWISE_TEST_KEY", "secret-from-env");
    }
    assert_eq!(Config::resolve_api_key("CHAPTERWISE_TEST_KEY"), "secret-from-env");
    unsafe {
        std::env::remove_var("CHAPTERWISE_TEST_KEY");
    }
}

#[test]
fn test_resolveApiKey_withLiteralKey_shouldReturnItVerbatim() {
    assert_eq!(Config::resolve_api_key("sk-literal-value"), "sk-literal-value");
}

#[test]
fn test_providerFromStr_shouldParseKnownNamesOnly() {
    assert_eq!(
        "gemini".parse::<TranslationProvider>().unwrap(),
        TranslationProvider::Gemini
    );
    assert_eq!(
        "OpenAI".parse::<TranslationProvider>().unwrap(),
        TranslationProvider::OpenAI
    );
    assert!("claude".parse::<TranslationProvider>().is_err());
}
