/*!
 * Tests for provider retry behavior.
 */

use pagelingo::app_config::KeyedProviderConfig;
use pagelingo::errors::ProviderError;
use pagelingo::providers::keyed::KeyedTranslator;
use pagelingo::providers::TranslationProvider;

#[tokio::test]
async fn test_keyedTranslate_largeAttemptCount_shouldExhaustWithoutPanicking() {
    // Nothing listens on the discard port, so every attempt fails fast;
    // with zero base backoff the attempt counter still drives the shift
    let config = KeyedProviderConfig {
        api_key: "key".to_string(),
        endpoint: "http://127.0.0.1:9".to_string(),
        max_attempts: 70,
        backoff_base_ms: 0,
        request_timeout_secs: 1,
    };
    let translator = KeyedTranslator::new(&config);

    match translator.translate("Hello", "fr").await {
        Err(ProviderError::Exhausted { attempts, .. }) => assert_eq!(attempts, 70),
        other => panic!("expected exhaustion, got {:?}", other),
    }
}
