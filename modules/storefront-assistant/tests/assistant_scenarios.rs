//! End-to-end runs of `process_user_query` against in-memory stores and
//! scripted providers.

use std::sync::Arc;

use ai_client::{Message, ProviderKind};
use storefront_assistant::decider::CLARIFY_SENTINEL;
use storefront_assistant::generation::EMERGENCY_APOLOGY;
use storefront_assistant::testing::{
    MockCatalog, MockSettings, RecordingProviderFactory, Script, ScriptedProvider,
};
use storefront_assistant::{
    Assistant, AssistantError, FallbackCredentials, GenerationClient, Outcome, QueryContext,
    UserMessage,
};
use storefront_core::{AssistantDefaults, AssistantSettings, CatalogItem, KeyCipher};

const TEST_KEY: &str = "MDEyMzQ1Njc4OTAxMjM0NTY3ODkwMTIzNDU2Nzg5MDE=";

fn cipher() -> KeyCipher {
    KeyCipher::from_base64_key(TEST_KEY).unwrap()
}

fn settings(provider: ProviderKind, clarify: bool, max_questions: usize) -> AssistantSettings {
    AssistantSettings {
        provider,
        api_key: Some(cipher().encrypt("sk-stored").unwrap()),
        model_name: "primary-model".to_string(),
        stopwords: vec!["quiero".into(), "una".into(), "busco".into(), "para".into()],
        clarify_before_recommend: clarify,
        clarify_max_questions: max_questions,
        ..Default::default()
    }
}

fn assistant(
    catalog: MockCatalog,
    settings: MockSettings,
    factory: Arc<RecordingProviderFactory>,
) -> (Assistant, Arc<MockCatalog>) {
    let catalog = Arc::new(catalog);
    let generation = GenerationClient::new(
        factory,
        Some(cipher()),
        FallbackCredentials {
            openai: Some("sk-env-openai".to_string()),
            openrouter: Some("sk-env-openrouter".to_string()),
        },
        AssistantDefaults::default(),
    );
    (
        Assistant::new(catalog.clone(), Arc::new(settings), generation),
        catalog,
    )
}

fn laptop_catalog() -> MockCatalog {
    MockCatalog::new()
        .with_item(
            CatalogItem::new("Zenbook 14 OLED", 3_200_000.0, 3)
                .with_brand("Asus")
                .with_category("Laptops")
                .with_tags(&["ultradelgada", "oled"]),
        )
        .with_item(
            CatalogItem::new("Mouse inalámbrico M185", 60_000.0, 20)
                .with_brand("Logitech")
                .with_category("Periféricos")
                .with_tags(&["inalambrico"]),
        )
}

#[tokio::test]
async fn empty_catalog_answers_without_generation() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("x")));
    let (assistant, _) = assistant(
        MockCatalog::new(),
        MockSettings::with(settings(ProviderKind::OpenAi, true, 3)),
        factory.clone(),
    );

    let result = assistant
        .process_user_query(&UserMessage::new("quiero una laptop", "s-1"), &QueryContext::default())
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::NoInventory);
    assert!(result.content.contains("laptop"));
    assert_eq!(result.follow_up_questions.len(), 2);
    assert_eq!(result.provider, "rules");
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn missing_context_yields_exactly_the_configured_questions() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("x")));
    let (assistant, _) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, true, 2)),
        factory.clone(),
    );

    let result = assistant
        .process_user_query(&UserMessage::new("quiero una laptop", "s-2"), &QueryContext::default())
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Clarify);
    assert_eq!(result.follow_up_questions.len(), 2);
    assert_eq!(result.content.matches(CLARIFY_SENTINEL).count(), 2);
    for question in &result.follow_up_questions {
        assert!(question.to_lowercase().contains("laptop"), "generic: {question}");
    }
    assert_eq!(result.search_terms, vec!["laptops"]);
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn clarifying_questions_name_the_product_not_filler_words() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("x")));
    let catalog = MockCatalog::new().with_item(
        CatalogItem::new("Laptop Lenovo IdeaPad 3", 2_100_000.0, 5)
            .with_brand("Lenovo")
            .with_category("Computadores"),
    );
    let (assistant, _) = assistant(catalog, MockSettings::empty(), factory.clone());

    let result = assistant
        .process_user_query(&UserMessage::new("quiero una laptop", "s-12"), &QueryContext::default())
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Clarify);
    assert_eq!(result.search_terms, vec!["quiero", "una", "laptop"]);
    assert_eq!(result.follow_up_questions.len(), 3);
    for question in &result.follow_up_questions {
        assert!(question.contains("laptop"), "ungrounded: {question}");
        assert!(!question.contains("quiero"), "filler subject: {question}");
    }
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn complete_context_generates_with_grounded_prompt() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying(
        "Te recomiendo el Zenbook 14 OLED.",
    )));
    let (assistant, _) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, true, 3)),
        factory.clone(),
    );
    let context = QueryContext {
        budget: Some(4_000_000.0),
        intended_use: Some("diseño gráfico".to_string()),
        brand_preference: Some("Asus".to_string()),
        history: vec![Message::user("hola"), Message::assistant("¡Hola! ¿Qué buscas?")],
    };
    let message = UserMessage::new("busco una laptop para diseño", "s-3").with_prior_turns(true);

    let result = assistant.process_user_query(&message, &context).await.unwrap();

    assert_eq!(result.outcome, Outcome::Generate);
    assert_eq!(result.content, "Te recomiendo el Zenbook 14 OLED.");
    assert_eq!(result.provider, "openai");
    assert_eq!(result.model, "primary-model");
    assert_eq!(result.tokens_used, Some(42));
    assert!(result.suggested_products.is_empty());

    let calls = factory.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].api_key, "sk-stored");
    assert_eq!(calls[0].request.history.len(), 2);
    assert_eq!(calls[0].request.user, "busco una laptop para diseño");
    assert!(calls[0].request.system.contains("Zenbook 14 OLED"));
    assert!(!calls[0].request.system.contains("M185"));
    assert!(calls[0].request.system.contains("no vuelvas a saludar"));
}

#[tokio::test]
async fn primary_500_retries_once_on_the_alternate_provider() {
    let factory = Arc::new(
        RecordingProviderFactory::new(ScriptedProvider::replying("Respuesta de respaldo"))
            .with(ProviderKind::OpenAi, ScriptedProvider::failing(500)),
    );
    let (assistant, _) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, false, 3)),
        factory.clone(),
    );

    let result = assistant
        .process_user_query(&UserMessage::new("laptop", "s-4"), &QueryContext::default())
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Fallback);
    assert_eq!(result.provider, "openrouter");
    assert_eq!(factory.calls_to(ProviderKind::OpenAi), 1);
    assert_eq!(factory.calls_to(ProviderKind::OpenRouter), 1);

    let fallback = &factory.calls()[1];
    assert_eq!(fallback.api_key, "sk-env-openrouter");
    assert!(fallback.request.history.is_empty());
    assert!(!fallback.request.system.contains("Zenbook"));
}

#[tokio::test]
async fn both_providers_failing_returns_the_emergency_apology() {
    let factory = Arc::new(
        RecordingProviderFactory::new(ScriptedProvider::failing(500))
            .with(ProviderKind::OpenRouter, ScriptedProvider::new(Script::Garbage)),
    );
    let (assistant, _) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, false, 3)),
        factory.clone(),
    );

    let result = assistant
        .process_user_query(&UserMessage::new("laptop", "s-5"), &QueryContext::default())
        .await
        .unwrap();

    assert_eq!(result.provider, "emergency");
    assert_eq!(result.outcome, Outcome::Emergency);
    assert_eq!(result.content, EMERGENCY_APOLOGY);
    assert_eq!(factory.calls().len(), 2);
}

#[tokio::test]
async fn missing_settings_goes_straight_to_fallback() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("ok")));
    let (assistant, _) = assistant(laptop_catalog(), MockSettings::empty(), factory.clone());
    let context = QueryContext {
        budget: Some(5_000_000.0),
        intended_use: Some("oficina".to_string()),
        brand_preference: Some("Asus".to_string()),
        history: Vec::new(),
    };

    let result = assistant
        .process_user_query(&UserMessage::new("laptop", "s-6"), &context)
        .await
        .unwrap();

    // No record: primary is the default provider (openai), which is never
    // called; the alternate is tried once with its env key.
    assert_eq!(result.outcome, Outcome::Fallback);
    assert_eq!(factory.calls().len(), 1);
    assert_eq!(factory.calls()[0].kind, ProviderKind::OpenRouter);
}

#[tokio::test]
async fn unreadable_settings_fall_back_to_default_clarify_policy() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("x")));
    let (assistant, _) = assistant(laptop_catalog(), MockSettings::unreadable(), factory.clone());

    let result = assistant
        .process_user_query(&UserMessage::new("laptop", "s-7"), &QueryContext::default())
        .await
        .unwrap();

    assert_eq!(result.outcome, Outcome::Clarify);
    assert_eq!(result.follow_up_questions.len(), 3);
}

#[tokio::test]
async fn budget_that_empties_results_is_relaxed_once() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("ok")));
    let (assistant, catalog) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, false, 3)),
        factory.clone(),
    );

    let result = assistant
        .process_user_query(
            &UserMessage::new("laptop hasta $1.000.000", "s-8"),
            &QueryContext::default(),
        )
        .await
        .unwrap();

    let filters = catalog.filters();
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0].max_price, Some(1_000_000.0));
    assert_eq!(filters[1].max_price, None);
    assert_eq!(filters[0].terms, filters[1].terms);

    assert_eq!(result.outcome, Outcome::Generate);
    let system = &factory.calls()[0].request.system;
    assert!(system.contains("Zenbook 14 OLED"));
    assert!(system.contains("lo superan"));
}

#[tokio::test]
async fn budget_in_message_filters_inventory() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("ok")));
    let (assistant, catalog) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, false, 3)),
        factory,
    );

    assistant
        .process_user_query(
            &UserMessage::new("laptop hasta $4.000.000", "s-9"),
            &QueryContext::default(),
        )
        .await
        .unwrap();

    let filters = catalog.filters();
    assert_eq!(filters.len(), 1);
    assert_eq!(filters[0].max_price, Some(4_000_000.0));
}

#[tokio::test]
async fn catalog_failure_is_surfaced() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("x")));
    let (assistant, _) = assistant(
        MockCatalog::failing(),
        MockSettings::with(settings(ProviderKind::OpenAi, true, 3)),
        factory.clone(),
    );

    let err = assistant
        .process_user_query(&UserMessage::new("laptop", "s-10"), &QueryContext::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AssistantError::Catalog(_)));
    assert!(factory.calls().is_empty());
}

#[tokio::test]
async fn stopwords_only_message_queries_without_terms() {
    let factory = Arc::new(RecordingProviderFactory::new(ScriptedProvider::replying("x")));
    let (assistant, catalog) = assistant(
        laptop_catalog(),
        MockSettings::with(settings(ProviderKind::OpenAi, true, 3)),
        factory,
    );

    let result = assistant
        .process_user_query(&UserMessage::new("quiero una", "s-11"), &QueryContext::default())
        .await
        .unwrap();

    assert!(result.search_terms.is_empty());
    assert!(catalog.filters()[0].terms.is_empty());
}
