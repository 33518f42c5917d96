mod helpers;

use algofomo_backend::clients::{ImageGenerator, PayoutClient};
use algofomo_backend::error::{AppError, AppResult};
use algofomo_backend::models::{BetRequest, Side, StartGameRequest};
use algofomo_backend::services::image_renderer::DEFAULT_SPELL;
use algofomo_backend::services::ImageRenderer;
use algofomo_backend::store::{GameStore, MemoryStore};
use async_trait::async_trait;
use helpers::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers every verification with `accept` and remembers what it was asked
struct StubVerifier {
    accept: bool,
    checked: Mutex<Vec<(String, String, f64)>>,
}

impl StubVerifier {
    fn new(accept: bool) -> Self {
        Self {
            accept,
            checked: Mutex::new(Vec::new()),
        }
    }

    fn checked(&self) -> Vec<(String, String, f64)> {
        self.checked.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayoutClient for StubVerifier {
    async fn verify_bet_transaction(&self, tx_id: &str, sender: &str, amount_algos: f64) -> AppResult<bool> {
        self.checked
            .lock()
            .unwrap()
            .push((tx_id.to_string(), sender.to_string(), amount_algos));
        Ok(self.accept)
    }

    async fn submit_payout(&self, _receiver: &str, _amount_microalgos: i64, _note: &str) -> AppResult<String> {
        Err(AppError::ExternalService("payouts are not sent from this client".to_string()))
    }
}

/// Hands out numbered URLs and keeps every prompt
#[derive(Default)]
struct RecordingGenerator {
    prompts: Mutex<Vec<(String, i64)>>,
}

impl RecordingGenerator {
    fn prompts(&self) -> Vec<(String, i64)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str, round_id: i64) -> AppResult<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push((prompt.to_string(), round_id));
        Ok(format!("https://img.example.com/battle/{}/{}.png", round_id, prompts.len()))
    }
}

fn paid_bet(round_id: i64, tx_id: &str) -> BetRequest {
    BetRequest {
        tx_id: Some(tx_id.to_string()),
        ..bet_request(round_id, Side::Left, 5, WALLET_A)
    }
}

fn start_request(initial_spell: Option<&str>) -> StartGameRequest {
    StartGameRequest {
        left_player_handle: "leftie".to_string(),
        left_player_avatar_url: "https://img.example.com/l.png".to_string(),
        left_player_display_name: Some("Test Left Player".to_string()),
        right_player_handle: "rightie".to_string(),
        right_player_avatar_url: "https://img.example.com/r.png".to_string(),
        right_player_display_name: Some("Test Right Player".to_string()),
        initial_momentum: 50,
        initial_spell_prompt: initial_spell.map(str::to_string),
        admin_token: None,
    }
}

/// Spawned renders finish on their own schedule
async fn wait_for_prompts(generator: &RecordingGenerator, count: usize) -> Vec<(String, i64)> {
    for _ in 0..100 {
        let prompts = generator.prompts();
        if prompts.len() >= count {
            return prompts;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {} rendered prompts, got {:?}", count, generator.prompts());
}

#[tokio::test]
async fn test_verified_payment_marks_bet_processed() {
    let store = Arc::new(MemoryStore::new());
    let verifier = Arc::new(StubVerifier::new(true));
    let game = test_game_service(store.clone()).with_payment_verifier(verifier.clone());
    let round = game.reset(reset_request(50)).await.unwrap().round;

    let receipt = game.place_bet(paid_bet(round.id, "PAYTX1")).await.unwrap();
    assert!(receipt.bet.processed);
    assert_eq!(receipt.bet.tx_id.as_deref(), Some("PAYTX1"));
    assert_eq!(verifier.checked(), vec![("PAYTX1".to_string(), WALLET_A.to_string(), 5.0)]);

    let stored = store.bets_for_round(round.id, None, 0).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].processed);
}

#[tokio::test]
async fn test_failed_verification_records_nothing() {
    let store = Arc::new(MemoryStore::new());
    let game = test_game_service(store.clone()).with_payment_verifier(Arc::new(StubVerifier::new(false)));
    let round = game.reset(reset_request(50)).await.unwrap().round;

    let err = game.place_bet(paid_bet(round.id, "FORGED")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("FORGED")));
    assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);

    let totals = store.bet_totals(round.id).await.unwrap();
    assert_eq!(totals.count, 0);
    let unchanged = store.round_by_id(round.id).await.unwrap().unwrap();
    assert_eq!(unchanged.momentum, 50);
    assert_eq!(unchanged.current_deadline, round.current_deadline);
}

#[tokio::test]
async fn test_bets_without_transaction_skip_verification() {
    let store = Arc::new(MemoryStore::new());
    let verifier = Arc::new(StubVerifier::new(false));
    let game = test_game_service(store.clone()).with_payment_verifier(verifier.clone());
    let round = game.reset(reset_request(50)).await.unwrap().round;

    let receipt = game
        .place_bet(bet_request(round.id, Side::Right, 5, WALLET_B))
        .await
        .unwrap();
    assert!(!receipt.bet.processed);
    assert!(verifier.checked().is_empty());

    // Without a verifier a transaction id is stored but not trusted
    let unverified = test_game_service(store.clone());
    let receipt = unverified.place_bet(paid_bet(round.id, "PAYTX2")).await.unwrap();
    assert!(!receipt.bet.processed);
    assert_eq!(receipt.bet.tx_id.as_deref(), Some("PAYTX2"));
}

#[tokio::test]
async fn test_render_stores_image_for_active_round() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(RecordingGenerator::default());
    let renderer = ImageRenderer::new(store.clone(), generator.clone());
    let round = test_game_service(store.clone())
        .reset(reset_request(50))
        .await
        .unwrap()
        .round;

    let url = renderer.render(round.id, None).await.unwrap();
    let expected = format!("https://img.example.com/battle/{}/1.png", round.id);
    assert_eq!(url.as_deref(), Some(expected.as_str()));

    let stored = store.round_by_id(round.id).await.unwrap().unwrap();
    assert_eq!(stored.battle_image_url.as_deref(), Some(expected.as_str()));

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].1, round.id);
    assert!(prompts[0].0.contains("Left Player vs Right Player"));
    assert!(prompts[0].0.ends_with(&format!("last spell: {}", DEFAULT_SPELL)));
}

#[tokio::test]
async fn test_render_skips_inactive_round() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(RecordingGenerator::default());
    let renderer = ImageRenderer::new(store.clone(), generator.clone());
    let game = test_game_service(store.clone());

    let old = game.reset(reset_request(50)).await.unwrap().round;
    game.reset(reset_request(50)).await.unwrap();

    assert_eq!(renderer.render(old.id, None).await.unwrap(), None);
    assert_eq!(renderer.render(old.id + 100, None).await.unwrap(), None);
    assert!(generator.prompts().is_empty());

    let stored = store.round_by_id(old.id).await.unwrap().unwrap();
    assert!(stored.battle_image_url.is_none());
}

#[tokio::test]
async fn test_render_prompt_uses_latest_spell() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(RecordingGenerator::default());
    let renderer = ImageRenderer::new(store.clone(), generator.clone());
    let game = test_game_service(store.clone());
    let round = game.reset(reset_request(50)).await.unwrap().round;

    let mut first = bet_request(round.id, Side::Left, 5, WALLET_A);
    first.spell = "frost nova".to_string();
    game.place_bet(first).await.unwrap();
    let mut second = bet_request(round.id, Side::Right, 5, WALLET_B);
    second.spell = "chain lightning".to_string();
    game.place_bet(second).await.unwrap();

    renderer.render(round.id, None).await.unwrap();
    renderer
        .render(round.id, Some("a custom scene".to_string()))
        .await
        .unwrap();

    let prompts = generator.prompts();
    assert!(prompts[0].0.ends_with("last spell: chain lightning"));
    assert_eq!(prompts[1].0, "a custom scene");

    let stored = store.round_by_id(round.id).await.unwrap().unwrap();
    assert_eq!(
        stored.battle_image_url,
        Some(format!("https://img.example.com/battle/{}/2.png", round.id))
    );
}

#[tokio::test]
async fn test_start_game_renders_opening_image() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(RecordingGenerator::default());
    let renderer = Arc::new(ImageRenderer::new(store.clone(), generator.clone()));
    let game = test_game_service(store.clone()).with_renderer(renderer);

    let round = game
        .start_game(start_request(Some("  Initial battle spell  ")))
        .await
        .unwrap();

    let prompts = wait_for_prompts(&generator, 1).await;
    assert_eq!(prompts[0].1, round.id);
    assert!(prompts[0].0.contains("Test Left Player vs Test Right Player"));
    assert!(prompts[0].0.ends_with("Initial battle spell"));

    let round = game.start_game(start_request(None)).await.unwrap();
    let prompts = wait_for_prompts(&generator, 2).await;
    assert_eq!(prompts[1].1, round.id);
    assert!(prompts[1].0.ends_with(DEFAULT_SPELL));
}
