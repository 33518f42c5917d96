//! PostgreSQL store tests.
//!
//! These need a reachable server in `DATABASE_URL`; run with
//! `cargo test --test database_test -- --ignored`.

mod helpers;

use algofomo_backend::error::RepositoryError;
use algofomo_backend::models::*;
use algofomo_backend::store::{AppStore, GameStore};
use chrono::{Duration, Utc};
use helpers::*;
use rust_decimal::Decimal;
use sqlx::PgPool;

fn new_round(momentum: i32) -> NewRound {
    let now = Utc::now();
    NewRound {
        left_user: TwitterUser::new("@left", "https://img.example.com/l.png", None),
        right_user: TwitterUser::new("@right", "https://img.example.com/r.png", Some("Righty".into())),
        momentum,
        start_time: now,
        current_deadline: now + Duration::minutes(20),
        max_deadline: now + Duration::hours(24),
    }
}

fn new_bet(round_id: i64, side: Side, amount: i64, wallet: &str) -> NewBet {
    NewBet {
        round_id,
        side,
        amount: Decimal::new(amount, 0),
        spell: "lightning strikes twice".to_string(),
        wallet_address: wallet.to_string(),
        impact: 1.5,
        processed: false,
        tx_id: None,
        timestamp: Utc::now(),
    }
}

fn effect(delta: i32) -> BetEffect {
    BetEffect {
        momentum_delta: delta,
        deadline_extension: Duration::seconds(60),
        placed_at: Utc::now(),
    }
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_round_lifecycle(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);

    let round = db.store.create_round(&new_round(50)).await.unwrap();
    assert!(round.active);
    assert_eq!(round.right_user.display_name.as_deref(), Some("Righty"));

    let active = db.active_round().await.expect("round should be active");
    assert_eq!(active.id, round.id);

    let ended = db
        .store
        .end_round(round.id, Winner::Right, "momentum", Utc::now())
        .await
        .unwrap()
        .expect("first end should close the round");
    assert!(!ended.active);
    assert_eq!(ended.winner, Some(Winner::Right));
    assert_eq!(ended.end_reason.as_deref(), Some("momentum"));

    // Already closed
    let again = db
        .store
        .end_round(round.id, Winner::Left, "momentum", Utc::now())
        .await
        .unwrap();
    assert!(again.is_none());

    assert!(db.active_round().await.is_none());
    let past = db.store.past_rounds(10, 0).await.unwrap();
    assert_eq!(past.len(), 1);

    let unpaid = db.store.ended_unpaid_rounds(10).await.unwrap();
    assert_eq!(unpaid.len(), 1);
    db.store.mark_round_paid(round.id).await.unwrap();
    assert!(db.store.ended_unpaid_rounds(10).await.unwrap().is_empty());
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_deactivate_and_battle_image(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);

    let first = db.store.create_round(&new_round(50)).await.unwrap();
    assert_eq!(db.store.deactivate_active_rounds(Utc::now()).await.unwrap(), 1);
    let second = db.store.create_round(&new_round(50)).await.unwrap();

    assert_eq!(db.active_round().await.unwrap().id, second.id);
    let closed = db.store.round_by_id(first.id).await.unwrap().unwrap();
    assert!(!closed.active);
    assert!(closed.winner.is_none());

    assert!(db
        .store
        .set_battle_image(second.id, "https://img.example.com/battle.png")
        .await
        .unwrap());
    assert!(!db.store.set_battle_image(9999, "https://x").await.unwrap());
    let round = db.store.round_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(round.battle_image_url.as_deref(), Some("https://img.example.com/battle.png"));
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_record_bet_updates_round(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let round = db.store.create_round(&new_round(50)).await.unwrap();

    let (bet, updated) = db
        .store
        .record_bet(&new_bet(round.id, Side::Right, 5, WALLET_A), &effect(2))
        .await
        .unwrap();
    assert_eq!(bet.round_id, round.id);
    assert_eq!(updated.momentum, 52);
    assert_eq!(updated.pot_amount, Decimal::new(5, 0));
    assert_eq!(updated.current_deadline, round.current_deadline + Duration::seconds(60));

    db.store
        .record_bet(&new_bet(round.id, Side::Left, 3, WALLET_B), &effect(-1))
        .await
        .unwrap();

    let totals = db.store.bet_totals(round.id).await.unwrap();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.left_amount, Decimal::new(3, 0));
    assert_eq!(totals.right_amount, Decimal::new(5, 0));

    let bets = db.store.bets_for_round(round.id, None, 0).await.unwrap();
    assert_eq!(bets.len(), 2);
    assert_eq!(bets[0].wallet_address, WALLET_B);

    let limited = db.store.bets_for_round(round.id, Some(1), 1).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].wallet_address, WALLET_A);
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_record_bet_rejects_closed_round(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let round = db.store.create_round(&new_round(50)).await.unwrap();
    db.store.deactivate_active_rounds(Utc::now()).await.unwrap();

    let err = db
        .store
        .record_bet(&new_bet(round.id, Side::Left, 1, WALLET_A), &effect(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::BusinessRule(_)));
    assert_eq!(db.store.bet_totals(round.id).await.unwrap().count, 0);

    let err = db
        .store
        .record_bet(&new_bet(9999, Side::Left, 1, WALLET_A), &effect(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_payout_records_are_unique_per_bet(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let round = db.store.create_round(&new_round(50)).await.unwrap();
    let (bet, _) = db
        .store
        .record_bet(&new_bet(round.id, Side::Left, 4, WALLET_A), &effect(-1))
        .await
        .unwrap();

    let payout = NewPayout {
        round_id: round.id,
        bet_id: bet.id,
        wallet_address: WALLET_A.to_string(),
        amount_microalgos: 3_600_000,
        tx_id: "TX1".to_string(),
    };
    let stored = db.store.record_payout(&payout).await.unwrap();
    assert_eq!(stored.amount_microalgos, 3_600_000);

    let err = db.store.record_payout(&payout).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)));
    assert_eq!(db.store.payouts_for_round(round.id).await.unwrap().len(), 1);
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_game_service_over_postgres(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let game = db.game_service();

    let round = game.reset(reset_request(50)).await.unwrap().round;
    let receipt = game
        .place_bet(bet_request(round.id, Side::Right, 1000, WALLET_C))
        .await
        .unwrap();
    assert_eq!(receipt.new_momentum, 53);

    let state = game.current_state().await.unwrap();
    assert_eq!(state.total_bets_count, 1);
    assert_eq!(state.right_side_bets_amount, Decimal::new(1000, 0));
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_find_or_create_user_is_idempotent(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);

    assert!(db.store.find_user("42").await.unwrap().is_none());
    let first = db.store.find_or_create_user("42").await.unwrap();
    let second = db.store.find_or_create_user("42").await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(db.store.find_user("42").await.unwrap().unwrap().id, first.id);
}

#[sqlx::test(migrator = "algofomo_backend::database::MIGRATOR")]
#[ignore = "requires a PostgreSQL database"]
async fn test_user_app_crud(pool: PgPool) {
    let db = TestDatabase::from_pool(pool);
    let owner = db.store.find_or_create_user("777").await.unwrap();

    let app = db
        .store
        .create_user_app(
            &owner,
            &NewUserApp {
                name: "100% Weather_Bot".to_string(),
                url: "https://weather.example.com/".to_string(),
                description: "forecasts".to_string(),
                required_env_vars: vec![vec!["API_KEY".into(), "key".into()]],
            },
        )
        .await
        .unwrap();
    assert_eq!(app.owner_telegram_id, "777");
    assert!(app.is_active);

    let fetched = db.store.get_user_app(app.id).await.unwrap().unwrap();
    assert_eq!(fetched.required_env_vars, app.required_env_vars);

    // LIKE wildcards in the needle are matched literally
    let found = db
        .store
        .query_user_apps(&UserAppFilter {
            name_contains: Some("0% weather_".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let none = db
        .store
        .query_user_apps(&UserAppFilter {
            name_contains: Some("%x%".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());

    let updated = db
        .store
        .update_user_app(
            app.id,
            &UserAppUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(!updated.is_active);
    assert_eq!(updated.name, app.name);
    assert!(updated.updated_at >= app.updated_at);

    let inactive = db
        .store
        .query_user_apps(&UserAppFilter {
            telegram_id: Some("777".into()),
            is_active: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);

    assert!(db.store.delete_user_app(app.id).await.unwrap());
    assert!(!db.store.delete_user_app(app.id).await.unwrap());
    assert!(db
        .store
        .update_user_app(app.id, &UserAppUpdate::default())
        .await
        .unwrap()
        .is_none());
}
