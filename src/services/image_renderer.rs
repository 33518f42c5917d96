use crate::clients::ImageGenerator;
use crate::error::AppResult;
use crate::models::Round;
use crate::store::GameStore;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Spell used in the prompt before anyone has bet
pub const DEFAULT_SPELL: &str = "the arena is vibrant";

/// Prompt describing the current state of a round
pub fn battle_prompt(round: &Round, last_spell: &str) -> String {
    format!(
        "{} vs {}, epic battle in a mystical arena, momentum at {}%, last spell: {}",
        round.left_user.label(),
        round.right_user.label(),
        round.momentum,
        last_spell
    )
}

/// Prompt for the opening image of a freshly started game
pub fn opening_prompt(round: &Round, initial_spell: &str) -> String {
    format!(
        "{} vs {}, epic battle in a mystical arena. {}",
        round.left_user.label(),
        round.right_user.label(),
        initial_spell
    )
}

/// Regenerates the battle image of the active round
pub struct ImageRenderer {
    store: Arc<dyn GameStore>,
    generator: Arc<dyn ImageGenerator>,
}

impl ImageRenderer {
    pub fn new(store: Arc<dyn GameStore>, generator: Arc<dyn ImageGenerator>) -> Self {
        Self { store, generator }
    }

    /// Render and store a new image for `round_id`.
    ///
    /// Does nothing unless the round is still the active one. Returns the
    /// stored URL when an image was produced.
    pub async fn render(&self, round_id: i64, custom_prompt: Option<String>) -> AppResult<Option<String>> {
        let round = match self.store.active_round().await? {
            Some(round) if round.id == round_id => round,
            _ => {
                warn!(round_id, "round is not the active round, skipping battle image");
                return Ok(None);
            }
        };

        let prompt = match custom_prompt {
            Some(prompt) => prompt,
            None => {
                let latest = self.store.bets_for_round(round.id, Some(1), 0).await?;
                let spell = latest.first().map(|b| b.spell.as_str()).unwrap_or(DEFAULT_SPELL);
                battle_prompt(&round, spell)
            }
        };

        info!(round_id, prompt = %prompt, "rendering battle image");
        let url = self.generator.generate(&prompt, round.id).await?;

        if !self.store.set_battle_image(round.id, &url).await? {
            warn!(round_id, "round vanished before the battle image was stored");
            return Ok(None);
        }

        info!(round_id, url = %url, "battle image updated");
        Ok(Some(url))
    }

    /// Render in the background; failures are only logged
    pub fn spawn_render(self: &Arc<Self>, round_id: i64, custom_prompt: Option<String>) {
        let renderer = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = renderer.render(round_id, custom_prompt).await {
                error!(round_id, "battle image render failed: {}", e);
            }
        });
    }
}
