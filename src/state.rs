use teloxide::Bot;

use crate::brawlhalla::{BrawlhallaClient, RankingEntry};
use crate::prelude::*;
use crate::steam::SteamClient;
use crate::store::Store;
use crate::sv;

#[derive(Debug, Clone)]
pub struct Config {
  /// Seconds a disambiguation prompt stays answerable.
  pub prompt_lifetime: i64,
  /// Keyboard size cap for name matches.
  pub max_choices: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self { prompt_lifetime: 60, max_choices: 8 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingAction {
  Rank,
  Link,
}

/// An open disambiguation prompt, keyed by chat id. Only the issuing
/// user may answer it.
#[derive(Debug, Clone)]
pub struct Pending {
  pub user_id: i64,
  pub action: PendingAction,
  pub matches: Vec<RankingEntry>,
  pub created_at: DateTime,
}

pub type Prompts = DashMap<i64, Pending>;

pub struct Services<'a> {
  pub links: sv::Links<'a>,
}

pub struct AppState {
  pub store: Store,
  pub steam: SteamClient,
  pub brawlhalla: BrawlhallaClient,
  pub bot: Bot,
  pub prompts: Prompts,
  pub config: Config,
}

impl AppState {
  pub async fn new(
    db_url: &str,
    bot_token: &str,
    steam_key: &str,
    brawlhalla_key: &str,
  ) -> Self {
    Self::with_config(
      db_url,
      bot_token,
      steam_key,
      brawlhalla_key,
      Config::default(),
    )
    .await
  }

  pub async fn with_config(
    db_url: &str,
    bot_token: &str,
    steam_key: &str,
    brawlhalla_key: &str,
    config: Config,
  ) -> Self {
    info!("Connecting to database...");
    let store =
      Store::connect(db_url).await.expect("Failed to connect to database");

    Self {
      store,
      steam: SteamClient::new(steam_key),
      brawlhalla: BrawlhallaClient::new(brawlhalla_key),
      bot: Bot::new(bot_token),
      prompts: DashMap::new(),
      config,
    }
  }

  pub fn sv(&self) -> Services<'_> {
    Services { links: sv::Links::new(&self.store) }
  }

  /// Drop disambiguation prompts past their lifetime. Answering an
  /// expired prompt is then silently ignored.
  pub fn gc_prompts(&self) {
    let now = Utc::now().naive_utc();
    let lifetime = self.config.prompt_lifetime;

    self
      .prompts
      .retain(|_chat, pending| {
        (now - pending.created_at).num_seconds() < lifetime
      });
  }
}
