mod brawlhalla;
mod entity;
mod error;
mod prelude;
mod ranked;
mod state;
mod steam;
mod store;
mod sv;
mod telegram;
mod utils;

use std::env;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::prelude::*;
use crate::state::AppState;

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "prawl=debug,teloxide=info,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  // PRAWL_DEV selects the development credential set
  let dev = env::var("PRAWL_DEV")
    .is_ok_and(|flag| flag == "1" || flag.eq_ignore_ascii_case("true"));

  let token = if dev {
    env::var("TELOXIDE_TOKEN_DEV").expect("TELOXIDE_TOKEN_DEV not set")
  } else {
    env::var("TELOXIDE_TOKEN").expect("TELOXIDE_TOKEN not set")
  };
  let steam_key = env::var("STEAM_API_KEY").expect("STEAM_API_KEY not set");
  let brawlhalla_key =
    env::var("BRAWLHALLA_API_KEY").expect("BRAWLHALLA_API_KEY not set");
  let db_url = database_url(dev);

  info!("Starting prawl v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(
    AppState::new(&db_url, &token, &steam_key, &brawlhalla_key).await,
  );

  // Sweep expired disambiguation prompts
  let gc_app = app.clone();
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
      interval.tick().await;
      gc_app.gc_prompts();
    }
  });

  telegram::run_bot(app).await;
}

/// `DATABASE_URL` wins; otherwise a MySQL URL is assembled from parts.
/// Outside dev mode the host is pinned to the local server.
fn database_url(dev: bool) -> String {
  if let Ok(url) = env::var("DATABASE_URL") {
    return url;
  }

  let user =
    env::var("MYSQL_USER").expect("neither DATABASE_URL nor MYSQL_USER set");
  let password = env::var("MYSQL_PASSWORD").expect("MYSQL_PASSWORD not set");
  let database = env::var("MYSQL_DATABASE").unwrap_or_else(|_| "prawl".into());
  let host = if dev {
    env::var("MYSQL_HOST").unwrap_or_else(|_| "127.0.0.1".into())
  } else {
    "127.0.0.1".into()
  };

  format!("mysql://{user}:{password}@{host}/{database}")
}
