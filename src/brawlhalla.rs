use reqwest::Client;
use serde::Deserialize;

use crate::prelude::*;
use crate::ranked::RankedStats;
use crate::steam::SteamId;

/// Integer Brawlhalla account id.
pub type BrawlhallaId = i64;

const API_URL: &str = "https://api.brawlhalla.com";

/// Brief player record from the 1v1 rankings search, used by the
/// name-disambiguation flow.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingEntry {
  pub name: String,
  pub brawlhalla_id: BrawlhallaId,
  pub rating: i32,
  pub region: String,
}

/// Client for the Brawlhalla API. Every request carries the configured
/// `api_key` query parameter.
pub struct BrawlhallaClient {
  client: Client,
  api_key: String,
  base_url: String,
}

impl BrawlhallaClient {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self::with_base_url(api_key, API_URL)
  }

  pub fn with_base_url(
    api_key: impl Into<String>,
    base_url: impl Into<String>,
  ) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      base_url: base_url.into(),
    }
  }

  async fn request(
    &self,
    method: &str,
    params: &[(&str, String)],
  ) -> Result<json::Value> {
    let url = format!("{}/{}", self.base_url, method);
    let mut query = params.to_vec();
    query.push(("api_key", self.api_key.clone()));

    let res = self.client.get(&url).query(&query).send().await?;
    Ok(res.json().await?)
  }

  /// Map a Steam id to a Brawlhalla account id. `Ok(None)` when no
  /// profile is linked to that Steam account.
  pub async fn search(
    &self,
    steam_id: SteamId,
  ) -> Result<Option<BrawlhallaId>> {
    let res = self
      .request("search", &[("steamid", steam_id.to_string())])
      .await?;
    Ok(res.get("brawlhalla_id").and_then(json::Value::as_i64))
  }

  /// Fetch ranked statistics. An empty payload means the account has
  /// never played ranked and yields a `no_data` record.
  pub async fn player_ranked(&self, id: BrawlhallaId) -> Result<RankedStats> {
    let res = self.request(&format!("player/{id}/ranked"), &[]).await?;
    RankedStats::from_payload(res)
  }

  /// Search the 1v1 rankings by in-game name, in ranking order.
  pub async fn rankings(&self, name: &str) -> Result<Vec<RankingEntry>> {
    let res = self
      .request("rankings/1v1/all/1", &[("name", name.to_string())])
      .await?;
    Ok(json::from_value(res)?)
  }
}
