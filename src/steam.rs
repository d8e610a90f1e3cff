use reqwest::Client;
use serde::Deserialize;

use crate::prelude::*;

/// 17-digit Steam community id.
pub type SteamId = u64;

const VANITY_URL: &str =
  "https://api.steampowered.com/ISteamUser/ResolveVanityURL/v0001/";

#[derive(Debug, Deserialize)]
struct VanityResponse {
  response: VanityInner,
}

#[derive(Debug, Deserialize)]
struct VanityInner {
  #[serde(default)]
  success: i32,
  steamid: Option<String>,
}

/// Client for the Steam Web API, used to turn free-form profile
/// references into numeric Steam ids.
pub struct SteamClient {
  client: Client,
  api_key: String,
  vanity_url: String,
}

impl SteamClient {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self::with_endpoint(api_key, VANITY_URL)
  }

  pub fn with_endpoint(
    api_key: impl Into<String>,
    vanity_url: impl Into<String>,
  ) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      vanity_url: vanity_url.into(),
    }
  }

  /// Resolve a profile URL, a bare 17-digit id, or a vanity name to a
  /// Steam id. `Ok(None)` means the input could not be resolved; only
  /// transport failures are errors. Makes at most one HTTP request.
  pub async fn resolve_input(&self, input: &str) -> Result<Option<SteamId>> {
    match parse_profile_input(input.trim()) {
      ProfileInput::Id(id) => Ok(Some(id)),
      ProfileInput::Vanity(name) => self.resolve_vanity(&name).await,
    }
  }

  pub async fn resolve_vanity(&self, vanity: &str) -> Result<Option<SteamId>> {
    let res: VanityResponse = self
      .client
      .get(&self.vanity_url)
      .query(&[("key", self.api_key.as_str()), ("vanityurl", vanity)])
      .send()
      .await?
      .json()
      .await?;

    if res.response.success != 1 {
      return Ok(None);
    }
    Ok(res.response.steamid.and_then(|id| id.parse().ok()))
  }
}

#[derive(Debug, PartialEq)]
enum ProfileInput {
  Id(SteamId),
  Vanity(String),
}

fn parse_profile_input(input: &str) -> ProfileInput {
  if let Some(path) = community_path(input) {
    if let Some(id) = path
      .strip_prefix("profiles/")
      .map(segment)
      .and_then(parse_steam_id)
    {
      return ProfileInput::Id(id);
    }
    if let Some(name) = path.strip_prefix("id/").map(segment)
      && !name.is_empty()
    {
      return ProfileInput::Vanity(name.to_string());
    }
    // an unrecognized community URL falls through to vanity resolution,
    // which will report it as unresolvable
  }

  if let Some(id) = parse_steam_id(input) {
    return ProfileInput::Id(id);
  }
  ProfileInput::Vanity(input.to_string())
}

/// Strip the optional scheme and `www.` and return the path after
/// `steamcommunity.com/`, or `None` for anything else.
fn community_path(input: &str) -> Option<&str> {
  let rest = input
    .strip_prefix("https://")
    .or_else(|| input.strip_prefix("http://"))
    .unwrap_or(input);
  let rest = rest.strip_prefix("www.").unwrap_or(rest);
  rest.strip_prefix("steamcommunity.com/")
}

/// Cut a path segment at the first `/`, space or newline.
fn segment(path: &str) -> &str {
  path
    .split(['/', ' ', '\n'])
    .next()
    .unwrap_or_default()
}

fn parse_steam_id(input: &str) -> Option<SteamId> {
  if input.len() != 17 || !input.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  input.parse().ok()
}

#[cfg(test)]
mod tests {
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  use super::*;

  const ID: SteamId = 76561197960287930;

  #[test]
  fn bare_id_is_parsed_directly() {
    assert_eq!(
      parse_profile_input("76561197960287930"),
      ProfileInput::Id(ID)
    );
    // too short, too long, not numeric
    assert_eq!(
      parse_profile_input("7656119796028793"),
      ProfileInput::Vanity("7656119796028793".into())
    );
    assert_eq!(
      parse_profile_input("765611979602879301"),
      ProfileInput::Vanity("765611979602879301".into())
    );
  }

  #[test]
  fn profile_urls_are_parsed_directly() {
    for url in [
      "https://steamcommunity.com/profiles/76561197960287930",
      "http://steamcommunity.com/profiles/76561197960287930",
      "https://www.steamcommunity.com/profiles/76561197960287930",
      "steamcommunity.com/profiles/76561197960287930/",
      "steamcommunity.com/profiles/76561197960287930/games",
    ] {
      assert_eq!(parse_profile_input(url), ProfileInput::Id(ID), "{url}");
    }
  }

  #[test]
  fn vanity_urls_extract_the_name() {
    assert_eq!(
      parse_profile_input("https://steamcommunity.com/id/gabelogannewell"),
      ProfileInput::Vanity("gabelogannewell".into())
    );
    assert_eq!(
      parse_profile_input("steamcommunity.com/id/someName/"),
      ProfileInput::Vanity("someName".into())
    );
  }

  #[test]
  fn malformed_profile_url_falls_back_to_whole_input() {
    // a profiles/ segment that is not a 17-digit id is not extracted
    let input = "steamcommunity.com/profiles/abc";
    assert_eq!(
      parse_profile_input(input),
      ProfileInput::Vanity(input.into())
    );
  }

  #[tokio::test]
  async fn direct_inputs_never_hit_the_network() {
    // an unroutable endpoint: any request would fail the test
    let steam = SteamClient::with_endpoint("key", "http://127.0.0.1:9/");

    let id = steam.resolve_input("76561197960287930").await.unwrap();
    assert_eq!(id, Some(ID));

    let id = steam
      .resolve_input("https://steamcommunity.com/profiles/76561197960287930")
      .await
      .unwrap();
    assert_eq!(id, Some(ID));
  }

  #[tokio::test]
  async fn vanity_name_resolves_via_the_api() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/"))
      .and(query_param("key", "key"))
      .and(query_param("vanityurl", "gabelogannewell"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json::json!({
        "response": { "success": 1, "steamid": ID.to_string() }
      })))
      .expect(1)
      .mount(&server)
      .await;

    let steam = SteamClient::with_endpoint("key", server.uri() + "/");
    let id = steam
      .resolve_input("https://steamcommunity.com/id/gabelogannewell")
      .await
      .unwrap();
    assert_eq!(id, Some(ID));
  }

  #[tokio::test]
  async fn unresolvable_vanity_is_none_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json::json!({
        "response": { "success": 42, "message": "No match" }
      })))
      .mount(&server)
      .await;

    let steam = SteamClient::with_endpoint("key", server.uri() + "/");
    let id = steam.resolve_input("no such name").await.unwrap();
    assert_eq!(id, None);
  }
}
