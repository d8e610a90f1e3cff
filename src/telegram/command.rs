use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;

use super::{ReplyBot, callback};
use crate::brawlhalla::{BrawlhallaId, RankingEntry};
use crate::prelude::*;
use crate::ranked::RankedStats;
use crate::state::{AppState, Pending, PendingAction};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Start,
  Help,
  /// Ranked stats for a Steam profile or the linked account
  Rank(String),
  /// Link a Steam profile to this chat account
  Link(String),
  Unlink,
}

const HELP: &str = "\
<b>Prawl — Brawlhalla ranked stats</b>

/rank &lt;profile&gt; - Ranked stats for a profile
/rank - Ranked stats for your linked account
/link &lt;profile&gt; - Link your account
/unlink - Remove the link
/help - Show this message

A profile is a steamcommunity.com URL, a 17-digit Steam ID,
a Steam vanity name, or an in-game name.";

/// What a command produced: a rendered message, or a set of name
/// matches that needs an interactive pick.
enum Reply {
  Text(String),
  Choices(Vec<RankingEntry>, PendingAction),
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
) -> ResponseResult<()> {
  let result = match &cmd {
    Command::Start | Command::Help => {
      bot.reply_html(HELP).await?;
      return Ok(());
    }
    Command::Rank(target) => rank(&app, bot.user_id, target.trim()).await,
    Command::Link(target) => link(&app, bot.user_id, target.trim()).await,
    Command::Unlink => unlink(&app, bot.user_id).await,
  };

  match result {
    Ok(Reply::Text(text)) => {
      bot.reply_html(text).await?;
    }
    Ok(Reply::Choices(matches, action)) => {
      let keyboard = callback::choice_keyboard(&matches);
      app.prompts.insert(
        bot.chat_id.0,
        Pending {
          user_id: bot.user_id,
          action,
          matches,
          created_at: Utc::now().naive_utc(),
        },
      );
      bot
        .reply_with_keyboard(
          "Several players match that name. Pick one:",
          keyboard,
        )
        .await?;
    }
    Err(err) => {
      if err.is_internal() {
        error!("command failed: {err}");
      }
      bot.reply_html(format!("❌ {}", err.user_message())).await?;
    }
  }

  Ok(())
}

async fn rank(app: &AppState, user_id: i64, target: &str) -> Result<Reply> {
  if target.is_empty() {
    let id = app.sv().links.get(user_id).await?.ok_or(Error::NotLinked)?;
    return Ok(Reply::Text(ranked_text(app, id).await?));
  }

  match resolve_account(app, target).await? {
    Resolved::Account(id) => Ok(Reply::Text(ranked_text(app, id).await?)),
    Resolved::Matches(matches) => {
      Ok(Reply::Choices(matches, PendingAction::Rank))
    }
  }
}

async fn link(app: &AppState, user_id: i64, target: &str) -> Result<Reply> {
  if target.is_empty() {
    return Ok(Reply::Text("Usage: /link &lt;profile&gt;".into()));
  }

  match resolve_account(app, target).await? {
    Resolved::Account(id) => {
      app.sv().links.set(user_id, id).await?;
      Ok(Reply::Text(format!("✅ Linked Brawlhalla ID <code>{id}</code>")))
    }
    Resolved::Matches(matches) => {
      Ok(Reply::Choices(matches, PendingAction::Link))
    }
  }
}

async fn unlink(app: &AppState, user_id: i64) -> Result<Reply> {
  if app.sv().links.delete(user_id).await? {
    Ok(Reply::Text("✅ Account unlinked".into()))
  } else {
    Ok(Reply::Text("No account linked".into()))
  }
}

pub(super) enum Resolved {
  Account(BrawlhallaId),
  Matches(Vec<RankingEntry>),
}

/// Run the resolution chain: Steam id -> Brawlhalla account. When the
/// Steam side cannot resolve the input at all, fall back to an in-game
/// name search and let the user disambiguate.
pub(super) async fn resolve_account(
  app: &AppState,
  input: &str,
) -> Result<Resolved> {
  if let Some(steam_id) = app.steam.resolve_input(input).await? {
    let id =
      app.brawlhalla.search(steam_id).await?.ok_or(Error::NoProfile)?;
    return Ok(Resolved::Account(id));
  }

  let mut matches = app.brawlhalla.rankings(input).await?;
  matches.truncate(app.config.max_choices);

  match matches.len() {
    0 => Err(Error::InvalidProfile),
    1 => Ok(Resolved::Account(matches[0].brawlhalla_id)),
    _ => Ok(Resolved::Matches(matches)),
  }
}

/// Fetch and render ranked stats for an account.
pub(super) async fn ranked_text(
  app: &AppState,
  id: BrawlhallaId,
) -> Result<String> {
  let ranked = app.brawlhalla.player_ranked(id).await?;
  if ranked.no_data {
    return Err(Error::NoRankedData);
  }
  Ok(render_ranked(&ranked))
}

fn render_ranked(ranked: &RankedStats) -> String {
  let mut text =
    format!("<b>{}</b> ({})\n", html::escape(&ranked.name), ranked.region);

  if let (Some(highest), Some(most)) =
    (ranked.highest_rated(), ranked.most_played())
  {
    text.push_str(&format!(
      "<b>Highest rating</b>: {} ({})\n",
      highest.name, highest.rating
    ));
    text.push_str(&format!(
      "<b>Most played</b>: {} ({} {})\n",
      most.name,
      most.games,
      utils::plural(most.games, "game", "games"),
    ));
  }
  text.push_str(&format!("<b>Estimated Glory</b>: {}\n", ranked.glory()));

  text.push_str("\n<b>1v1</b>\n");
  text.push_str(&score_block(
    &ranked.tier,
    ranked.rating,
    ranked.peak_rating,
    ranked.wins,
    ranked.games,
  ));
  if let Some(rank) = ranked.global_rank {
    text.push_str(&format!("<b>Global rank: {rank}</b>\n"));
  }
  if let Some(rank) = ranked.region_rank {
    text.push_str(&format!("<b>Region rank: {rank}</b>\n"));
  }

  text.push_str("\n<b>2v2</b> (most played team)\n");
  match ranked.most_played_team() {
    None => text.push_str("<b>No 2v2 teams</b>"),
    Some(team) => {
      text
        .push_str(&format!("<b>Team: {}</b>\n", html::escape(&team.teamname)));
      text.push_str(&score_block(
        &team.tier,
        team.rating,
        team.peak_rating,
        team.wins,
        team.games,
      ));
      if let Some(rank) = team.global_rank {
        text.push_str(&format!("<b>Global rank: {rank}</b>\n"));
      }
    }
  }

  text
}

fn score_block(
  tier: &str,
  rating: i32,
  peak: i32,
  wins: u32,
  games: u32,
) -> String {
  let losses = games - wins;
  format!(
    "<b>Rating: {tier}</b> ({rating} Elo / {peak} Peak)\n\
     <b>Games: {games}</b> ({wins} {} / {losses} {})\n\
     Winrate: {:.2}%\n",
    utils::plural(wins, "win", "wins"),
    utils::plural(losses, "loss", "losses"),
    utils::winrate(wins, games),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ranked::{LegendStats, TeamStats};

  fn ranked() -> RankedStats {
    RankedStats {
      no_data: false,
      name: "Sova".into(),
      rating: 1700,
      peak_rating: 1806,
      tier: "Platinum 2".into(),
      wins: 11,
      games: 20,
      region: "EU".into(),
      global_rank: None,
      region_rank: Some(118),
      legends: vec![
        LegendStats {
          name: "Ada".into(),
          rating: 1500,
          peak_rating: 1550,
          tier: "Gold 4".into(),
          wins: 2,
          games: 5,
        },
        LegendStats {
          name: "Bodvar".into(),
          rating: 1700,
          peak_rating: 1806,
          tier: "Platinum 2".into(),
          wins: 9,
          games: 15,
        },
      ],
      tvt: vec![],
    }
  }

  #[test]
  fn summary_without_teams_uses_the_no_teams_branch() {
    let text = render_ranked(&ranked());

    assert!(text.contains("<b>Sova</b> (EU)"));
    assert!(text.contains("<b>Highest rating</b>: Bodvar (1700)"));
    assert!(text.contains("<b>Most played</b>: Bodvar (15 games)"));
    assert!(text.contains("Winrate: 55.00%"));
    assert!(text.contains("(11 wins / 9 losses)"));
    assert!(text.contains("<b>Region rank: 118</b>"));
    assert!(!text.contains("Global rank"));
    assert!(text.contains("<b>No 2v2 teams</b>"));
  }

  #[test]
  fn summary_with_teams_renders_the_most_played_one() {
    let mut stats = ranked();
    stats.tvt = vec![
      TeamStats {
        teamname: "Sova+Mor".into(),
        rating: 1400,
        peak_rating: 1450,
        tier: "Gold 2".into(),
        wins: 1,
        games: 2,
        global_rank: Some(900),
      },
      TeamStats {
        teamname: "Sova+Dan".into(),
        rating: 1300,
        peak_rating: 1350,
        tier: "Gold 0".into(),
        wins: 20,
        games: 41,
        global_rank: None,
      },
    ];

    let text = render_ranked(&stats);
    assert!(text.contains("<b>Team: Sova+Dan</b>"));
    assert!(text.contains("(20 wins / 21 losses)"));
    assert!(!text.contains("<b>Global rank: 900</b>"));
  }

  #[test]
  fn singular_forms_agree() {
    let mut stats = ranked();
    stats.wins = 1;
    stats.games = 2;

    let text = render_ranked(&stats);
    assert!(text.contains("(1 win / 1 loss)"));
  }
}
