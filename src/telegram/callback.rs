use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

use super::{ReplyBot, command};
use crate::brawlhalla::RankingEntry;
use crate::prelude::*;
use crate::state::{AppState, Pending, PendingAction};

/// Typed payloads for the disambiguation keyboard.
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
  Pick(usize),
  Cancel,
}

impl Callback {
  pub fn to_data(&self) -> String {
    match self {
      Callback::Pick(index) => format!("pick:{index}"),
      Callback::Cancel => "cancel".to_string(),
    }
  }

  pub fn from_data(data: &str) -> Option<Self> {
    match data {
      "cancel" => Some(Callback::Cancel),
      _ => data
        .strip_prefix("pick:")
        .and_then(|index| index.parse().ok())
        .map(Callback::Pick),
    }
  }
}

pub fn choice_keyboard(matches: &[RankingEntry]) -> InlineKeyboardMarkup {
  let mut rows: Vec<Vec<InlineKeyboardButton>> = matches
    .iter()
    .enumerate()
    .map(|(index, entry)| {
      vec![InlineKeyboardButton::callback(
        format!("{} ({}, {} Elo)", entry.name, entry.region, entry.rating),
        Callback::Pick(index).to_data(),
      )]
    })
    .collect();

  rows.push(vec![InlineKeyboardButton::callback(
    "Cancel",
    Callback::Cancel.to_data(),
  )]);

  InlineKeyboardMarkup::new(rows)
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  data: &str,
) -> ResponseResult<()> {
  let Some(callback) = Callback::from_data(data) else {
    return Ok(());
  };

  // The prompt must still be open and belong to the pressing user;
  // anything else (expired, foreign, stale message) is ignored.
  let Some((_, pending)) = app
    .prompts
    .remove_if(&bot.chat_id.0, |_chat, pending| {
      pending.user_id == bot.user_id
    })
  else {
    return Ok(());
  };

  let result = match callback {
    Callback::Cancel => Err(Error::Cancelled),
    Callback::Pick(index) => match pending.matches.get(index) {
      Some(entry) => chosen(&app, &pending, entry).await,
      None => return Ok(()),
    },
  };

  match result {
    Ok(text) => bot.edit_html(text).await?,
    // cancellation is an expected user action: no message, just cleanup
    Err(Error::Cancelled) => bot.delete().await?,
    Err(err) => {
      if err.is_internal() {
        error!("disambiguation failed: {err}");
      }
      bot.edit_html(format!("❌ {}", err.user_message())).await?;
    }
  }

  Ok(())
}

async fn chosen(
  app: &AppState,
  pending: &Pending,
  entry: &RankingEntry,
) -> Result<String> {
  match pending.action {
    PendingAction::Rank => {
      command::ranked_text(app, entry.brawlhalla_id).await
    }
    PendingAction::Link => {
      app.sv().links.set(pending.user_id, entry.brawlhalla_id).await?;
      Ok(format!("✅ Linked to <b>{}</b>", html::escape(&entry.name)))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(name: &str) -> RankingEntry {
    RankingEntry {
      name: name.into(),
      brawlhalla_id: 7,
      rating: 1500,
      region: "EU".into(),
    }
  }

  #[test]
  fn callback_data_roundtrips() {
    for callback in [Callback::Pick(0), Callback::Pick(12), Callback::Cancel]
    {
      assert_eq!(Callback::from_data(&callback.to_data()), Some(callback));
    }
    assert_eq!(Callback::from_data("pick:x"), None);
    assert_eq!(Callback::from_data("bogus"), None);
  }

  #[test]
  fn keyboard_has_one_row_per_match_plus_cancel() {
    let matches = vec![entry("a"), entry("b"), entry("c")];
    let keyboard = choice_keyboard(&matches);
    assert_eq!(keyboard.inline_keyboard.len(), 4);
  }
}
