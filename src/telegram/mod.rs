mod callback;
mod command;

use command::Command;
use teloxide::dispatching::{Dispatcher, HandlerExt, UpdateFilterExt};
use teloxide::prelude::*;
use teloxide::types::{
  CallbackQuery, ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode,
  Update,
};

use crate::prelude::*;
use crate::state::AppState;

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = app.bot.clone();

  let handler = teloxide::dptree::entry()
    .branch(Update::filter_message().filter_command::<Command>().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message, cmd: Command| {
        let app = app.clone();
        let user_id = msg
          .from
          .as_ref()
          .map(|user| user.id.0 as i64)
          .unwrap_or(msg.chat.id.0);
        let bot = ReplyBot::new(bot, user_id, msg.chat.id, msg.id);
        command::handle(app, bot, cmd)
      }
    }))
    .branch(Update::filter_callback_query().endpoint({
      let app = app.clone();
      move |bot: Bot, query: CallbackQuery| {
        let app = app.clone();
        callback_handle(app, bot, query)
      }
    }));

  Dispatcher::builder(bot, handler).build().dispatch().await;
}

async fn callback_handle(
  app: Arc<AppState>,
  bot: Bot,
  query: CallbackQuery,
) -> ResponseResult<()> {
  if let Some(data) = query.data
    && let Some(msg) = query.message.as_ref()
  {
    let bot =
      ReplyBot::new(bot, query.from.id.0 as i64, msg.chat().id, msg.id());

    // answer callback to remove loading state
    bot.inner.answer_callback_query(query.id.clone()).await?;

    callback::handle(app, bot, &data).await
  } else {
    Ok(())
  }
}

#[derive(Debug, Clone)]
struct ReplyBot {
  inner: Bot,
  pub user_id: i64,
  pub chat_id: ChatId,
  pub message_id: MessageId,
}

impl ReplyBot {
  pub fn new(
    inner: Bot,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
  ) -> Self {
    Self { inner, user_id, chat_id, message_id }
  }

  async fn reply_html(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .await
  }

  async fn reply_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard)
      .await
  }

  async fn edit_html(&self, text: impl Into<String>) -> ResponseResult<()> {
    self
      .inner
      .edit_message_text(self.chat_id, self.message_id, text.into())
      .parse_mode(ParseMode::Html)
      .await?;
    Ok(())
  }

  async fn delete(&self) -> ResponseResult<()> {
    self.inner.delete_message(self.chat_id, self.message_id).await?;
    Ok(())
  }
}
