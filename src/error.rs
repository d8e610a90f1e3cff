use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(sea_orm::DbErr),

  /// Persistence failed even after the bounded reconnect attempt.
  #[error("storage unavailable: {0}")]
  Storage(sea_orm::DbErr),

  #[error("api request failed: {0}")]
  Api(#[from] reqwest::Error),

  #[error("unexpected api payload: {0}")]
  Json(#[from] json::Error),

  #[error("unrecognized profile reference")]
  InvalidProfile,

  #[error("no game profile for that account")]
  NoProfile,

  #[error("no ranked data for that account")]
  NoRankedData,

  #[error("no account linked")]
  NotLinked,

  /// The user dismissed a disambiguation prompt. Never rendered.
  #[error("prompt cancelled")]
  Cancelled,
}

impl From<sea_orm::DbErr> for Error {
  fn from(err: sea_orm::DbErr) -> Self {
    Error::Db(err)
  }
}

impl Error {
  /// Text shown to the chat user at the command boundary.
  pub fn user_message(&self) -> &'static str {
    match self {
      Error::InvalidProfile => "Invalid Steam profile URL",
      Error::NoProfile => "No Brawlhalla profile exists for that Steam profile",
      Error::NoRankedData => {
        "There is no ranked data for that Brawlhalla account"
      }
      Error::NotLinked => "No account linked. Use /link <steam profile> first",
      Error::Cancelled => "",
      Error::Db(_) | Error::Storage(_) | Error::Api(_) | Error::Json(_) => {
        "Something went wrong. Try again later"
      }
    }
  }

  /// Whether this failure should be logged rather than explained to the user.
  pub fn is_internal(&self) -> bool {
    matches!(
      self,
      Error::Db(_) | Error::Storage(_) | Error::Api(_) | Error::Json(_)
    )
  }
}
