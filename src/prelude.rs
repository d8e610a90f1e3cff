pub use std::sync::Arc;

pub use chrono::{NaiveDateTime as DateTime, Utc};
pub use dashmap::DashMap;
pub use sea_orm::{DatabaseConnection, EntityTrait, Set};
pub use tracing::{error, info, warn};

pub use crate::error::{Error, Result};
pub(crate) use crate::utils;
