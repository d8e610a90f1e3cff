use sea_orm::sea_query::OnConflict;

use crate::brawlhalla::BrawlhallaId;
use crate::entity::link;
use crate::prelude::*;
use crate::store::Store;

/// Queries over the `links` table. All operations go through the
/// store's bounded-retry runner.
pub struct Links<'a> {
  store: &'a Store,
}

impl<'a> Links<'a> {
  pub fn new(store: &'a Store) -> Self {
    Self { store }
  }

  pub async fn get(&self, user_id: i64) -> Result<Option<BrawlhallaId>> {
    self
      .store
      .run(|db| async move {
        let row = link::Entity::find_by_id(user_id).one(&db).await?;
        Ok(row.map(|link| link.brawlhalla_id))
      })
      .await
  }

  /// Insert the link, overwriting any previous one for this user.
  pub async fn set(
    &self,
    user_id: i64,
    brawlhalla_id: BrawlhallaId,
  ) -> Result<()> {
    self
      .store
      .run(|db| async move {
        let row = link::ActiveModel {
          user_id: Set(user_id),
          brawlhalla_id: Set(brawlhalla_id),
        };

        link::Entity::insert(row)
          .on_conflict(
            OnConflict::column(link::Column::UserId)
              .update_column(link::Column::BrawlhallaId)
              .to_owned(),
          )
          .exec(&db)
          .await?;
        Ok(())
      })
      .await
  }

  /// Remove the link. `Ok(false)` when nothing was stored.
  pub async fn delete(&self, user_id: i64) -> Result<bool> {
    self
      .store
      .run(|db| async move {
        let res = link::Entity::delete_by_id(user_id).exec(&db).await?;
        Ok(res.rows_affected > 0)
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn store() -> Store {
    Store::connect("sqlite::memory:").await.unwrap()
  }

  #[tokio::test]
  async fn set_get_roundtrip() {
    let store = store().await;
    let links = Links::new(&store);

    assert_eq!(links.get(42).await.unwrap(), None);

    links.set(42, 100).await.unwrap();
    assert_eq!(links.get(42).await.unwrap(), Some(100));
  }

  #[tokio::test]
  async fn set_overwrites_instead_of_duplicating() {
    let store = store().await;
    let links = Links::new(&store);

    links.set(42, 100).await.unwrap();
    links.set(42, 200).await.unwrap();

    assert_eq!(links.get(42).await.unwrap(), Some(200));
  }

  #[tokio::test]
  async fn delete_clears_the_link() {
    let store = store().await;
    let links = Links::new(&store);

    links.set(42, 100).await.unwrap();
    assert!(links.delete(42).await.unwrap());
    assert_eq!(links.get(42).await.unwrap(), None);

    // deleting again is a no-op
    assert!(!links.delete(42).await.unwrap());
  }

  #[tokio::test]
  async fn links_are_per_user() {
    let store = store().await;
    let links = Links::new(&store);

    links.set(1, 100).await.unwrap();
    links.set(2, 200).await.unwrap();

    assert_eq!(links.get(1).await.unwrap(), Some(100));
    assert_eq!(links.get(2).await.unwrap(), Some(200));
  }
}
