use crate::db::is_unique_violation;
use crate::entities::{follows, prelude::*, users};
use crate::models::PageRequest;
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    sea_query::Query,
};
use std::collections::HashSet;

use super::user::User;

/// Repository for author subscriptions
pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the subscription. Returns `false` when it already existed.
    pub async fn add(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Follows::insert(follows::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        })
        .exec(&self.conn)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the subscription. Returns `false` when there was none.
    pub async fn remove(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let result = Follows::delete_many()
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.eq(author_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Subset of `author_ids` the user follows.
    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = Follows::find()
            .filter(follows::Column::UserId.eq(user_id))
            .filter(follows::Column::AuthorId.is_in(author_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|f| f.author_id).collect())
    }

    /// Page of authors the user follows, ordered by author id.
    pub async fn followed_authors(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64)> {
        let followed = Query::select()
            .column(follows::Column::AuthorId)
            .from(Follows)
            .and_where(follows::Column::UserId.eq(user_id))
            .to_owned();

        let paginator = Users::find()
            .filter(users::Column::Id.in_subquery(followed))
            .order_by_asc(users::Column::Id)
            .paginate(&self.conn, page.limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.index()).await?;

        Ok((rows.into_iter().map(User::from).collect(), total))
    }
}
