use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::access_log_entity as access_log;
use crate::error::AppResult;
use crate::models::*;

#[derive(Clone)]
pub struct HistoryService {
    pool: Arc<DatabaseConnection>,
}

impl HistoryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// 会员的闸机进出记录，按时间倒序分页
    pub async fn get_access_history(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<AccessHistoryItem>> {
        let total = access_log::Entity::find()
            .filter(access_log::Column::MemberId.eq(user_id))
            .count(self.pool.as_ref())
            .await?;

        let rows = access_log::Entity::find()
            .filter(access_log::Column::MemberId.eq(user_id))
            .order_by_desc(access_log::Column::Timestamp)
            .offset(params.offset())
            .limit(params.limit())
            .all(self.pool.as_ref())
            .await?;

        let data = rows.into_iter().map(AccessHistoryItem::from).collect();
        Ok(PaginatedResponse::new(
            data,
            params.page(),
            params.limit(),
            total,
        ))
    }
}
