use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

struct PresenceEntry {
    conn_id: Uuid,
    session: actix_ws::Session,
}

/// 用户名 -> 在线 WebSocket 会话的进程内注册表。
/// 每个用户名最多一条映射，同名新连接直接顶掉旧连接；
/// 不跨实例共享，进程重启后清空。
#[derive(Clone, Default)]
pub struct PresenceRegistry {
    inner: Arc<DashMap<String, PresenceEntry>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册会话，返回连接 id，断开时回传给 unregister
    pub fn register(&self, username: &str, session: actix_ws::Session) -> Uuid {
        let conn_id = Uuid::new_v4();
        self.inner
            .insert(username.to_string(), PresenceEntry { conn_id, session });
        conn_id
    }

    /// 仅当映射仍属于该连接时移除，避免旧连接的清理挤掉新连接
    pub fn unregister(&self, username: &str, conn_id: Uuid) {
        self.inner
            .remove_if(username, |_, entry| entry.conn_id == conn_id);
    }

    pub fn lookup(&self, username: &str) -> Option<actix_ws::Session> {
        self.inner.get(username).map(|entry| entry.session.clone())
    }

    pub fn online_count(&self) -> usize {
        self.inner.len()
    }
}
