//! 实时中心：房间到连接的映射和扇出投递。
//!
//! 状态只存在于进程内，重启后从空开始重建。每个连接持有一个有界的
//! 出站队列，发布时只做 `try_send`：慢连接的队列满了就丢弃这一条事件，
//! 已关闭的连接被顺手清理，都不会拖住同一房间里的其他订阅者。

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use domain::UserId;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broadcaster::{BroadcastError, EventBroadcaster, RealtimeEvent, Room};

/// 每个连接出站队列的默认容量
pub const DEFAULT_CONNECTION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `connect` 返回给会话的句柄：连接标识 + 事件接收端。
pub struct HubConnection {
    pub id: ConnectionId,
    pub user_id: UserId,
    pub events: mpsc::Receiver<Arc<RealtimeEvent>>,
}

struct ConnectionEntry {
    user_id: UserId,
    sender: mpsc::Sender<Arc<RealtimeEvent>>,
    rooms: HashSet<Room>,
}

#[derive(Default)]
struct HubState {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
}

impl HubState {
    fn attach(&mut self, connection: ConnectionId, room: Room) -> Result<bool, BroadcastError> {
        let entry = self
            .connections
            .get_mut(&connection)
            .ok_or_else(|| BroadcastError::UnknownConnection(connection.to_string()))?;
        let added = entry.rooms.insert(room);
        self.rooms.entry(room).or_default().insert(connection);
        Ok(added)
    }

    fn detach(&mut self, connection: ConnectionId, room: Room) -> bool {
        let removed = self
            .connections
            .get_mut(&connection)
            .map(|entry| entry.rooms.remove(&room))
            .unwrap_or(false);
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&connection);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
        removed
    }

    fn remove_connection(&mut self, connection: ConnectionId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(&connection)?;
        for room in &entry.rooms {
            if let Some(members) = self.rooms.get_mut(room) {
                members.remove(&connection);
                if members.is_empty() {
                    self.rooms.remove(room);
                }
            }
        }
        Some(entry)
    }
}

/// 进程内的实时中心。每个测试可以各自构造一个实例。
pub struct RealtimeHub {
    state: RwLock<HubState>,
    buffer: usize,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_BUFFER)
    }
}

impl RealtimeHub {
    pub fn new(buffer: usize) -> Self {
        Self {
            state: RwLock::new(HubState::default()),
            buffer: buffer.max(1),
        }
    }

    /// 注册一个已认证的连接，并隐式加入该用户的个人房间。
    pub async fn connect(&self, user_id: UserId) -> HubConnection {
        let (sender, events) = mpsc::channel(self.buffer);
        let id = ConnectionId::generate();
        let personal = Room::Personal(user_id);

        let mut state = self.state.write().await;
        state.connections.insert(
            id,
            ConnectionEntry {
                user_id,
                sender,
                rooms: HashSet::from([personal]),
            },
        );
        state.rooms.entry(personal).or_default().insert(id);
        drop(state);

        info!(connection = %id, user_id = %user_id, "realtime connection registered");
        HubConnection {
            id,
            user_id,
            events,
        }
    }

    pub async fn join(&self, connection: ConnectionId, room: Room) -> Result<(), BroadcastError> {
        let added = self.state.write().await.attach(connection, room)?;
        if added {
            debug!(connection = %connection, room = %room, "joined room");
        }
        Ok(())
    }

    /// 离开房间，返回连接之前是否在该房间中。
    pub async fn leave(&self, connection: ConnectionId, room: Room) -> bool {
        let removed = self.state.write().await.detach(connection, room);
        if removed {
            debug!(connection = %connection, room = %room, "left room");
        }
        removed
    }

    /// 断开连接：立即从所有房间移除，不再重试任何在途投递。
    pub async fn disconnect(&self, connection: ConnectionId) {
        let removed = self.state.write().await.remove_connection(connection);
        if let Some(entry) = removed {
            info!(
                connection = %connection,
                user_id = %entry.user_id,
                rooms = entry.rooms.len(),
                "realtime connection removed"
            );
        }
    }

    /// 只发给单个连接，例如对客户端非法帧的错误回执。
    pub async fn send_to(&self, connection: ConnectionId, event: RealtimeEvent) -> bool {
        let state = self.state.read().await;
        match state.connections.get(&connection) {
            Some(entry) => entry.sender.try_send(Arc::new(event)).is_ok(),
            None => false,
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    pub async fn room_size(&self, room: Room) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(&room)
            .map(HashSet::len)
            .unwrap_or(0)
    }

    pub async fn is_member(&self, connection: ConnectionId, room: Room) -> bool {
        self.state
            .read()
            .await
            .rooms
            .get(&room)
            .is_some_and(|members| members.contains(&connection))
    }

    async fn fan_out(&self, room: Room, event: RealtimeEvent) -> usize {
        let event = Arc::new(event);
        let mut delivered = 0;
        let mut closed = Vec::new();

        {
            let state = self.state.read().await;
            let Some(members) = state.rooms.get(&room) else {
                debug!(room = %room, event = event.name(), "no subscribers");
                return 0;
            };
            for connection in members {
                let Some(entry) = state.connections.get(connection) else {
                    continue;
                };
                match entry.sender.try_send(Arc::clone(&event)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            connection = %connection,
                            room = %room,
                            event = event.name(),
                            "outbound queue full, event dropped for slow connection"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*connection),
                }
            }
        }

        if !closed.is_empty() {
            let mut state = self.state.write().await;
            for connection in closed {
                state.remove_connection(connection);
                debug!(connection = %connection, "pruned closed connection");
            }
        }

        delivered
    }
}

#[async_trait]
impl EventBroadcaster for RealtimeHub {
    async fn publish(&self, room: Room, event: RealtimeEvent) -> Result<usize, BroadcastError> {
        Ok(self.fan_out(room, event).await)
    }
}
