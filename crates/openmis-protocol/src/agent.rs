//! 顶点代理 - 状态机与标记/搜索协议
//!
//! 每个代理独占自己的状态、确认集合与搜索簿记，所有交互都通过消息。
//! 调度循环同一时刻最多执行一个顶层操作（mark 或 search）；操作内部
//! 只有两个显式屏障会挂起：排除确认屏障与洪泛回波屏障。屏障挂起期间
//! 代理继续处理收件消息，消息处理器本身从不阻塞，只更新本地簿记或
//! 调度一个延迟调用。

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use openmis_core::{
    Envelope, Notification, OpenMisError, PendingCall, ProtocolMessage, Result, SearchPath,
    VertexId, VertexState,
};

use crate::selection::{SelectionPolicy, UniformRandom};

/// 顶点代理
pub struct VertexAgent {
    id: VertexId,
    state: VertexState,
    /// 邻居到边权的映射；边权仅作为配置保留，协议不使用
    edges: HashMap<VertexId, f64>,
    /// 邻居发送端，与 `edges` 的键一致
    neighbors: HashMap<VertexId, mpsc::Sender<Envelope>>,
    coordinator: mpsc::Sender<Notification>,
    inbox: mpsc::Receiver<Envelope>,
    policy: Box<dyn SelectionPolicy>,
    /// 排除屏障的确认集合
    out_confirmations: HashSet<VertexId>,
    /// 已参与过的搜索会话，按 root 去重
    search_requested: HashSet<VertexId>,
    /// 当前搜索已收到的回波数
    reply_count: usize,
    /// 当前搜索收集到的候选路径
    collected_replies: Vec<SearchPath>,
    pending: PendingCall,
    done: bool,
}

impl VertexAgent {
    pub fn new(
        id: impl Into<VertexId>,
        edges: HashMap<VertexId, f64>,
        neighbors: HashMap<VertexId, mpsc::Sender<Envelope>>,
        coordinator: mpsc::Sender<Notification>,
        inbox: mpsc::Receiver<Envelope>,
    ) -> Self {
        Self {
            id: id.into(),
            state: VertexState::Normal,
            edges,
            neighbors,
            coordinator,
            inbox,
            policy: Box::new(UniformRandom::new()),
            out_confirmations: HashSet::new(),
            search_requested: HashSet::new(),
            reply_count: 0,
            collected_replies: Vec::new(),
            pending: PendingCall::Idle,
            done: false,
        }
    }

    pub fn with_policy(mut self, policy: Box<dyn SelectionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> VertexState {
        self.state
    }

    /// 某条边的权重
    pub fn edge_weight(&self, neighbor: &str) -> Option<f64> {
        self.edges.get(neighbor).copied()
    }

    /// 调度循环
    ///
    /// 算法只在这里推进：取出待执行操作并运行到完成（含其屏障），
    /// 空闲时等待下一条收件消息。停机只在循环与屏障边界被观察。
    pub async fn run(mut self) -> Result<()> {
        debug!(
            "vertex {} started with {} neighbors",
            self.id,
            self.neighbors.len()
        );
        while !self.done {
            match std::mem::take(&mut self.pending) {
                PendingCall::Idle => match self.inbox.recv().await {
                    Some(envelope) => self.handle(envelope).await?,
                    None => break,
                },
                PendingCall::RunMark => self.mark().await?,
                PendingCall::RunSearch { path, reply_to } => {
                    self.search(path, Some(reply_to)).await?;
                }
            }
        }
        debug!("vertex {} shut down as {}", self.id, self.state);
        Ok(())
    }

    /// 消息处理器；从不阻塞在屏障上，只更新簿记、回发确认或调度延迟调用
    async fn handle(&mut self, envelope: Envelope) -> Result<()> {
        let Envelope { from, payload } = envelope;
        match payload {
            ProtocolMessage::Exclude => {
                self.set_state(VertexState::Out);
                self.send_to(&from, ProtocolMessage::ExcludeAck).await
            }
            ProtocolMessage::ExcludeAck => {
                self.out_confirmations.insert(from);
                Ok(())
            }
            ProtocolMessage::Flood { path } => self.on_flood(from, path).await,
            ProtocolMessage::FloodReply { paths } => {
                self.reply_count += 1;
                self.collected_replies.extend(paths);
                Ok(())
            }
            ProtocolMessage::HandOff { path } => self.on_hand_off(path).await,
            ProtocolMessage::Shutdown => {
                self.done = true;
                Ok(())
            }
        }
    }

    /// 标记协议
    ///
    /// 只会在 `Normal` 状态的代理上被调度。排除屏障保证所有邻居先被
    /// 置为 OUT，之后的搜索才不会把它们误报为候选。
    async fn mark(&mut self) -> Result<()> {
        self.set_state(VertexState::Vertex);
        self.notify(Notification::marked(self.id.clone())).await?;

        self.out_confirmations.clear();
        let neighbor_ids: Vec<VertexId> = self.neighbors.keys().cloned().collect();
        for neighbor in &neighbor_ids {
            self.send_to(neighbor, ProtocolMessage::Exclude).await?;
        }
        self.wait_for_exclusions().await?;
        if self.done {
            return Ok(());
        }

        let candidates = self.search(vec![self.id.clone()], None).await?;
        if self.done {
            return Ok(());
        }

        if candidates.is_empty() {
            // 图中不再有 NORMAL 顶点，唯一的终止条件
            info!("vertex {} found no eligible vertex left", self.id);
            return self.notify(Notification::finished(self.id.clone())).await;
        }

        let index = self.policy.choose(candidates.len());
        let mut path = candidates
            .into_iter()
            .nth(index)
            .ok_or_else(|| OpenMisError::Protocol("selection index out of range".to_string()))?;
        // 去掉自身，把余下路径交给路径上的下一跳
        path.remove(0);
        if path.is_empty() {
            return Err(OpenMisError::Protocol(format!(
                "vertex {} selected a degenerate candidate path",
                self.id
            )));
        }
        let next = path.remove(0);
        debug!("vertex {} hands off to {} via {:?}", self.id, next, path);
        self.send_to(&next, ProtocolMessage::HandOff { path }).await
    }

    /// 搜索协议（洪泛 + 回波）
    ///
    /// `path` 是从会话 root 到本代理的路由；`reply_to` 为空表示本代理
    /// 就是 root，合并结果直接返回给 `mark()` 的后续。
    async fn search(
        &mut self,
        path: SearchPath,
        reply_to: Option<VertexId>,
    ) -> Result<Vec<SearchPath>> {
        self.collected_replies = Vec::new();
        if self.state.is_eligible() {
            // 自身仍是 NORMAL，也是一条候选路径
            self.collected_replies.push(path.clone());
        }

        // 本路由上的顶点不再转发，避免洪泛沿着同一条路径打转
        let on_path: HashSet<&VertexId> = path.iter().collect();
        let next_hops: Vec<VertexId> = self
            .neighbors
            .keys()
            .filter(|id| !on_path.contains(*id))
            .cloned()
            .collect();

        self.reply_count = 0;
        for hop in &next_hops {
            let mut extended = path.clone();
            extended.push(hop.clone());
            self.send_to(hop, ProtocolMessage::Flood { path: extended })
                .await?;
        }
        self.wait_for_replies(next_hops.len()).await?;
        if self.done {
            return Ok(Vec::new());
        }

        let merged = std::mem::take(&mut self.collected_replies);
        match reply_to {
            Some(source) => {
                self.send_to(&source, ProtocolMessage::FloodReply { paths: merged })
                    .await?;
                Ok(Vec::new())
            }
            None => Ok(merged),
        }
    }

    async fn on_flood(&mut self, from: VertexId, path: SearchPath) -> Result<()> {
        let root = path
            .first()
            .cloned()
            .ok_or_else(|| OpenMisError::Protocol("flood carried an empty path".to_string()))?;
        if self.search_requested.contains(&root) {
            // 同一 root 的会话只参与一次；重复请求立即回空，
            // 防止带环图上的无限再洪泛
            debug!(
                "vertex {} already joined the search rooted at {}",
                self.id, root
            );
            return self
                .send_to(&from, ProtocolMessage::FloodReply { paths: Vec::new() })
                .await;
        }
        self.search_requested.insert(root);
        self.schedule(PendingCall::RunSearch {
            path,
            reply_to: from,
        })
    }

    async fn on_hand_off(&mut self, mut path: SearchPath) -> Result<()> {
        if path.is_empty() {
            // 本代理就是下一个标记者
            return self.schedule(PendingCall::RunMark);
        }
        // 源路由：按路径推进一跳
        let next = path.remove(0);
        debug!(
            "vertex {} relays hand-off to {} ({} hops left)",
            self.id,
            next,
            path.len()
        );
        self.send_to(&next, ProtocolMessage::HandOff { path }).await
    }

    /// 排除屏障：所有邻居都确认 OUT 后才返回。
    /// 计数满足优先于停机；收件关闭视同停机。
    async fn wait_for_exclusions(&mut self) -> Result<()> {
        loop {
            if self.out_confirmations.len() >= self.neighbors.len() {
                return Ok(());
            }
            if self.done {
                return Ok(());
            }
            match self.inbox.recv().await {
                Some(envelope) => self.handle(envelope).await?,
                None => {
                    self.done = true;
                    return Ok(());
                }
            }
        }
    }

    /// 回波屏障：每个扇出跳恰好回一条回波后才返回
    async fn wait_for_replies(&mut self, expected: usize) -> Result<()> {
        loop {
            if self.reply_count >= expected {
                return Ok(());
            }
            if self.done {
                return Ok(());
            }
            match self.inbox.recv().await {
                Some(envelope) => self.handle(envelope).await?,
                None => {
                    self.done = true;
                    return Ok(());
                }
            }
        }
    }

    fn set_state(&mut self, new_state: VertexState) {
        if self.state == new_state {
            return;
        }
        if self.state.is_terminal() {
            warn!(
                "vertex {} already {}, ignoring transition to {}",
                self.id, self.state, new_state
            );
            return;
        }
        self.state = new_state;
        info!("vertex {} marked as {}", self.id, self.state);
    }

    fn schedule(&mut self, call: PendingCall) -> Result<()> {
        if !self.pending.is_idle() {
            return Err(OpenMisError::Protocol(format!(
                "vertex {} already holds a pending call",
                self.id
            )));
        }
        self.pending = call;
        Ok(())
    }

    async fn send_to(&self, target: &str, payload: ProtocolMessage) -> Result<()> {
        let sender = self.neighbors.get(target).ok_or_else(|| {
            OpenMisError::Channel(format!("vertex {} has no channel to {target}", self.id))
        })?;
        sender
            .send(Envelope::new(self.id.clone(), payload))
            .await
            .map_err(|_| OpenMisError::Channel(format!("channel to {target} is closed")))
    }

    async fn notify(&self, notification: Notification) -> Result<()> {
        self.coordinator
            .send(notification)
            .await
            .map_err(|_| OpenMisError::Channel("coordinator channel is closed".to_string()))
    }
}
