//! 客户会话
//!
//! 保存当前识别出的顾客 (按电话找到或刚注册)，并持久化到本地 JSON 文件，
//! 重新构造时自动恢复。会话没有过期时间，最后一次写入生效。

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{Client, ClientCreate};

use crate::{ClientResult, HttpClient, SessionError};

/// 客户目录：会话和电话建议用到的查询
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    /// Look up an active client by phone; `None` when unknown
    async fn find_by_phone(&self, phone: &str) -> ClientResult<Option<Client>>;

    async fn register(&self, data: ClientCreate) -> ClientResult<Client>;

    /// Clients whose phone starts with `prefix`
    async fn suggest(&self, prefix: &str) -> ClientResult<Vec<Client>>;
}

#[async_trait]
impl ClientDirectory for HttpClient {
    async fn find_by_phone(&self, phone: &str) -> ClientResult<Option<Client>> {
        self.find_client_by_phone(phone).await
    }

    async fn register(&self, data: ClientCreate) -> ClientResult<Client> {
        self.register_client(&data).await
    }

    async fn suggest(&self, prefix: &str) -> ClientResult<Vec<Client>> {
        self.suggest_clients(prefix).await
    }
}

/// 会话持久化
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<Client>, SessionError>;
    fn save(&self, client: &Client) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    client: Client,
    saved_at: i64,
}

/// JSON 文件存储
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(base_path: impl Into<PathBuf>, filename: &str) -> Self {
        Self {
            path: base_path.into().join(filename),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<Client>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let stored: StoredSession = serde_json::from_str(&json)?;
        Ok(Some(stored.client))
    }

    fn save(&self, client: &Client) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            client: client.clone(),
            saved_at: shared::util::now_millis(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// 当前顾客会话
///
/// 唯一持有者；所有修改都通过这里的方法，并同步写入存储。
pub struct ClientSession<D, S> {
    directory: D,
    storage: S,
    current: Option<Client>,
}

impl<D: ClientDirectory, S: SessionStorage> ClientSession<D, S> {
    /// Build a session, restoring any identity left in storage.
    /// Unreadable session data is discarded.
    pub fn new(directory: D, storage: S) -> Self {
        let current = match storage.load() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable client session");
                if let Err(e) = storage.clear() {
                    tracing::warn!(error = %e, "Failed to remove client session");
                }
                None
            }
        };
        if let Some(client) = &current {
            tracing::debug!(client_id = client.id, "Client session restored");
        }
        Self {
            directory,
            storage,
            current,
        }
    }

    pub fn current(&self) -> Option<&Client> {
        self.current.as_ref()
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// 按电话识别顾客；找到则设为当前顾客，找不到时会话不变
    pub async fn find_by_phone(&mut self, phone: &str) -> ClientResult<Option<Client>> {
        let found = self.directory.find_by_phone(phone).await?;
        if let Some(client) = &found {
            self.set_client(client.clone())?;
        }
        Ok(found)
    }

    /// 注册新顾客并设为当前顾客
    pub async fn register(&mut self, name: &str, phone: &str, address: &str) -> ClientResult<Client> {
        let client = self
            .directory
            .register(ClientCreate {
                name: name.to_string(),
                phone: phone.to_string(),
                address: address.to_string(),
                email: None,
                category: None,
            })
            .await?;
        self.set_client(client.clone())?;
        Ok(client)
    }

    pub fn set_client(&mut self, client: Client) -> Result<(), SessionError> {
        self.storage.save(&client)?;
        self.current = Some(client);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.storage.clear()?;
        self.current = None;
        Ok(())
    }
}
