//! 电话号码输入建议 (防抖)
//!
//! 输入停止 400ms 后才查询一次，之前未完成的查询全部取消。

use std::sync::Arc;
use std::time::Duration;

use shared::models::Client;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::ClientDirectory;

/// Input inactivity before a lookup is issued
pub const SUGGEST_DEBOUNCE: Duration = Duration::from_millis(400);

/// Latest suggestion result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestions {
    /// Normalized phone prefix the clients were looked up with
    pub prefix: String,
    pub clients: Vec<Client>,
}

pub struct PhoneSuggester<D> {
    directory: Arc<D>,
    delay: Duration,
    pending: Option<CancellationToken>,
    tx: watch::Sender<Suggestions>,
}

impl<D: ClientDirectory + 'static> PhoneSuggester<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self::with_delay(directory, SUGGEST_DEBOUNCE)
    }

    pub fn with_delay(directory: Arc<D>, delay: Duration) -> Self {
        let (tx, _) = watch::channel(Suggestions::default());
        Self {
            directory,
            delay,
            pending: None,
            tx,
        }
    }

    /// Receiver updated whenever a lookup completes
    pub fn subscribe(&self) -> watch::Receiver<Suggestions> {
        self.tx.subscribe()
    }

    /// 用户输入变化
    ///
    /// 空输入或非电话字符会立即清空建议，不发起查询。
    pub fn input(&mut self, text: &str) {
        self.cancel();

        let prefix = match shared::util::normalize_phone(text) {
            Some(digits) if !digits.is_empty() => digits,
            _ => {
                self.tx.send_replace(Suggestions::default());
                return;
            }
        };

        let token = CancellationToken::new();
        self.pending = Some(token.clone());

        let directory = self.directory.clone();
        let delay = self.delay;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = directory.suggest(&prefix) => result,
            };

            match result {
                Ok(clients) => {
                    tracing::debug!(prefix = %prefix, count = clients.len(), "Phone suggestions loaded");
                    tx.send_replace(Suggestions { prefix, clients });
                }
                Err(e) => {
                    tracing::warn!(prefix = %prefix, error = %e, "Phone suggestion lookup failed");
                }
            }
        });
    }

    /// Cancel the pending lookup, if any
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<D> Drop for PhoneSuggester<D> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
