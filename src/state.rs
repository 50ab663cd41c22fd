//! # 应用全局状态
//!
//! 通过 Tauri 的 `manage()` 注册，所有 command 通过 `State<AppState>` 访问。
//!
//! 服务客户端按需创建：第一次用到时读取界面设置并建立通道，
//! 保存新的界面设置后丢弃旧客户端，下次调用时重新创建。
//! 原生 gRPC 通道需要 tokio 运行时，因此不能在 `run()` 之前创建。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::LifelogClient;
use crate::models::settings::InterfaceSettings;
use crate::services::cache::AppCache;
use crate::services::config_store::ConfigStore;
use crate::services::poller::PollerRegistry;
use crate::services::recorder::Recorder;

pub struct AppState {
    pub config: ConfigStore,
    pub cache: AppCache,
    pub recorder: Recorder,
    /// logger 状态推送任务
    pub watchers: PollerRegistry,
    client: Mutex<Option<Arc<LifelogClient>>>,
}

impl AppState {
    pub fn new(config: ConfigStore) -> Self {
        Self {
            config,
            cache: AppCache::new(),
            recorder: Recorder::new(),
            watchers: PollerRegistry::new(),
            client: Mutex::new(None),
        }
    }

    /// 获取（必要时创建）服务客户端
    ///
    /// # 错误
    /// 界面设置无法读取或服务地址无效时返回错误
    pub async fn client(&self) -> Result<Arc<LifelogClient>, String> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let settings = self.config.load_interface_settings().await?;
        let client = Arc::new(LifelogClient::from_settings(&settings).map_err(|e| e.to_string())?);
        *slot = Some(client.clone());
        Ok(client)
    }

    /// 保存界面设置并丢弃当前客户端（会话令牌随之清除）
    pub async fn update_interface_settings(&self, settings: &InterfaceSettings) -> Result<(), String> {
        self.config.save_interface_settings(settings).await?;
        *self.client.lock().await = None;
        self.cache.invalidate_logger_status();
        log::info!("界面设置已更新，服务客户端将重新创建");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::TransportKind;

    #[tokio::test]
    async fn test_client_is_reused_until_settings_change() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(ConfigStore::new(
            dir.path().join("config.toml"),
            dir.path().join("interface.json"),
        ));

        let settings = InterfaceSettings {
            transport: TransportKind::Rest,
            ..Default::default()
        };
        state.update_interface_settings(&settings).await.unwrap();

        let first = state.client().await.unwrap();
        first.set_session_token(Some("token".to_string()));
        let second = state.client().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        state.update_interface_settings(&settings).await.unwrap();
        let third = state.client().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third.session_token(), None);
    }

    #[tokio::test]
    async fn test_invalid_saved_url_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("interface.json");
        std::fs::write(&settings_path, r#"{ "apiUrl": "nowhere", "transport": "rest" }"#).unwrap();

        let state = AppState::new(ConfigStore::new(dir.path().join("config.toml"), settings_path));
        if std::env::var(crate::client::API_URL_ENV).is_err() {
            assert!(state.client().await.is_err());
        }
    }
}
