//! # 录音控制
//!
//! 麦克风仪表盘的开始 / 暂停 / 继续 / 停止按钮。
//! 本地维护一个小状态机，每次转换都同步到服务端的 `microphone` logger：
//!
//! ```text
//! Idle ──start──► Recording ──pause──► Paused
//!  ▲                 │  ▲                │
//!  └──────stop───────┘  └─────resume─────┘
//!  ▲                                     │
//!  └────────────────stop─────────────────┘
//! ```
//!
//! 服务端切换失败时本地状态保持不变，错误原样返回给界面。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::LifelogClient;
use crate::models::media::RecordingStatus;

/// 服务端的麦克风 logger 名称
pub const MICROPHONE_LOGGER: &str = "microphone";

/// 开关服务端 logger 的能力
#[async_trait]
pub trait LoggerSwitch: Send + Sync {
    async fn set_logger(&self, name: &str, enable: bool) -> Result<(), String>;
}

#[async_trait]
impl LoggerSwitch for LifelogClient {
    /// `success: false` 视为失败，`error_message` 作为错误文本
    async fn set_logger(&self, name: &str, enable: bool) -> Result<(), String> {
        let response = self
            .toggle_logger(name, enable)
            .await
            .map_err(|e| e.to_string())?;
        if response.success {
            Ok(())
        } else if response.error_message.is_empty() {
            Err(format!("切换 logger {} 失败", name))
        } else {
            Err(response.error_message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording,
    Paused,
}

/// 录音控制器
#[derive(Default)]
pub struct Recorder {
    state: Mutex<RecorderState>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn state(&self) -> RecorderState {
        *self.state.lock().await
    }

    /// 当前录音状态；自动录音开关来自麦克风配置
    pub async fn status(&self, auto_recording_enabled: bool) -> RecordingStatus {
        let state = self.state().await;
        RecordingStatus {
            is_recording: state != RecorderState::Idle,
            is_paused: state == RecorderState::Paused,
            auto_recording_enabled,
        }
    }

    /// 开始录音；已在录音时不重复切换
    pub async fn start(&self, switch: &dyn LoggerSwitch) -> Result<RecorderState, String> {
        let mut state = self.state.lock().await;
        if *state == RecorderState::Recording {
            return Ok(*state);
        }
        switch.set_logger(MICROPHONE_LOGGER, true).await?;
        *state = RecorderState::Recording;
        log::info!("录音已开始");
        Ok(*state)
    }

    /// 暂停录音
    ///
    /// # 错误
    /// 未在录音或服务端切换失败时返回错误
    pub async fn pause(&self, switch: &dyn LoggerSwitch) -> Result<RecorderState, String> {
        let mut state = self.state.lock().await;
        match *state {
            RecorderState::Idle => Err("当前没有进行中的录音".to_string()),
            RecorderState::Paused => Ok(*state),
            RecorderState::Recording => {
                switch.set_logger(MICROPHONE_LOGGER, false).await?;
                *state = RecorderState::Paused;
                Ok(*state)
            }
        }
    }

    /// 继续已暂停的录音
    ///
    /// # 错误
    /// 未在录音或服务端切换失败时返回错误
    pub async fn resume(&self, switch: &dyn LoggerSwitch) -> Result<RecorderState, String> {
        let mut state = self.state.lock().await;
        match *state {
            RecorderState::Idle => Err("当前没有进行中的录音".to_string()),
            RecorderState::Recording => Ok(*state),
            RecorderState::Paused => {
                switch.set_logger(MICROPHONE_LOGGER, true).await?;
                *state = RecorderState::Recording;
                Ok(*state)
            }
        }
    }

    /// 停止录音；暂停状态下停止不再通知服务端（logger 已关闭）
    pub async fn stop(&self, switch: &dyn LoggerSwitch) -> Result<RecorderState, String> {
        let mut state = self.state.lock().await;
        if *state == RecorderState::Recording {
            switch.set_logger(MICROPHONE_LOGGER, false).await?;
        }
        if *state != RecorderState::Idle {
            log::info!("录音已停止");
        }
        *state = RecorderState::Idle;
        Ok(*state)
    }
}
