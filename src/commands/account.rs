//! # 账户 Tauri Commands
//!
//! 登录 / 注册成功后客户端保存会话令牌，之后的服务调用自动携带；
//! `logout` 只清除本地令牌。登录失败（`success: false`）作为数据返回。

use tauri::State;

use crate::proto::{LoginResponse, RegisterRequest, RegisterResponse, UserProfile};
use crate::state::AppState;

#[tauri::command]
pub async fn login(
    username: String,
    password: String,
    state: State<'_, AppState>,
) -> Result<LoginResponse, String> {
    let client = state.client().await?;
    let response = client
        .login(&username, &password)
        .await
        .map_err(|e| e.to_string())?;
    if response.success {
        log::info!("用户 {} 已登录", username);
    }
    Ok(response)
}

#[tauri::command]
pub async fn register(
    request: RegisterRequest,
    state: State<'_, AppState>,
) -> Result<RegisterResponse, String> {
    let client = state.client().await?;
    client.register(request).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_user_profile(
    user_id: String,
    state: State<'_, AppState>,
) -> Result<UserProfile, String> {
    let client = state.client().await?;
    client
        .get_user_profile(&user_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<(), String> {
    state.client().await?.logout();
    Ok(())
}
