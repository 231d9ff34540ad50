use std::sync::Arc;

use application::{HealthCheck, Services};

/// 接口层自身的设置。
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    /// 登录 Cookie 是否带 `Secure`
    pub cookie_secure: bool,
    /// 为空时不挂 CORS 层
    pub cors_origins: Vec<String>,
}

impl From<&config::ServerConfig> for HttpSettings {
    fn from(server: &config::ServerConfig) -> Self {
        Self {
            cookie_secure: server.cookie_secure,
            cors_origins: server.cors_origins.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub http: Arc<HttpSettings>,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(services: Services, http: HttpSettings, health: Arc<dyn HealthCheck>) -> Self {
        Self {
            services,
            http: Arc::new(http),
            health,
        }
    }
}
