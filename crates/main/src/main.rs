//! 主应用程序入口
//!
//! 读取配置、连接数据库并执行迁移，组装服务后启动 Axum Web API。

use std::sync::Arc;

use anyhow::Context;
use application::{
    Clock, DisabledNotifications, MailLinks, NotificationPublisher, ServiceSettings, Services,
    StorageBuckets, StoredNotifications, SystemClock, TokenService,
};
use config::AppConfig;
use infrastructure::{Infrastructure, InfrastructureConfig, JwtTokenService};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, HttpSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    info!(config = %config.sanitized(), "配置已加载");

    let infrastructure = Infrastructure::connect(InfrastructureConfig::from(&config))
        .await
        .context("初始化基础设施失败")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let token_service: Arc<dyn TokenService> =
        Arc::new(JwtTokenService::new(&config.jwt, clock.clone()));
    let notifier: Arc<dyn NotificationPublisher> = if config.features.notifications {
        Arc::new(StoredNotifications)
    } else {
        info!("通知功能已关闭");
        Arc::new(DisabledNotifications)
    };
    if config.auth.guest_passwordless_login {
        warn!("访客账号免密登录已开启");
    }

    let services = Services::new(infrastructure.service_dependencies(
        token_service,
        clock,
        notifier,
        service_settings(&config),
    ));
    let state = AppState::new(
        services,
        HttpSettings::from(&config.server),
        infrastructure.health.clone(),
    );
    let app = router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;
    info!("pawprint 服务启动在 http://{address}");

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    info!("收到退出信号，等待进行中的请求结束");
    let _ = stop_tx.send(true);
    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            timeout_seconds = config.server.shutdown_timeout_seconds,
            "优雅退出超时，强制结束"
        ),
    }

    info!("服务已停止");
    Ok(())
}

fn service_settings(config: &AppConfig) -> ServiceSettings {
    ServiceSettings {
        buckets: StorageBuckets {
            postings: config.storage.postings_bucket.clone(),
            icons: config.storage.icons_bucket.clone(),
        },
        mail_links: MailLinks {
            activation_url_prefix: config.mail.activation_url_prefix.clone(),
            password_reset_url_prefix: config.mail.password_reset_url_prefix.clone(),
        },
        guest_passwordless_login: config.auth.guest_passwordless_login,
        password_reset_daily_limit: config.auth.password_reset_daily_limit,
        password_reset_key_ttl: chrono::Duration::hours(config.auth.password_reset_key_ttl_hours),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "无法监听 Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
