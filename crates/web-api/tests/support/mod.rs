#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use application::{memory_directory, Directory, RealtimeHub, SystemClock};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use domain::{User, UserId};
use serde_json::Value;
use tokio::{net::TcpListener, sync::oneshot};
use tower::ServiceExt;
use web_api::{router, AppState, JwtService};

pub const TEST_SECRET: &str = "integration-test-secret-with-32-plus-chars";

/// 内存目录存储上的完整应用
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub directory: Directory,
}

impl TestApp {
    pub fn new() -> Self {
        let directory = memory_directory();
        let state = AppState::assemble(
            directory.clone(),
            Arc::new(RealtimeHub::default()),
            Arc::new(SystemClock),
            Arc::new(JwtService::new(TEST_SECRET)),
            20,
        );
        Self {
            router: router(state.clone()),
            state,
            directory,
        }
    }

    pub async fn user(&self, name: &str) -> User {
        self.user_with(name, |_| {}).await
    }

    pub async fn user_with(&self, name: &str, configure: impl FnOnce(&mut User)) -> User {
        let mut user = User::new(UserId::generate(), name, Utc::now()).unwrap();
        configure(&mut user);
        self.directory.users.create(user).await.unwrap()
    }

    pub fn token(&self, user: UserId) -> String {
        self.state
            .jwt_service
            .generate_token(user, Duration::hours(1))
            .unwrap()
    }

    /// 发一个带 bearer token 的请求，返回状态码和 JSON 响应体
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// 在随机端口上启动真实服务，丢弃返回的 sender 即关闭服务
    pub async fn serve(&self) -> (SocketAddr, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = self.router.clone();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        (addr, shutdown_tx)
    }
}
