//! HTTP client for network-based API calls
//!
//! 服务端所有接口都返回 `ApiResponse` 信封，这里统一拆包：成功时取出
//! `data`，失败时转换为 [`ClientError::Api`]。

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::ListQuery;
use shared::client::{AdminInfo, LoginRequest, LoginResponse};
use shared::models::{
    Client as Customer, ClientCreate, ClientUpdate, DiningTable, DiningTableCreate,
    DiningTableUpdate, Order, OrderDetail, OrderStatusUpdate, Product, ProductCreate,
    ProductUpdate, Sauce, SauceCreate, SauceUpdate, TabCheckout, TableStatus, TableStatusUpdate,
    TableTab, TransitionOptions,
};
use shared::order::{LineItemInput, OrderStatus, OrderSubmission};
use shared::util::normalize_phone;

use crate::{ApiResponse, ClientConfig, ClientError, ClientResult};

/// HTTP client for making network requests to the server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.authorized(request).send().await?;
        Self::handle_response(response).await
    }

    /// Unwrap the response envelope
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            // 尝试解析为 API 错误响应
            return Err(match serde_json::from_slice::<ApiResponse<Value>>(&bytes) {
                Ok(envelope) => ClientError::Api {
                    status: status.as_u16(),
                    code: envelope.code.unwrap_or_default(),
                    message: envelope.message,
                    details: envelope.details,
                },
                Err(_) => ClientError::Api {
                    status: status.as_u16(),
                    code: 0,
                    message: String::from_utf8_lossy(&bytes).into_owned(),
                    details: None,
                },
            });
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse(format!("Missing data: {}", envelope.message)))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.get(self.url(path))).await
    }

    /// Make a GET request with query-string parameters
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ClientResult<T> {
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.post(self.url(path))).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.client.put(self.url(path)).json(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.client.delete(self.url(path))).await
    }

    // ========== Health ==========

    pub async fn health(&self) -> ClientResult<Value> {
        self.get("/health").await
    }

    // ========== Auth API ==========

    /// Log in as admin; the returned token is kept for later calls
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.post("/api/auth/login", &request).await?;
        self.token = Some(response.token.clone());
        tracing::debug!(email = %response.admin.email, "Admin logged in");
        Ok(response)
    }

    pub async fn me(&self) -> ClientResult<AdminInfo> {
        self.get("/api/auth/me").await
    }

    pub async fn logout(&mut self) -> ClientResult<()> {
        let _: bool = self.post_empty("/api/auth/logout").await?;
        self.token = None;
        Ok(())
    }

    // ========== Products ==========

    /// 顾客菜单 (在售商品)
    pub async fn products(&self) -> ClientResult<Vec<Product>> {
        self.get("/api/products").await
    }

    pub async fn product(&self, id: i64) -> ClientResult<Product> {
        self.get(&format!("/api/products/{id}")).await
    }

    /// 后台商品列表，含下架商品
    pub async fn all_products(&self, query: &ListQuery) -> ClientResult<Vec<Product>> {
        self.get_with_query("/api/products/all", query).await
    }

    pub async fn create_product(&self, data: &ProductCreate) -> ClientResult<Product> {
        self.post("/api/products", data).await
    }

    pub async fn update_product(&self, id: i64, data: &ProductUpdate) -> ClientResult<Product> {
        self.put(&format!("/api/products/{id}"), data).await
    }

    pub async fn delete_product(&self, id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/products/{id}")).await
    }

    // ========== Sauces ==========

    pub async fn sauces(&self) -> ClientResult<Vec<Sauce>> {
        self.get("/api/sauces").await
    }

    pub async fn create_sauce(&self, data: &SauceCreate) -> ClientResult<Sauce> {
        self.post("/api/sauces", data).await
    }

    pub async fn update_sauce(&self, id: i64, data: &SauceUpdate) -> ClientResult<Sauce> {
        self.put(&format!("/api/sauces/{id}"), data).await
    }

    pub async fn delete_sauce(&self, id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/sauces/{id}")).await
    }

    // ========== Clients ==========

    pub async fn clients(&self, query: &ListQuery) -> ClientResult<Vec<Customer>> {
        self.get_with_query("/api/clients", query).await
    }

    pub async fn client(&self, id: i64) -> ClientResult<Customer> {
        self.get(&format!("/api/clients/{id}")).await
    }

    /// 按电话查找客户，未注册返回 `None`
    pub async fn find_client_by_phone(&self, phone: &str) -> ClientResult<Option<Customer>> {
        let digits = match normalize_phone(phone) {
            Some(digits) if !digits.is_empty() => digits,
            _ => return Err(ClientError::Validation(format!("'{phone}' is not a phone number"))),
        };
        match self.get(&format!("/api/clients/by-phone/{digits}")).await {
            Ok(client) => Ok(Some(client)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn suggest_clients(&self, prefix: &str) -> ClientResult<Vec<Customer>> {
        self.get_with_query("/api/clients/suggest", &[("phone", prefix)])
            .await
    }

    pub async fn register_client(&self, data: &ClientCreate) -> ClientResult<Customer> {
        self.post("/api/clients", data).await
    }

    pub async fn update_client(&self, id: i64, data: &ClientUpdate) -> ClientResult<Customer> {
        self.put(&format!("/api/clients/{id}"), data).await
    }

    pub async fn toggle_featured(&self, id: i64) -> ClientResult<Customer> {
        self.post_empty(&format!("/api/clients/{id}/toggle-featured"))
            .await
    }

    pub async fn delete_client(&self, id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/clients/{id}")).await
    }

    // ========== Orders ==========

    pub async fn submit_order(&self, submission: &OrderSubmission) -> ClientResult<OrderDetail> {
        self.post("/api/orders", submission).await
    }

    pub async fn order(&self, id: i64) -> ClientResult<OrderDetail> {
        self.get(&format!("/api/orders/{id}")).await
    }

    pub async fn orders(&self, query: &ListQuery) -> ClientResult<Vec<OrderDetail>> {
        self.get_with_query("/api/orders", query).await
    }

    pub async fn orders_by_client(&self, client_id: i64) -> ClientResult<Vec<OrderDetail>> {
        self.get(&format!("/api/orders/by-client/{client_id}")).await
    }

    pub async fn change_order_status(&self, id: i64, status: OrderStatus) -> ClientResult<Order> {
        self.put(&format!("/api/orders/{id}/status"), &OrderStatusUpdate { status })
            .await
    }

    pub async fn order_transitions(&self, id: i64) -> ClientResult<TransitionOptions> {
        self.get(&format!("/api/orders/{id}/transitions")).await
    }

    pub async fn delete_order(&self, id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/orders/{id}")).await
    }

    // ========== Tables ==========

    pub async fn tables(&self, query: &ListQuery) -> ClientResult<Vec<DiningTable>> {
        self.get_with_query("/api/tables", query).await
    }

    pub async fn create_table(&self, data: &DiningTableCreate) -> ClientResult<DiningTable> {
        self.post("/api/tables", data).await
    }

    pub async fn update_table(&self, id: i64, data: &DiningTableUpdate) -> ClientResult<DiningTable> {
        self.put(&format!("/api/tables/{id}"), data).await
    }

    pub async fn set_table_status(&self, id: i64, status: TableStatus) -> ClientResult<DiningTable> {
        self.put(&format!("/api/tables/{id}/status"), &TableStatusUpdate { status })
            .await
    }

    pub async fn delete_table(&self, id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/tables/{id}")).await
    }

    pub async fn tab(&self, table_id: i64) -> ClientResult<TableTab> {
        self.get(&format!("/api/tables/{table_id}/tab")).await
    }

    pub async fn add_tab_item(&self, table_id: i64, item: &LineItemInput) -> ClientResult<TableTab> {
        self.post(&format!("/api/tables/{table_id}/tab/items"), item)
            .await
    }

    pub async fn clear_tab(&self, table_id: i64) -> ClientResult<bool> {
        self.delete(&format!("/api/tables/{table_id}/tab")).await
    }

    pub async fn checkout_tab(&self, table_id: i64, checkout: &TabCheckout) -> ClientResult<OrderDetail> {
        self.post(&format!("/api/tables/{table_id}/tab/checkout"), checkout)
            .await
    }
}
