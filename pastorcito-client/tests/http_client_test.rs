//! End-to-end: the client against a real server on a loopback port

use pastorcito_client::{
    Cart, ClientConfig, ClientError, ClientSession, FileSessionStorage, HttpClient,
};
use pastorcito_server::db::DbService;
use pastorcito_server::{Config, ServerState, build_app};
use shared::ListQuery;
use shared::models::{ProductCategory, ProductCreate};
use shared::order::{OrderStatus, PaymentMethod, ServiceType};

const ADMIN_EMAIL: &str = "admin@pastorcito.local";
const ADMIN_PASSWORD: &str = "salsa-verde-123";

async fn spawn_server() -> String {
    let mut config = Config::with_overrides("./target/test-data", 0);
    config.admin_email = ADMIN_EMAIL.into();
    config.admin_password = Some(ADMIN_PASSWORD.into());
    config.admin_password_hash = None;
    config.login_delay_ms = 0;

    let db = DbService::in_memory().await.unwrap();
    let state = ServerState::with_pool(config, db.pool).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(state)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn admin(base_url: &str) -> HttpClient {
    let mut client = ClientConfig::new(base_url).build_http_client().unwrap();
    let login = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();
    assert_eq!(login.admin.email, ADMIN_EMAIL);
    client
}

#[tokio::test]
async fn customer_orders_through_session_and_cart() {
    let base_url = spawn_server().await;
    let admin = admin(&base_url).await;
    let tacos = admin
        .create_product(&ProductCreate {
            name: "Tacos".into(),
            description: "Al pastor".into(),
            price: 15.0,
            image: None,
            category: ProductCategory::Dish,
        })
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let customer = ClientConfig::new(&base_url).build_http_client().unwrap();
    let mut session = ClientSession::new(
        customer.clone(),
        FileSessionStorage::new(dir.path(), "session.json"),
    );
    assert!(session.find_by_phone("55-1234-5678").await.unwrap().is_none());
    let registered = session
        .register("Juan Perez", "55-1234-5678", "Av. Reforma 100")
        .await
        .unwrap();
    assert_eq!(registered.phone, "5512345678");

    // 刷新后仍然识别
    let session = ClientSession::new(
        customer.clone(),
        FileSessionStorage::new(dir.path(), "session.json"),
    );
    let me = session.current().cloned().unwrap();
    assert_eq!(me.id, registered.id);

    let menu = customer.products().await.unwrap();
    let mut cart = Cart::new();
    cart.add(&menu[0], 3, vec!["Verde".into()]).unwrap();
    assert_eq!(cart.total(), 45.0);

    let submission = cart
        .checkout(ServiceType::Delivery, PaymentMethod::Cash, Some(me.id), None)
        .unwrap();
    let order = customer.submit_order(&submission).await.unwrap();
    assert_eq!(order.order.total, 45.0);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_id, tacos.id);
    assert_eq!(order.client_name.as_deref(), Some("Juan Perez"));

    let tracked = customer.order(order.order.id).await.unwrap();
    assert_eq!(tracked.order.status, OrderStatus::Pending);

    let updated = admin
        .change_order_status(order.order.id, OrderStatus::EnRoute)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::EnRoute);

    let options = admin.order_transitions(order.order.id).await.unwrap();
    assert_eq!(options.current, OrderStatus::EnRoute);
}

#[tokio::test]
async fn server_errors_carry_codes() {
    let base_url = spawn_server().await;
    let customer = ClientConfig::new(&base_url).build_http_client().unwrap();

    // 管理接口需要登录
    let err = customer.orders(&ListQuery::default()).await.unwrap_err();
    assert!(err.is_unauthorized());

    let mut wrong = ClientConfig::new(&base_url).build_http_client().unwrap();
    let err = wrong.login(ADMIN_EMAIL, "nope").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, code: 1002, .. }));
    assert!(wrong.token().is_none());

    let err = customer.product(12345).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code(), Some(6001));
}

#[tokio::test]
async fn logout_drops_token() {
    let base_url = spawn_server().await;
    let mut admin = admin(&base_url).await;
    assert!(admin.token().is_some());
    assert_eq!(admin.me().await.unwrap().email, ADMIN_EMAIL);

    admin.logout().await.unwrap();
    assert!(admin.token().is_none());
    assert!(admin.me().await.unwrap_err().is_unauthorized());
}
