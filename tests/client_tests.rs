use std::sync::{Arc, Mutex};

use harvest_hub::client::{ClientError, FilterState, MarketClient};
use harvest_hub::config::AppConfig;
use harvest_hub::db;
use harvest_hub::handlers;
use harvest_hub::models::{BookingRequest, Category, CategoryFilter, GeoPoint, ListingRequest};
use harvest_hub::services::catalog::CatalogQuery;
use harvest_hub::services::phone::DisabledVerifier;
use harvest_hub::state::AppState;
use harvest_hub::validation::Lenient;

const TOKEN: &str = "test-token";

async fn spawn_server() -> MarketClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = AppConfig {
        port: addr.port(),
        database_url: ":memory:".to_string(),
        admin_token: TOKEN.to_string(),
        api_url: format!("http://{addr}"),
        numverify_key: None,
        numverify_url: "http://localhost:9/api/validate".to_string(),
    };
    let client = MarketClient::from_config(&config);

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(db::init_db(":memory:").unwrap())),
        config,
        phone_verifier: Box::new(DisabledVerifier),
    });
    let app = handlers::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    client
}

async fn closed_port_client() -> MarketClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    MarketClient::new(format!("http://{addr}/"))
}

fn listing(title: &str, category: &str, at: Option<(f64, f64)>) -> ListingRequest {
    ListingRequest {
        title: Some(title.to_string()),
        price: Some(Lenient::Value(10.0)),
        category: Some(category.to_string()),
        lat: at.map(|(lat, _)| lat),
        lng: at.map(|(_, lng)| lng),
        ..Default::default()
    }
}

fn ana() -> BookingRequest {
    BookingRequest {
        name: Some("Ana".to_string()),
        email: Some("ana@example.com".to_string()),
        guests: Some(Lenient::Value(2)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_listing_round_trip() {
    let client = spawn_server().await;

    let created = client
        .create_listing(TOKEN, &listing("Veg Box", "food", Some((51.5, -0.12))))
        .await
        .unwrap();
    let fetched = client.get_listing(&created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.geometry, Some(GeoPoint::new(51.5, -0.12)));
}

#[tokio::test]
async fn test_list_with_filters() {
    let client = spawn_server().await;
    for request in [
        listing("Veg Box", "food", Some((51.01, 0.0))),
        listing("Bamboo Kit", "lifestyle", Some((51.01, 0.0))),
        listing("Far Fruit", "food", Some((53.0, 0.0))),
    ] {
        client.create_listing(TOKEN, &request).await.unwrap();
    }

    let all = client.list_listings(&CatalogQuery::all()).await.unwrap();
    assert_eq!(all.len(), 3);

    let food = client
        .list_listings(&CatalogQuery::all().with_category(CategoryFilter::Only(Category::Food)))
        .await
        .unwrap();
    assert_eq!(food.len(), 2);

    let near_food = client
        .list_listings(
            &CatalogQuery::all()
                .with_category(CategoryFilter::Only(Category::Food))
                .near(GeoPoint::new(51.0, 0.0), 5.0),
        )
        .await
        .unwrap();
    assert_eq!(near_food.len(), 1);
    assert_eq!(near_food[0].title, "Veg Box");

    // Client-side narrowing of an already-fetched set agrees with the server.
    let filter = FilterState::new();
    filter.set(CategoryFilter::Only(Category::Food));
    let narrowed: Vec<&str> = filter.apply(&all).iter().map(|l| l.title.as_str()).collect();
    let served: Vec<&str> = food.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(narrowed, served);
}

#[tokio::test]
async fn test_unknown_listing_not_found() {
    let client = spawn_server().await;
    let err = client.get_listing("nope").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn test_admin_calls_unauthorized_with_wrong_token() {
    let client = spawn_server().await;

    let err = client
        .create_listing("wrong", &listing("Veg Box", "food", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized), "{err:?}");

    let err = client.list_bookings("wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized), "{err:?}");
}

#[tokio::test]
async fn test_submit_booking_and_list() {
    let client = spawn_server().await;

    let booking = client.submit_booking(&ana()).await.unwrap();
    assert_eq!(booking.name, "Ana");
    assert_eq!(booking.guests, 2);

    let bookings = client.list_bookings(TOKEN).await.unwrap();
    assert_eq!(bookings, vec![booking]);
}

#[tokio::test]
async fn test_server_side_field_errors_are_decoded() {
    let client = spawn_server().await;
    let request = BookingRequest {
        listing_id: Some("missing".to_string()),
        ..ana()
    };

    match client.submit_booking(&request).await {
        Err(ClientError::Validation(fields)) => assert!(fields.contains("listingId")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_booking_never_hits_network() {
    // Nothing listens here, so any request would come back as a network error.
    let client = closed_port_client().await;
    let request = BookingRequest {
        name: Some("".to_string()),
        email: Some("bad".to_string()),
        guests: Some(Lenient::Value(0)),
        ..Default::default()
    };

    match client.submit_booking(&request).await {
        Err(ClientError::Validation(fields)) => {
            assert!(fields.contains("name"));
            assert!(fields.contains("email"));
            assert!(fields.contains("guests"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_network_failure_surfaces() {
    let client = closed_port_client().await;

    let err = client.submit_booking(&ana()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");
    assert_eq!(err.to_string(), "request failed, please try again");

    let err = client.list_listings(&CatalogQuery::all()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");

    let err = client.get_listing("any").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");

    let err = client
        .create_listing(TOKEN, &listing("Veg Box", "food", None))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");

    let err = client.list_bookings(TOKEN).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "{err:?}");
}
