//! JSON shapes of the public response types.
//!
//! The frontend consumes these verbatim: keys are camelCase, money
//! fields serialize as strings, and password hashes never appear.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use prestige_api::models::{
    Order, OrderItem, OrderResponse, User, UserResponse, VehicleResponse,
};
use prestige_core::{Email, OrderId, OrderItemId, OrderStatus, UserId, UserRole, VehicleId};
use prestige_integration_tests::vehicle;

#[test]
fn test_vehicle_response_shape() {
    let mut gt = vehicle(7, "GT Coupe", 4);
    gt.base_price = Decimal::from(117_100);
    gt.image_url = "/images/gt-coupe.jpg".to_owned();
    gt.features = vec!["Sport Chrono Package".to_owned()];
    gt.specifications.0.engine = "4.0L V8".to_owned();
    gt.specifications.0.zero_to_sixty = "3.5s".to_owned();

    let body = serde_json::to_value(VehicleResponse::from(gt)).expect("serializes");

    assert_eq!(body["id"], json!(7));
    assert_eq!(body["name"], json!("GT Coupe"));
    // Money goes over the wire as a string.
    assert_eq!(body["basePrice"], json!("117100"));
    assert_eq!(body["imageUrl"], json!("/images/gt-coupe.jpg"));
    assert_eq!(body["specifications"]["engine"], json!("4.0L V8"));
    assert_eq!(body["specifications"]["zeroToSixty"], json!("3.5s"));
    assert_eq!(body["stock"], json!(4));
    assert_eq!(body["isActive"], json!(true));

    let keys = body.as_object().expect("object");
    assert!(keys.contains_key("createdAt"));
    assert!(!keys.contains_key("base_price"));
}

#[test]
fn test_order_response_shape_with_discount() {
    let order = Order {
        id: OrderId::new(42),
        user_id: UserId::new(1),
        user_name: "Ava Marsh".to_owned(),
        user_email: Email::parse("ava@example.com").expect("valid email"),
        total_amount: Decimal::from(120_000),
        discount_code: Some("THANKYOU".to_owned()),
        discount_percentage: Some(2),
        discount_description: Some("Thank you discount".to_owned()),
        discounted_total: Decimal::from(117_600),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let items = vec![OrderItem {
        id: OrderItemId::new(1),
        order_id: OrderId::new(42),
        vehicle_id: VehicleId::new(7),
        model_name: "GT Coupe".to_owned(),
        color: "Racing Green".to_owned(),
        modifications: json!({"wheels": "Forged alloy"}),
        price: Decimal::from(120_000),
    }];

    let body =
        serde_json::to_value(OrderResponse::from_parts(order, items)).expect("serializes");

    assert_eq!(body["id"], json!(42));
    assert_eq!(body["userEmail"], json!("ava@example.com"));
    assert_eq!(body["totalAmount"], json!("120000"));
    assert_eq!(body["discountedTotal"], json!("117600"));
    assert_eq!(body["status"], json!("Pending"));

    assert_eq!(body["discount"]["code"], json!("THANKYOU"));
    assert_eq!(body["discount"]["percentage"], json!(2));

    let item = &body["items"][0];
    assert_eq!(item["modelId"], json!(7));
    assert_eq!(item["modelName"], json!("GT Coupe"));
    assert_eq!(item["modifications"]["wheels"], json!("Forged alloy"));
    assert_eq!(item["price"], json!("120000"));
}

#[test]
fn test_order_response_without_discount_has_null_snapshot() {
    let order = Order {
        id: OrderId::new(43),
        user_id: UserId::new(1),
        user_name: "Ava Marsh".to_owned(),
        user_email: Email::parse("ava@example.com").expect("valid email"),
        total_amount: Decimal::from(120_000),
        discount_code: None,
        discount_percentage: None,
        discount_description: None,
        discounted_total: Decimal::from(120_000),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let body =
        serde_json::to_value(OrderResponse::from_parts(order, Vec::new())).expect("serializes");

    assert_eq!(body["discount"], serde_json::Value::Null);
    assert_eq!(body["items"], json!([]));
}

#[test]
fn test_user_response_never_carries_the_password_hash() {
    let user = User {
        id: UserId::new(5),
        first_name: "Ava".to_owned(),
        last_name: "Marsh".to_owned(),
        email: Email::parse("ava@example.com").expect("valid email"),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".to_owned(),
        phone_number: "+44 7700 900123".to_owned(),
        address: "1 Harbour Way".to_owned(),
        role: UserRole::User,
        cart: json!([{"modelId": 7, "color": "Racing Green"}]),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let body = serde_json::to_value(UserResponse::from(user)).expect("serializes");

    assert_eq!(body["email"], json!("ava@example.com"));
    assert_eq!(body["firstName"], json!("Ava"));
    assert_eq!(body["role"], json!("user"));
    // The cart is stored and returned verbatim.
    assert_eq!(body["cart"][0]["modelId"], json!(7));

    let keys = body.as_object().expect("object");
    assert!(!keys.contains_key("password"));
    assert!(!keys.contains_key("passwordHash"));
    assert!(!keys.contains_key("password_hash"));
}
