mod common;

use gymdesk_core::api::Resource;
use gymdesk_core::forms::{submit, FormError, Original};
use gymdesk_core::models::{Invoice, Member, Package};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{client, values};

#[tokio::test]
async fn create_posts_typed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/packages"))
        .and(body_json(json!({
            "gymId": 2,
            "name": "Gold",
            "durationDays": 30,
            "price": 49.99,
            "isActive": true
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 77, "gymId": 2, "name": "Gold", "durationDays": 30,
            "price": "49.99", "isActive": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let raw = values(&["Gold", "", "30", "49.99", "yes"]);
    let created: Package = submit(&api, None, &raw, Some(2)).await.unwrap();
    assert_eq!(created.id, 77);
}

#[tokio::test]
async fn update_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/members/12"))
        .and(body_json(json!({
            "gymId": 3,
            "firstName": "Ada",
            "lastName": "King",
            "phone": "0712345678",
            "status": "SUSPENDED"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12, "gymId": 3, "firstName": "Ada", "lastName": "King",
            "phone": "0712345678", "status": "SUSPENDED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let stored = json!({
        "id": 12, "gymId": 3, "firstName": "Ada", "lastName": "Lovelace",
        "phone": "0712345678", "status": "ACTIVE", "trainerId": null
    });
    let raw = values(&["Ada", "King", "", "0712345678", "", "", "", "", "suspended", "", ""]);
    let original = Original { id: 12, json: &stored };
    let updated: Member = submit(&api, Some(original), &raw, Some(3)).await.unwrap();
    assert_eq!(updated.last_name, "King");
}

#[tokio::test]
async fn update_clears_emptied_optional_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/members/12"))
        .and(body_json(json!({
            "gymId": 3,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": null,
            "phone": "0712345678",
            "address": "1 Analytical Way",
            "status": "ACTIVE"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12, "gymId": 3, "firstName": "Ada", "lastName": "Lovelace",
            "phone": "0712345678", "address": "1 Analytical Way", "status": "ACTIVE"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let stored = json!({
        "id": 12, "gymId": 3, "firstName": "Ada", "lastName": "Lovelace",
        "email": "ada@example.com", "phone": "0712345678",
        "address": "1 Analytical Way", "status": "ACTIVE", "trainerId": null
    });
    let raw = values(&[
        "Ada", "Lovelace", "", "0712345678", "", "", "1 Analytical Way", "", "ACTIVE", "", "",
    ]);
    let original = Original { id: 12, json: &stored };
    let updated: Member = submit(&api, Some(original), &raw, Some(3)).await.unwrap();
    assert!(updated.email.is_none());
}

#[tokio::test]
async fn invoice_edit_keeps_every_item() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/invoices/9"))
        .and(body_json(json!({
            "gymId": 1,
            "invoiceNumber": "INV-000009",
            "memberId": 4,
            "items": [
                {"description": "Monthly", "quantity": 1, "unitPrice": 55.0},
                {"description": "Towel hire", "quantity": 2, "unitPrice": 2.5}
            ],
            "status": "PENDING",
            "issueDate": "2025-03-01",
            "dueDate": "2025-03-15"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "gymId": 1, "invoiceNumber": "INV-000009", "memberId": 4,
            "items": [
                {"description": "Monthly", "quantity": 1, "unitPrice": "55.00"},
                {"description": "Towel hire", "quantity": 2, "unitPrice": "2.50"}
            ],
            "total": 60, "status": "PENDING", "dueDate": "2025-03-15"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let stored = json!({
        "id": 9, "gymId": 1, "invoiceNumber": "INV-000009", "memberId": 4,
        "items": [
            {"id": 1, "description": "Monthly", "quantity": 1, "unitPrice": "50.00"},
            {"id": 2, "description": "Towel hire", "quantity": 2, "unitPrice": "2.50"}
        ],
        "total": 55, "status": "PENDING", "issueDate": "2025-03-01", "dueDate": "2025-03-15"
    });
    // Only the first line's price changes
    let raw = values(&[
        "INV-000009", "4", "", "2025-03-01", "2025-03-15", "PENDING", "Monthly", "1", "55", "",
    ]);
    let original = Original { id: 9, json: &stored };
    let updated: Invoice = submit(&api, Some(original), &raw, Some(1)).await.unwrap();
    assert_eq!(updated.items.len(), 2);
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, "t");

    // Missing required name, duration out of range
    let raw = values(&["", "", "0", "10", "yes"]);
    let err = submit::<Package>(&api, None, &raw, Some(1)).await.unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("name"));

    let raw = values(&["Gold", "", "0", "10", "yes"]);
    let err = submit::<Package>(&api, None, &raw, Some(1)).await.unwrap_err();
    assert_eq!(
        err.field_errors().unwrap()["durationDays"],
        "Duration must be between 1 and 3650 days"
    );

    let raw = values(&[
        "INV-000001", "4", "", "2025-03-01", "2025-03-15", "PENDING", "Day pass", "0", "5", "",
    ]);
    let err = submit::<Invoice>(&api, None, &raw, Some(1)).await.unwrap_err();
    assert!(matches!(err, FormError::Invalid(_)));
}

#[tokio::test]
async fn server_rejection_surfaces_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/packages"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "A package with this name already exists"
        })))
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let raw = values(&["Gold", "", "30", "49.99", "yes"]);
    let err = submit::<Package>(&api, None, &raw, Some(2)).await.unwrap_err();
    assert!(matches!(err, FormError::Request(_)));
    assert_eq!(err.user_message(), "A package with this name already exists");
}

#[test]
fn every_form_has_fields() {
    assert!(!Package::form().fields.is_empty());
    assert_eq!(Member::form().fields.len(), 11);
}
