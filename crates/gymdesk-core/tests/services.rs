mod common;

use gymdesk_core::models::{
    Invoice, InvoiceStatus, Member, PaymentDraft, PaymentMethod, Salary, Subscription,
    SubscriptionStatus, Transaction,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::client;

fn subscription(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id, "gymId": 1, "memberId": 5, "packageId": 2,
        "startDate": "2025-01-01", "endDate": "2025-01-31", "status": status
    })
}

#[tokio::test]
async fn members_by_trainer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/members/trainer/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "gymId": 1, "firstName": "A", "lastName": "B", "trainerId": 8}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let members = api.resource::<Member>().by_trainer(8).await.unwrap();
    assert_eq!(members[0].trainer_id, Some(8));
}

#[tokio::test]
async fn subscription_actions() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/subscriptions/3/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(subscription(3, "CANCELLED")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/subscriptions/3/renew"))
        .respond_with(ResponseTemplate::new(201).set_body_json(subscription(4, "ACTIVE")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/subscriptions/member/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([subscription(3, "ACTIVE")])))
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let subs = api.resource::<Subscription>();
    assert_eq!(subs.cancel(3).await.unwrap().status, SubscriptionStatus::Cancelled);
    assert_eq!(subs.renew(3).await.unwrap().id, 4);
    assert_eq!(subs.for_member(5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn invoice_number_and_payment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/invoices/gym/1/next-number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"invoiceNumber": "INV-000031"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/invoices/30/payments"))
        .and(body_json(json!({"accountId": 2, "method": "CARD", "amount": 50.0})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 30, "gymId": 1, "invoiceNumber": "INV-000030", "total": 50, "status": "PAID"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let invoices = api.resource::<Invoice>();
    assert_eq!(invoices.next_number(1).await.unwrap(), "INV-000031");

    let payment = PaymentDraft {
        account_id: 2,
        method: PaymentMethod::Card,
        amount: Decimal::from(50),
        reference: None,
        date: None,
    };
    let paid = invoices.record_payment(30, &payment).await.unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn transactions_for_invoice_and_salary_pay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/transactions/invoice/30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "gymId": 1, "invoiceId": 30, "amount": 50, "type": "INCOME", "method": "CARD"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/salaries/6/pay"))
        .and(body_partial_json(json!({"accountId": 2})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 6, "gymId": 1, "employeeId": 3, "employeeType": "STAFF",
            "amount": 900, "month": "2025-02", "status": "PAID", "accountId": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let txs = api.resource::<Transaction>().for_invoice(30).await.unwrap();
    assert!(txs[0].is_income());

    let salary = api.resource::<Salary>().pay(6, 2).await.unwrap();
    assert!(salary.is_paid());
}

#[tokio::test]
async fn dashboard_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/gym/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalMembers": 120, "activeMembers": 98, "monthlyRevenue": 5400.5,
            "monthlyExpenses": 1200
        })))
        .mount(&server)
        .await;

    let api = client(&server, "t");
    let stats = api.dashboard_stats(1).await.unwrap();
    assert_eq!(stats.active_members, 98);
    assert_eq!(stats.monthly_net(), Decimal::new(42005, 1));
}
