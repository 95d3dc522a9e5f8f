mod common;

use assert_matches::assert_matches;
use common::{seed_client, seed_product, TestApp};
use rust_decimal_macros::dec;
use tabacaria_api::{
    errors::ServiceError,
    services::{
        clients::{ClientPatch, LoyaltyOp, NewClient},
        sales::{NewSale, NewSaleItem},
        DeleteOutcome,
    },
};

#[tokio::test]
async fn duplicate_documents_and_emails_are_rejected() {
    let app = TestApp::new().await;
    app.state
        .clients
        .create_client(NewClient {
            name: "Ana".to_string(),
            email: Some("ana@example.com".to_string()),
            phone: None,
            address: None,
            document: Some("123.456.789-00".to_string()),
            birthday: None,
            observations: None,
            favorite_category: None,
        })
        .await
        .unwrap();

    let err = app
        .state
        .clients
        .create_client(NewClient {
            name: "Outra Ana".to_string(),
            email: None,
            phone: None,
            address: None,
            document: Some("123.456.789-00".to_string()),
            birthday: None,
            observations: None,
            favorite_category: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    let err = app
        .state
        .clients
        .create_client(NewClient {
            name: "Ana Clone".to_string(),
            email: Some("ana@example.com".to_string()),
            phone: None,
            address: None,
            document: None,
            birthday: None,
            observations: None,
            favorite_category: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn manual_loyalty_adjustments_validate_balances() {
    let app = TestApp::new().await;
    let client = seed_client(&app, "Bruno").await;

    let updated = app
        .state
        .clients
        .update_loyalty(client.id, 30, LoyaltyOp::Add)
        .await
        .unwrap();
    assert_eq!(updated.loyalty_points, 30);

    let updated = app
        .state
        .clients
        .update_loyalty(client.id, 10, LoyaltyOp::Remove)
        .await
        .unwrap();
    assert_eq!(updated.loyalty_points, 20);

    let err = app
        .state
        .clients
        .update_loyalty(client.id, 50, LoyaltyOp::Remove)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let err = app
        .state
        .clients
        .update_loyalty(client.id, 0, LoyaltyOp::Add)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn deleting_a_client_with_sales_deactivates_them() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Essência Mix", dec!(15), dec!(7), 10).await;
    let buyer = seed_client(&app, "Carla").await;
    let fresh = seed_client(&app, "Daniel").await;

    app.state
        .sales
        .create_sale(
            NewSale {
                client_id: Some(buyer.id),
                items: vec![NewSaleItem {
                    product_id: product.id,
                    quantity: 1,
                    price: None,
                    discount: None,
                }],
                discount: None,
                tax: None,
                payment_method: None,
                payment_status: None,
                notes: None,
            },
            app.admin.id,
        )
        .await
        .unwrap();

    let outcome = app.state.clients.delete_client(buyer.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deactivated);
    let stored = app.state.clients.get_client(buyer.id).await.unwrap();
    assert!(!stored.is_active);

    let outcome = app.state.clients.delete_client(fresh.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Removed);
    assert_matches!(
        app.state.clients.get_client(fresh.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
}

#[tokio::test]
async fn updating_a_client_keeps_omitted_fields() {
    let app = TestApp::new().await;
    let client = app
        .state
        .clients
        .create_client(NewClient {
            name: "Eduarda".to_string(),
            email: Some("eduarda@example.com".to_string()),
            phone: Some("11 99999-0000".to_string()),
            address: None,
            document: None,
            birthday: None,
            observations: None,
            favorite_category: None,
        })
        .await
        .unwrap();

    let updated = app
        .state
        .clients
        .update_client(
            client.id,
            ClientPatch {
                phone: Some("11 98888-1111".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.phone.as_deref(), Some("11 98888-1111"));
    assert_eq!(updated.email.as_deref(), Some("eduarda@example.com"));
    assert_eq!(updated.name, "Eduarda");
}
