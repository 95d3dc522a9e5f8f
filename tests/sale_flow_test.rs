mod common;

use assert_matches::assert_matches;
use common::{seed_client, seed_product, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tabacaria_api::{
    entities::{
        inventory_transaction::{self, MovementKind, ReferenceKind},
        sale::{self, PaymentMethod, PaymentStatus},
        sale_item,
    },
    errors::ServiceError,
    services::sales::{NewSale, NewSaleItem},
};

fn sale_input(items: Vec<NewSaleItem>) -> NewSale {
    NewSale {
        client_id: None,
        items,
        discount: None,
        tax: None,
        payment_method: None,
        payment_status: None,
        notes: None,
    }
}

#[tokio::test]
async fn sale_snapshots_items_and_computes_totals() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Essência Zomo", dec!(25), dec!(10), 20).await;

    let mut input = sale_input(vec![NewSaleItem {
        product_id: product.id,
        quantity: 3,
        price: None,
        discount: None,
    }]);
    input.discount = Some(dec!(5));
    input.tax = Some(dec!(2));
    input.payment_method = Some("PIX".to_string());

    let (created, items) = app
        .state
        .sales
        .create_sale(input, app.admin.id)
        .await
        .expect("sale creation failed");

    assert_eq!(created.sale_number, "VENDA-000001");
    assert_eq!(created.subtotal, dec!(75));
    // total = subtotal - discount + tax
    assert_eq!(created.total, dec!(72));
    // profit = (75 - 30) - 5 discount
    assert_eq!(created.profit, dec!(40));
    assert_eq!(created.payment_method, PaymentMethod::Pix);
    assert_eq!(created.payment_status, PaymentStatus::Pago);

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Essência Zomo");
    assert_eq!(items[0].price, dec!(25));
    assert_eq!(items[0].cost_price, dec!(10));
    assert_eq!(items[0].total, dec!(75));
}

#[tokio::test]
async fn sale_numbers_are_sequential() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Carvão Coco", dec!(12), dec!(6), 50).await;

    for expected in ["VENDA-000001", "VENDA-000002", "VENDA-000003"] {
        let (created, _) = app
            .state
            .sales
            .create_sale(
                sale_input(vec![NewSaleItem {
                    product_id: product.id,
                    quantity: 1,
                    price: None,
                    discount: None,
                }]),
                app.admin.id,
            )
            .await
            .expect("sale creation failed");
        assert_eq!(created.sale_number, expected);
    }
}

#[tokio::test]
async fn sale_decrements_stock_and_writes_ledger() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Pod Descartável", dec!(40), dec!(22), 10).await;

    let (created, _) = app
        .state
        .sales
        .create_sale(
            sale_input(vec![NewSaleItem {
                product_id: product.id,
                quantity: 4,
                price: None,
                discount: None,
            }]),
            app.admin.id,
        )
        .await
        .expect("sale creation failed");

    let stored = app.state.products.get_product(product.id).await.unwrap();
    assert_eq!(stored.stock, 6);

    let movement = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::ProductId.eq(product.id))
        .filter(inventory_transaction::Column::Kind.eq(MovementKind::Venda))
        .one(&*app.state.db)
        .await
        .unwrap()
        .expect("sale ledger row missing");
    assert_eq!(movement.quantity, -4);
    assert_eq!(movement.previous_stock, 10);
    assert_eq!(movement.new_stock, 6);
    assert_eq!(movement.reference_kind, Some(ReferenceKind::Sale));
    assert_eq!(movement.reference_id, Some(created.id));
}

#[tokio::test]
async fn insufficient_stock_rejects_the_whole_sale() {
    let app = TestApp::new().await;
    let ok = seed_product(&app, "Essência A", dec!(15), dec!(7), 10).await;
    let scarce = seed_product(&app, "Essência B", dec!(15), dec!(7), 1).await;

    let err = app
        .state
        .sales
        .create_sale(
            sale_input(vec![
                NewSaleItem {
                    product_id: ok.id,
                    quantity: 2,
                    price: None,
                    discount: None,
                },
                NewSaleItem {
                    product_id: scarce.id,
                    quantity: 5,
                    price: None,
                    discount: None,
                },
            ]),
            app.admin.id,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Nothing sticks: no sale, no ledger rows, stock untouched.
    let sales = sale::Entity::find().all(&*app.state.db).await.unwrap();
    assert!(sales.is_empty());
    let items = sale_item::Entity::find().all(&*app.state.db).await.unwrap();
    assert!(items.is_empty());
    let sale_rows = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::Kind.eq(MovementKind::Venda))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(sale_rows.is_empty());
    assert_eq!(app.state.products.get_product(ok.id).await.unwrap().stock, 10);
}

#[tokio::test]
async fn sale_awards_loyalty_points_and_updates_client_totals() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Narguilé Pequeno", dec!(105), dec!(60), 5).await;
    let client = seed_client(&app, "João").await;

    let mut input = sale_input(vec![NewSaleItem {
        product_id: product.id,
        quantity: 1,
        price: None,
        discount: None,
    }]);
    input.client_id = Some(client.id);

    app.state
        .sales
        .create_sale(input, app.admin.id)
        .await
        .expect("sale creation failed");

    let stored = app.state.clients.get_client(client.id).await.unwrap();
    // 1 point per R$10 spent, floored.
    assert_eq!(stored.loyalty_points, 10);
    assert_eq!(stored.total_purchased, dec!(105));
    assert!(stored.last_purchase.is_some());
}

#[tokio::test]
async fn cancelling_a_sale_restocks_and_reverts_loyalty() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Tabaco Premium", dec!(50), dec!(30), 8).await;
    let client = seed_client(&app, "Maria").await;

    let mut input = sale_input(vec![NewSaleItem {
        product_id: product.id,
        quantity: 2,
        price: None,
        discount: None,
    }]);
    input.client_id = Some(client.id);

    let (created, _) = app
        .state
        .sales
        .create_sale(input, app.admin.id)
        .await
        .expect("sale creation failed");
    assert_eq!(app.state.products.get_product(product.id).await.unwrap().stock, 6);

    let cancelled = app
        .state
        .sales
        .cancel_sale(created.id, app.admin.id)
        .await
        .expect("cancel failed");
    assert_eq!(cancelled.payment_status, PaymentStatus::Cancelado);

    // Stock returns from current level with an entrada ledger row.
    assert_eq!(app.state.products.get_product(product.id).await.unwrap().stock, 8);
    let restock = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::ProductId.eq(product.id))
        .filter(inventory_transaction::Column::Kind.eq(MovementKind::Entrada))
        .filter(inventory_transaction::Column::Reason.eq("sale cancellation"))
        .one(&*app.state.db)
        .await
        .unwrap();
    assert!(restock.is_some());

    // Loyalty and totals are reverted, floored at zero.
    let stored = app.state.clients.get_client(client.id).await.unwrap();
    assert_eq!(stored.loyalty_points, 0);
    assert_eq!(stored.total_purchased, dec!(0));

    // Cancelling twice is a conflict.
    let err = app
        .state
        .sales
        .cancel_sale(created.id, app.admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn line_discount_only_affects_the_stored_item_total() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Essência Love66", dec!(20), dec!(9), 10).await;

    let (created, items) = app
        .state
        .sales
        .create_sale(
            sale_input(vec![NewSaleItem {
                product_id: product.id,
                quantity: 2,
                price: None,
                discount: Some(dec!(4)),
            }]),
            app.admin.id,
        )
        .await
        .expect("sale creation failed");

    // Item total reflects the line discount; sale math uses the raw line.
    assert_eq!(items[0].total, dec!(36));
    assert_eq!(created.subtotal, dec!(40));
    assert_eq!(created.total, dec!(40));
}

#[tokio::test]
async fn empty_sales_are_rejected() {
    let app = TestApp::new().await;
    let err = app
        .state
        .sales
        .create_sale(sale_input(vec![]), app.admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}
