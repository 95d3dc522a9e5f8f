mod common;

use assert_matches::assert_matches;
use common::{seed_product, TestApp};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tabacaria_api::{
    entities::inventory_transaction::{self, MovementKind},
    errors::ServiceError,
    services::{
        products::{ProductFilter, ProductPatch},
        sales::{NewSale, NewSaleItem},
        DeleteOutcome,
    },
};

#[tokio::test]
async fn initial_stock_shows_up_in_the_ledger() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Carvão Hexagonal", dec!(14), dec!(8), 25).await;

    let rows = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::ProductId.eq(product.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, MovementKind::Entrada);
    assert_eq!(rows[0].quantity, 25);
    assert_eq!(rows[0].previous_stock, 0);
    assert_eq!(rows[0].new_stock, 25);
}

#[tokio::test]
async fn manual_stock_movements_update_the_product() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Essência Ice", dec!(18), dec!(8), 10).await;

    let updated = app
        .state
        .products
        .update_stock(product.id, MovementKind::Entrada, 5, None, app.admin.id)
        .await
        .unwrap();
    assert_eq!(updated.stock, 15);

    let updated = app
        .state
        .products
        .update_stock(product.id, MovementKind::Saida, 12, None, app.admin.id)
        .await
        .unwrap();
    assert_eq!(updated.stock, 3);

    // Ajuste sets the absolute level.
    let updated = app
        .state
        .products
        .update_stock(product.id, MovementKind::Ajuste, 7, None, app.admin.id)
        .await
        .unwrap();
    assert_eq!(updated.stock, 7);

    let err = app
        .state
        .products
        .update_stock(product.id, MovementKind::Saida, 100, None, app.admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let err = app
        .state
        .products
        .update_stock(product.id, MovementKind::Venda, 1, None, app.admin.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn deleting_a_sold_product_deactivates_it_instead() {
    let app = TestApp::new().await;
    let sold = seed_product(&app, "Pod Elfbar", dec!(45), dec!(25), 10).await;
    let unsold = seed_product(&app, "Piteira de Vidro", dec!(10), dec!(4), 10).await;

    app.state
        .sales
        .create_sale(
            NewSale {
                client_id: None,
                items: vec![NewSaleItem {
                    product_id: sold.id,
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

    let outcome = app.state.products.delete_product(sold.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deactivated);
    let stored = app.state.products.get_product(sold.id).await.unwrap();
    assert!(!stored.is_active);

    // No sale history: hard delete, ledger included.
    let outcome = app.state.products.delete_product(unsold.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Removed);
    assert_matches!(
        app.state.products.get_product(unsold.id).await.unwrap_err(),
        ServiceError::NotFound(_)
    );
    let leftover = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::ProductId.eq(unsold.id))
        .all(&*app.state.db)
        .await
        .unwrap();
    assert!(leftover.is_empty());
}

#[tokio::test]
async fn duplicate_barcodes_are_rejected() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Tabaco Adalya", dec!(30), dec!(15), 10).await;

    app.state
        .products
        .update_product(
            product.id,
            ProductPatch {
                barcode: Some("7890001".to_string()),
                ..Default::default()
            },
            app.admin.id,
        )
        .await
        .unwrap();

    let other = seed_product(&app, "Tabaco Al Fakher", dec!(28), dec!(14), 10).await;
    let err = app
        .state
        .products
        .update_product(
            other.id,
            ProductPatch {
                barcode: Some("7890001".to_string()),
                ..Default::default()
            },
            app.admin.id,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn image_reorder_applies_the_permutation() {
    let app = TestApp::new().await;
    let product = seed_product(&app, "Narguilé Amazon", dec!(180), dec!(110), 3).await;

    for url in ["a.jpg", "b.jpg", "c.jpg"] {
        app.state
            .products
            .add_image(product.id, url.to_string(), None)
            .await
            .unwrap();
    }

    let updated = app
        .state
        .products
        .reorder_images(product.id, vec![2, 0, 1])
        .await
        .unwrap();
    assert_eq!(updated.image_list(), vec!["c.jpg", "a.jpg", "b.jpg"]);

    // Incomplete or repeated permutations are rejected.
    let err = app
        .state
        .products
        .reorder_images(product.id, vec![0, 0, 1])
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let updated = app.state.products.remove_image(product.id, 0).await.unwrap();
    assert_eq!(updated.image_list(), vec!["a.jpg", "b.jpg"]);
}

#[tokio::test]
async fn low_stock_filter_uses_the_product_minimum() {
    let app = TestApp::new().await;
    // min_stock is 2 in the seed helper.
    seed_product(&app, "Quase Esgotado", dec!(10), dec!(5), 1).await;
    seed_product(&app, "Abastecido", dec!(10), dec!(5), 50).await;

    let page = app
        .state
        .products
        .list_products(ProductFilter {
            low_stock: true,
            page: 1,
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Quase Esgotado");

    let low = app.state.products.low_stock_products().await.unwrap();
    assert_eq!(low.len(), 1);
}

#[tokio::test]
async fn inventory_analysis_flags_critical_stock_via_the_global_threshold() {
    let app = TestApp::new().await;
    // Default critical threshold is 2; seed_product uses min_stock 2.
    seed_product(&app, "Quase Esgotado", dec!(10), dec!(5), 1).await;
    seed_product(&app, "No Limite", dec!(10), dec!(5), 2).await;
    seed_product(&app, "Abastecido", dec!(10), dec!(5), 50).await;
    seed_product(&app, "Esgotado", dec!(10), dec!(5), 0).await;

    let analysis = app.state.reports.inventory_analysis().await.unwrap();

    assert_eq!(analysis.out_of_stock, 1);
    let critical: Vec<&str> = analysis
        .critical_stock
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(critical, ["Quase Esgotado", "No Limite"]);
}
