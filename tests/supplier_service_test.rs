mod common;

use common::TestApp;
use tabacaria_api::entities::product::ProductCategory;
use tabacaria_api::entities::supplier;
use tabacaria_api::services::suppliers::{NewSupplier, SupplierFilter, SupplierPatch};

async fn seed_supplier(
    app: &TestApp,
    name: &str,
    categories: Vec<ProductCategory>,
) -> supplier::Model {
    app.state
        .suppliers
        .create_supplier(NewSupplier {
            name: name.to_string(),
            company_name: None,
            document: None,
            email: None,
            phone: None,
            address: None,
            contact_person: None,
            categories,
            payment_terms: None,
            min_order_value: None,
            observations: None,
        })
        .await
        .expect("failed to seed supplier")
}

#[tokio::test]
async fn category_filter_paginates_over_the_matching_set() {
    let app = TestApp::new().await;
    seed_supplier(&app, "Alfa Tabacos", vec![ProductCategory::Tabaco]).await;
    seed_supplier(&app, "Beta Bebidas", vec![ProductCategory::Bebidas]).await;
    seed_supplier(&app, "Celta Fumados", vec![ProductCategory::Tabaco]).await;

    // Both Tabaco suppliers fit on one page even though a non-matching
    // supplier sits between them alphabetically.
    let page = app
        .state
        .suppliers
        .list_suppliers(SupplierFilter {
            category: Some(ProductCategory::Tabaco),
            page: 1,
            limit: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let names: Vec<&str> = page.items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Alfa Tabacos", "Celta Fumados"]);

    // Pagination walks the matching set, not the raw table.
    let page = app
        .state
        .suppliers
        .list_suppliers(SupplierFilter {
            category: Some(ProductCategory::Tabaco),
            page: 2,
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Celta Fumados");
}

#[tokio::test]
async fn category_filter_respects_the_other_conditions() {
    let app = TestApp::new().await;
    seed_supplier(&app, "Alfa Tabacos", vec![ProductCategory::Tabaco]).await;
    let celta = seed_supplier(&app, "Celta Fumados", vec![ProductCategory::Tabaco]).await;

    app.state
        .suppliers
        .update_supplier(
            celta.id,
            SupplierPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let page = app
        .state
        .suppliers
        .list_suppliers(SupplierFilter {
            category: Some(ProductCategory::Tabaco),
            is_active: Some(true),
            page: 1,
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Alfa Tabacos");
}
