use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tabacaria API",
        version = "0.2.0",
        description = r#"
# Tabacaria API

Backend for a tobacco and hookah shop: product catalog with stock
ledger, point-of-sale workflow, clients with loyalty points, suppliers
and a management dashboard.

## Authentication

All endpoints except `/api/users/login` and `/health` require a JWT
bearer token:

```
Authorization: Bearer <token>
```

Destructive operations (deletes, sale cancellation, user management)
additionally require an administrator account.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 10,
max 100).
        "#
    ),
    tags(
        (name = "Products", description = "Catalog and stock"),
        (name = "Sales", description = "Point of sale"),
        (name = "Clients", description = "Client base and loyalty"),
        (name = "Suppliers", description = "Supplier registry"),
        (name = "Users", description = "Accounts and authentication"),
        (name = "Dashboard", description = "Reports and analysis")
    ),
    paths(
        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::low_stock,
        crate::handlers::products::categories,
        crate::handlers::products::price_table,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::update_stock,
        crate::handlers::products::inventory_history,
        crate::handlers::products::add_image,
        crate::handlers::products::remove_image,
        crate::handlers::products::reorder_images,

        // Sales
        crate::handlers::sales::create_sale,
        crate::handlers::sales::list_sales,
        crate::handlers::sales::sales_by_period,
        crate::handlers::sales::top_products,
        crate::handlers::sales::get_sale,
        crate::handlers::sales::update_payment,
        crate::handlers::sales::cancel_sale,

        // Clients
        crate::handlers::clients::create_client,
        crate::handlers::clients::list_clients,
        crate::handlers::clients::top_clients,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,
        crate::handlers::clients::client_sales,
        crate::handlers::clients::update_loyalty,

        // Suppliers
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::suppliers_by_category,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
        crate::handlers::suppliers::supplier_products,

        // Users
        crate::handlers::users::login,
        crate::handlers::users::register,
        crate::handlers::users::get_profile,
        crate::handlers::users::update_profile,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        // Dashboard
        crate::handlers::dashboard::stats,
        crate::handlers::dashboard::sales_analysis,
        crate::handlers::dashboard::inventory_analysis,
        crate::handlers::dashboard::client_analysis
    ),
    components(schemas(
        crate::handlers::products::CreateProductRequest,
        crate::handlers::products::UpdateProductRequest,
        crate::handlers::products::StockUpdateRequest,
        crate::handlers::products::AddImageRequest,
        crate::handlers::products::ReorderImagesRequest,
        crate::handlers::sales::CreateSaleRequest,
        crate::handlers::sales::SaleItemRequest,
        crate::handlers::sales::UpdatePaymentRequest,
        crate::handlers::clients::CreateClientRequest,
        crate::handlers::clients::UpdateClientRequest,
        crate::handlers::clients::LoyaltyRequest,
        crate::handlers::suppliers::CreateSupplierRequest,
        crate::handlers::suppliers::UpdateSupplierRequest,
        crate::handlers::users::LoginRequest,
        crate::handlers::users::RegisterRequest,
        crate::handlers::users::UpdateUserRequest,
        crate::entities::product::ProductCategory,
        crate::entities::sale::PaymentMethod,
        crate::entities::sale::PaymentStatus,
        crate::entities::inventory_transaction::MovementKind,
        crate::errors::ErrorResponse
    )),
    modifiers(&BearerSecurity)
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "Bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
