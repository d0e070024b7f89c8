use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::MeResponse,
        cart::{AddToCartRequest, CartLine, CartView, UpdateCartRequest},
        orders::{
            AdminOrderList, CreateOrderRequest, OrderCreated, OrderList, OrderWithItems,
            TrackingInfo, UpdateOrderRequest,
        },
        products::ProductDetail,
        wishlist::{
            AddWishlistRequest, WishlistAddOutcome, WishlistCheck, WishlistCount, WishlistLine,
            WishlistView,
        },
    },
    models::{Order, OrderItem, OrderStatus, PaymentStatus, Product, Role, ShippingAddress},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, params, products, tracking, wishlist},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::me,
        products::get_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart,
        cart::clear_cart,
        cart::move_to_wishlist,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::wishlist_count,
        wishlist::check_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::move_to_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        tracking::get_tracking,
        admin::list_all_orders,
        admin::update_order
    ),
    components(
        schemas(
            Role,
            Product,
            ProductDetail,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            ShippingAddress,
            MeResponse,
            AddToCartRequest,
            UpdateCartRequest,
            CartLine,
            CartView,
            AddWishlistRequest,
            WishlistAddOutcome,
            WishlistLine,
            WishlistView,
            WishlistCheck,
            WishlistCount,
            CreateOrderRequest,
            OrderCreated,
            OrderList,
            OrderWithItems,
            AdminOrderList,
            UpdateOrderRequest,
            TrackingInfo,
            params::AdminOrderQuery,
            Meta,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<TrackingInfo>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Identity of the calling user"),
        (name = "Products", description = "Product lookup"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Tracking", description = "Public shipment tracking"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
