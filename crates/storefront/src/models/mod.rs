//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and the view structs built by route handlers.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod wishlist;

pub use account::{NewAddress, Profile, SavedAddress, User};
pub use cart::{Cart, CartLine, LineColor, LineOptions, LocalCart, LocalCartItem};
pub use catalog::{
    Category, ColorSwatch, ColorVariant, Product, ProductColor, ProductDetail, ProductDraft,
    ProductSize, ProductSummary, SizeStock,
};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderWithItems};
pub use session::{CurrentUser, keys as session_keys};
pub use wishlist::{LocalWishlist, LocalWishlistEntry, Wishlist, WishlistLine};
