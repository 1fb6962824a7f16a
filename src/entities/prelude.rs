pub use super::categories::Entity as Categories;
pub use super::order_items::Entity as OrderItems;
pub use super::orders::Entity as Orders;
pub use super::product_images::Entity as ProductImages;
pub use super::products::Entity as Products;
pub use super::refresh_tokens::Entity as RefreshTokens;
pub use super::users::Entity as Users;
