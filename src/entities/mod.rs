pub mod prelude;

pub mod categories;
pub mod order_items;
pub mod orders;
pub mod product_images;
pub mod products;
pub mod refresh_tokens;
pub mod users;
