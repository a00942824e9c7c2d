mod health_check;
mod confirm;
mod authentication;
mod profile;
mod category;
mod product;
mod cart;
mod coupon;
mod order;
mod payment;
mod review;
mod address;
mod location;

pub use health_check::*;
pub use confirm::*;
pub use authentication::*;
pub use profile::*;
pub use category::*;
pub use product::*;
pub use cart::*;
pub use coupon::*;
pub use order::*;
pub use payment::*;
pub use review::*;
pub use address::*;
pub use location::*;
