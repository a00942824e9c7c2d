mod user;
mod catalog;
mod cart;
mod coupon;
mod location;
mod address;
mod orders;
mod payment;
mod review;
mod popular;

pub use user::*;
pub use catalog::*;
pub use cart::*;
pub use coupon::*;
pub use location::*;
pub use address::*;
pub use orders::*;
pub use payment::*;
pub use review::*;
pub use popular::*;
