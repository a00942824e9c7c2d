mod get;
mod post;
mod update;
mod delete;

pub use get::*;
pub use post::*;
pub use update::*;
pub use delete::*;

use validator::ValidationError;

pub const PRODUCT_NAME_MAX_CHARS: usize = 200;

// Names are stored trimmed, so the limits apply to the trimmed text
pub fn valid_product_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if (1..=PRODUCT_NAME_MAX_CHARS).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::new("product_name_length"))
    }
}
