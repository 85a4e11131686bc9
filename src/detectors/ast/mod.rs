pub mod ast;
pub mod pretty;
pub mod structure;
pub mod tokens;

pub use structure::extract_structure;
pub use tokens::extract_token_profile;
