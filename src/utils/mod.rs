pub mod jwt;
pub mod logging;
pub mod pagination;
pub mod password;
pub mod templates;
