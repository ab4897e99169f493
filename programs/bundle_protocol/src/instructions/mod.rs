pub mod admin;
pub mod bundle;
pub mod escrow;
pub mod fulfill;
pub mod lifecycle;
pub mod open;

pub use admin::*;
pub use bundle::*;
pub use escrow::*;
pub use fulfill::*;
pub use lifecycle::*;
pub use open::*;
