//! Shops, their staff, and the applications that open them.
//!
//! [`ShopRegistry`] is also the production [`stockbook_auth::AccessGate`]:
//! ownership and staff positions live here, so this is where capability
//! questions get answered.

pub mod application;
pub mod registry;
pub mod shop;

pub use application::{ApplicationStatus, NewApplication, ShopApplication};
pub use registry::{RegistryError, ShopRegistry};
pub use shop::{Shop, ShopChanges, StaffMember};
