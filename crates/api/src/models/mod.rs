//! Domain models for the loyalty API.
//!
//! These are validated domain objects, separate from database row types.

pub mod identity;
pub mod registration;
pub mod session;

pub use identity::{
    Cashier, Coordinates, Customer, CustomerUpdate, Executive, Identity, Manager, NearbyStore,
    NewIdentity, NewKind, NewUser, StoredCredentials, UserProfile,
};
pub use registration::{CustomerChanges, CustomerSignup, StaffSignup};
pub use session::keys;
