//! Entity types shared by the stores and their consumers.
//!
//! Field names serialize in camelCase so persisted collections keep the same JSON shape
//! the web front end writes to browser storage.

pub mod cart;
pub mod crop;
pub mod farm;
pub mod order;
pub mod product;
pub mod sensor;
pub mod user;

pub use cart::{Cart, CartEntry};
pub use crop::{Crop, CropInput, CropPatch, CropStatus, InputType, NewCrop, NewCropInput};
pub use farm::{Coordinates, Farm, FarmPatch, NewFarm};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};
pub use product::{NewProduct, Product, ProductPatch, ProductStatus};
pub use sensor::{IoTSensor, SensorStatus, SensorType};
pub use user::{NewUser, Role, User, UserPatch};

use std::fmt;

use crate::{Error, Result};

/// A status field with a fixed set of allowed moves.
///
/// Re-applying the current status is always accepted and changes nothing.
pub trait Lifecycle: Copy + PartialEq + fmt::Display {
    /// Entity name used in [`Error::InvalidTransition`].
    const ENTITY: &'static str;

    /// Returns `true` if `next` is reachable from `self` in one move.
    fn allows(self, next: Self) -> bool;

    /// Validates the move and returns the new status.
    fn transition(self, next: Self) -> Result<Self> {
        if self == next || self.allows(next) {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}
