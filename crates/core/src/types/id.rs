//! Typed row ids.
//!
//! Every entity gets its own i32 newtype so an order id can never be
//! passed where a vehicle id belongs. The wrappers are transparent to
//! serde and to Postgres (`INT4`).

/// Define an i32 id newtype with the given doc string.
///
/// The generated type is `Copy`, ordered, hashable, serde-transparent,
/// and (behind the `postgres` feature) a transparent sqlx type. `new` /
/// `as_i32` and the `From` conversions cover the handful of places that
/// need the raw value.
///
/// ```rust
/// # use prestige_core::define_id;
/// define_id!(UserId, "Example id.");
/// define_id!(OrderId, "Example id.");
///
/// let user_id = UserId::new(1);
///
/// // A different entity's id is a different type, so this won't compile:
/// // let _: UserId = OrderId::new(1);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId, "Row id of a customer or admin account.");
define_id!(VehicleId, "Row id of a vehicle in the catalog.");
define_id!(OrderId, "Row id of a confirmed order.");
define_id!(OrderItemId, "Row id of a single line item on an order.");
define_id!(DiscountId, "Row id of a discount code.");
define_id!(AppointmentId, "Row id of a showroom appointment.");
define_id!(CustomizationId, "Row id of a customization option.");
define_id!(ContactMessageId, "Row id of a contact form submission.");
define_id!(
    PendingRegistrationId,
    "Row id of a registration awaiting its verification PIN."
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    define_id!(TestId, "Scratch id for the tests below.");

    #[test]
    fn test_round_trips_through_i32() {
        let id: TestId = 7.into();
        assert_eq!(id.as_i32(), 7);
        assert_eq!(i32::from(id), 7);
    }

    #[test]
    fn test_orders_by_inner_value() {
        assert!(TestId::new(3) < TestId::new(11));
    }

    #[test]
    fn test_displays_as_bare_number() {
        assert_eq!(TestId::new(99).to_string(), "99");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = TestId::new(5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");
        assert_eq!(serde_json::from_str::<TestId>("5").unwrap(), id);
    }
}
