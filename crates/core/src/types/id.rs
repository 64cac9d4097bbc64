//! Typed row identifiers.
//!
//! Users, stores, and ratings all use `SERIAL` primary keys. The rating
//! ledger takes a user and a store side by side, so each key gets its own
//! type and the compiler catches swapped arguments.

/// Declare an `i32`-backed identifier type.
///
/// The generated type is `Copy`, ordered, hashable, serializes as a bare
/// integer, converts to and from `i32`, and (with the `postgres` feature)
/// binds and decodes as an `INTEGER` column.
///
/// ```rust
/// # use store_rating_core::define_id;
/// define_id!(ReviewerId);
/// define_id!(ShopId);
///
/// let reviewer = ReviewerId::new(1);
/// let shop = ShopId::new(1);
/// assert_eq!(reviewer.as_i32(), shop.as_i32());
/// // let _: ReviewerId = shop; // mismatched types
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Wrap a raw key.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// The raw key.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
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

define_id!(UserId);
define_id!(StoreId);
define_id!(RatingId);
