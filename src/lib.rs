#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod jump;

pub mod table;

#[cfg(feature = "std")]
pub mod sync;

pub use jump::jump_bucket;
#[cfg(feature = "std")]
pub use sync::SyncDoubleJump;
pub use table::DoubleJump;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The default hasher builder used for the table's member index maps.
        ///
        /// This hashes *members* on `add`/`remove`, never routing keys;
        /// lookups hash the caller's `u64` key with [`jump_bucket`] alone.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The default hasher builder used for the table's member index maps.
        ///
        /// This hashes *members* on `add`/`remove`, never routing keys;
        /// lookups hash the caller's `u64` key with [`jump_bucket`] alone.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Placeholder hasher builder used when neither the `foldhash` nor
        /// the `std` feature is enabled.
        ///
        /// This type is uninhabited; construct tables with
        /// [`DoubleJump::with_hasher`] and a hasher builder of your choice.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
