//! Wire-name conversions for the small enums that cross the plugin boundary.
//!
//! Source kinds, task statuses and priorities all serialize as fixed
//! lowercase names. [`impl_wire_name_conversions!`] derives `Display` from
//! that table and a `FromStr` that trims and ignores case.
//!
//! ```rust
//! use workdash_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ShiftState {
//!     Draft,
//!     Published,
//! }
//!
//! impl_wire_name_conversions!(ShiftState {
//!     Draft => "draft",
//!     Published => "published",
//! });
//!
//! assert_eq!("PUBLISHED".parse::<ShiftState>(), Ok(ShiftState::Published));
//! assert_eq!(ShiftState::Draft.to_string(), "draft");
//! ```

/// `Display` and `FromStr` from a `Variant => "name"` table.
///
/// Names must be lowercase; parsing lowercases its input before matching.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($ty:ident { $($variant:ident => $name:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                let name = match self {
                    $(Self::$variant => $name,)+
                };
                f.write_str(name)
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = String;

            fn from_str(raw: &str) -> ::std::result::Result<Self, Self::Err> {
                let wanted = raw.trim().to_ascii_lowercase();
                $(
                    if wanted == $name {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("unknown {} '{}'", stringify!($ty), raw))
            }
        }
    };
}
